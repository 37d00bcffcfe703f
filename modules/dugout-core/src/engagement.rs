use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::ranking::update_post_trending_score;
use crate::traits::ForumStore;

/// Repeat views from the same actor inside this window are not re-counted.
pub const VIEW_DEDUP_WINDOW_MINUTES: i64 = 60;

/// Who is looking: a known guest, a client fingerprint, or both.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewerIdentity<'a> {
    pub guest_id: Option<Uuid>,
    pub fingerprint: Option<&'a str>,
}

/// Count a view, at most once per (post, actor) per window.
///
/// A duplicate view is skipped silently — the caller cannot tell "counted"
/// from "already counted" except through the counter itself. Every counted
/// view rescores the post before returning.
pub async fn record_view(
    store: &dyn ForumStore,
    post_id: Uuid,
    viewer: ViewerIdentity<'_>,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let window_start = now - Duration::minutes(VIEW_DEDUP_WINDOW_MINUTES);

    let already = store
        .viewed_since(post_id, viewer.guest_id, viewer.fingerprint, window_start)
        .await?;
    if already {
        return Ok(());
    }

    store
        .record_view(post_id, viewer.guest_id, viewer.fingerprint, now)
        .await?;
    store.increment_view_count(post_id).await?;
    update_post_trending_score(store, post_id, now).await?;

    Ok(())
}

/// Toggle a guest's like on a post. Returns the new liked state.
///
/// Strictly idempotent-toggle: one vote row per (post, guest), enforced by a
/// unique constraint at the store level. No time window applies, unlike views.
pub async fn toggle_vote(
    store: &dyn ForumStore,
    post_id: Uuid,
    guest_id: Uuid,
    now: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let liked = match store.vote(post_id, guest_id).await? {
        Some(existing) => {
            store.delete_vote(existing.id).await?;
            store.adjust_like_count(post_id, -1).await?;
            false
        }
        None => {
            store.create_vote(post_id, guest_id).await?;
            store.adjust_like_count(post_id, 1).await?;
            true
        }
    };

    update_post_trending_score(store, post_id, now).await?;
    Ok(liked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn repeat_view_within_window_counts_once() {
        let store = MemoryStore::new();
        let post_id = store.seed_persona_post("title", "gossip").await;
        let guest = store.create_guest("hash", "g").await.unwrap();
        let viewer = ViewerIdentity {
            guest_id: Some(guest.id),
            fingerprint: None,
        };

        let t0 = Utc::now();
        record_view(&store, post_id, viewer, t0).await.unwrap();
        record_view(&store, post_id, viewer, t0 + Duration::minutes(30))
            .await
            .unwrap();

        assert_eq!(store.post(post_id).await.unwrap().unwrap().view_count, 1);

        // Outside the window the same actor counts again.
        record_view(&store, post_id, viewer, t0 + Duration::minutes(90))
            .await
            .unwrap();
        assert_eq!(store.post(post_id).await.unwrap().unwrap().view_count, 2);
    }

    #[tokio::test]
    async fn fingerprint_matches_dedup_like_guest_id() {
        let store = MemoryStore::new();
        let post_id = store.seed_persona_post("title", "gossip").await;
        let t0 = Utc::now();

        let viewer = ViewerIdentity {
            guest_id: None,
            fingerprint: Some("fp-1"),
        };
        record_view(&store, post_id, viewer, t0).await.unwrap();
        record_view(&store, post_id, viewer, t0 + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(store.post(post_id).await.unwrap().unwrap().view_count, 1);

        // A different fingerprint is a different actor.
        let other = ViewerIdentity {
            guest_id: None,
            fingerprint: Some("fp-2"),
        };
        record_view(&store, post_id, other, t0 + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(store.post(post_id).await.unwrap().unwrap().view_count, 2);
    }

    #[tokio::test]
    async fn counted_view_rescores_the_post() {
        let store = MemoryStore::new();
        let post_id = store.seed_persona_post("title", "gossip").await;
        let now = Utc::now();

        record_view(&store, post_id, ViewerIdentity::default(), now)
            .await
            .unwrap();
        let post = store.post(post_id).await.unwrap().unwrap();
        assert!(post.trending_score > 0.0);
    }

    #[tokio::test]
    async fn vote_toggle_is_an_involution() {
        let store = MemoryStore::new();
        let post_id = store.seed_persona_post("title", "gossip").await;
        let guest = store.create_guest("hash", "g").await.unwrap();
        let now = Utc::now();

        let liked = toggle_vote(&store, post_id, guest.id, now).await.unwrap();
        assert!(liked);
        assert_eq!(store.post(post_id).await.unwrap().unwrap().like_count, 1);

        let liked = toggle_vote(&store, post_id, guest.id, now).await.unwrap();
        assert!(!liked);
        assert_eq!(store.post(post_id).await.unwrap().unwrap().like_count, 0);

        // Back to liked again — no double rows, count is exactly 1.
        let liked = toggle_vote(&store, post_id, guest.id, now).await.unwrap();
        assert!(liked);
        assert_eq!(store.post(post_id).await.unwrap().unwrap().like_count, 1);
    }

    #[tokio::test]
    async fn votes_from_different_guests_accumulate() {
        let store = MemoryStore::new();
        let post_id = store.seed_persona_post("title", "gossip").await;
        let a = store.create_guest("a", "a").await.unwrap();
        let b = store.create_guest("b", "b").await.unwrap();
        let now = Utc::now();

        toggle_vote(&store, post_id, a.id, now).await.unwrap();
        toggle_vote(&store, post_id, b.id, now).await.unwrap();
        assert_eq!(store.post(post_id).await.unwrap().unwrap().like_count, 2);
    }
}
