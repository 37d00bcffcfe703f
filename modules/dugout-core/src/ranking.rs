use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::traits::ForumStore;

/// A comment carries more signal than a like; a like more than a view.
const VIEW_WEIGHT: f64 = 1.0;
const LIKE_WEIGHT: f64 = 3.0;
const COMMENT_WEIGHT: f64 = 5.0;

/// The +2 offset keeps brand-new posts from dividing by ~zero; the 1.8
/// exponent makes decay super-linear so hour-old content reliably loses rank
/// to fresh content with comparable engagement. These two constants are the
/// feed's entire anti-staleness mechanism — change them and the ranking
/// changes character.
const DECAY_OFFSET_HOURS: f64 = 2.0;
const DECAY_EXPONENT: f64 = 1.8;

/// Flat bonus large enough to put guest-authored posts above essentially any
/// organic synthetic-content score. Deliberate hospitality, not a bug.
pub const HUMAN_BOOST: f64 = 500.0;

/// Posts older than this are left with whatever score they last had.
pub const RESCORE_WINDOW_HOURS: i64 = 24;

/// Recency-weighted engagement score.
///
/// `(views + likes*3 + comments*5) / (age_hours + 2)^1.8`
///
/// A post created in the future clamps to age zero.
pub fn trending_score(
    view_count: u64,
    like_count: u64,
    comment_count: u64,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let age_hours = (now - created_at).num_milliseconds().max(0) as f64 / 3_600_000.0;

    let engagement = view_count as f64 * VIEW_WEIGHT
        + like_count as f64 * LIKE_WEIGHT
        + comment_count as f64 * COMMENT_WEIGHT;
    let decay = (age_hours + DECAY_OFFSET_HOURS).powf(DECAY_EXPONENT);

    engagement / decay
}

pub fn apply_human_boost(score: f64, is_human: bool) -> f64 {
    if is_human {
        score + HUMAN_BOOST
    } else {
        score
    }
}

/// Recompute and persist one post's trending score. Returns the new score,
/// or 0.0 if the post no longer exists.
pub async fn update_post_trending_score(
    store: &dyn ForumStore,
    post_id: Uuid,
    now: DateTime<Utc>,
) -> anyhow::Result<f64> {
    let post = match store.post(post_id).await? {
        Some(p) => p,
        None => return Ok(0.0),
    };

    let mut score = trending_score(
        post.view_count,
        post.like_count,
        post.comment_count,
        post.created_at,
        now,
    );
    score = apply_human_boost(score, post.is_human());

    store.set_trending_score(post_id, score).await?;
    Ok(score)
}

/// Batch rescore of every post created in the trailing 24-hour window.
/// Older posts are allowed to go stale. Returns the number updated.
pub async fn update_all_trending_scores(
    store: &dyn ForumStore,
    now: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let since = now - Duration::hours(RESCORE_WINDOW_HOURS);
    let ids = store.post_ids_created_since(since).await?;

    let mut updated = 0u64;
    for id in ids {
        update_post_trending_score(store, id, now).await?;
        updated += 1;
    }

    info!(updated, "Trending score sweep complete");
    Ok(updated)
}
