//! Human-submitted content entry points.
//!
//! These are the synchronous paths: validation failures and missing targets
//! surface to the caller immediately, storage errors propagate, and only the
//! follow-on synthetic interactions are fire-and-forget.

use chrono::Utc;
use tracing::info;

use dugout_common::types::{Comment, Guest, NewComment, NewPost, Post, PostType, SourceType};
use dugout_common::{hash_session_key, DugoutError};
use uuid::Uuid;

use crate::interaction::InteractionScheduler;
use crate::ranking::{apply_human_boost, trending_score, update_post_trending_score};
use crate::traits::ForumStore;

#[derive(Debug, Clone)]
pub struct NewHumanPost {
    pub title: String,
    pub body: String,
    pub category_slug: String,
    pub nickname: Option<String>,
    /// Raw session key (IP + user agent or client token), hashed into the
    /// guest identity.
    pub session_key: String,
}

#[derive(Debug, Clone)]
pub struct NewHumanComment {
    pub post_id: Uuid,
    pub body: String,
    pub nickname: Option<String>,
    pub session_key: String,
    pub parent_id: Option<Uuid>,
}

/// Create a guest-authored post. The initial score carries the human boost
/// so the post surfaces near the top of trending immediately; the scheduler
/// then front-loads synthetic attention onto it.
pub async fn submit_post(
    store: &dyn ForumStore,
    scheduler: &InteractionScheduler,
    req: NewHumanPost,
) -> Result<Post, DugoutError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(DugoutError::Validation("title is required".to_string()));
    }
    if req.category_slug.trim().is_empty() {
        return Err(DugoutError::Validation("category is required".to_string()));
    }

    let guest = find_or_create_guest(store, &req.session_key, req.nickname.as_deref()).await?;

    let now = Utc::now();
    let post = store
        .create_post(NewPost {
            title: title.to_string(),
            body: req.body,
            post_type: PostType::Normal,
            category_slug: req.category_slug,
            source_type: SourceType::None,
            source_url: None,
            source_title: None,
            source_provider: None,
            summary_json: None,
            persona_id: None,
            guest_id: Some(guest.id),
            trending_score: apply_human_boost(trending_score(0, 0, 0, now, now), true),
        })
        .await
        .map_err(DugoutError::from)?;

    scheduler.on_post_created(post.id);

    info!(post_id = %post.id, guest = %guest.nickname, "Human post created");
    Ok(post)
}

/// Create a guest-authored comment, bump the counter, rescore, then kick the
/// fire-and-forget rebuttal attempt.
pub async fn submit_comment(
    store: &dyn ForumStore,
    scheduler: &InteractionScheduler,
    req: NewHumanComment,
) -> Result<Comment, DugoutError> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(DugoutError::Validation("comment body is required".to_string()));
    }

    if store.post(req.post_id).await?.is_none() {
        return Err(DugoutError::NotFound("post".to_string()));
    }

    let guest = find_or_create_guest(store, &req.session_key, req.nickname.as_deref()).await?;

    let comment = store
        .create_comment(NewComment {
            parent_id: req.parent_id,
            ..NewComment::from_guest(req.post_id, guest.id, body)
        })
        .await?;
    store.increment_comment_count(req.post_id).await?;
    update_post_trending_score(store, req.post_id, Utc::now()).await?;

    scheduler.spawn_rebuttal(req.post_id);

    info!(post_id = %req.post_id, guest = %guest.nickname, "Human comment created");
    Ok(comment)
}

/// Re-identify a guest by session hash, or mint a new one. Distinct sessions
/// stay distinct guests; there is no merging.
pub async fn find_or_create_guest(
    store: &dyn ForumStore,
    session_key: &str,
    nickname: Option<&str>,
) -> Result<Guest, DugoutError> {
    let identity_hash = hash_session_key(session_key);
    if let Some(guest) = store.guest_by_identity(&identity_hash).await? {
        return Ok(guest);
    }

    let nickname = match nickname {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => format!("guest-{}", &identity_hash[..6]),
    };
    Ok(store.create_guest(&identity_hash, &nickname).await?)
}
