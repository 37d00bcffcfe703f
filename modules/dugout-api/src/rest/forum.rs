//! Public forum surface: posts, comments, votes, views.
//!
//! Guests are identified by a session key derived from the caller's address
//! and user agent. The key is hashed before it touches storage; raw values
//! are never persisted.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use dugout_common::hash_session_key;
use dugout_core::engagement::{self, ViewerIdentity};
use dugout_core::submit::{self, NewHumanComment, NewHumanPost};

use crate::rest::error_response;
use crate::AppState;

/// Default and maximum size of the trending feed.
const DEFAULT_FEED_LIMIT: usize = 10;
const MAX_FEED_LIMIT: usize = 50;

fn session_key(addr: &SocketAddr, headers: &HeaderMap) -> String {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    format!("{}|{}", addr.ip(), user_agent)
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub category_slug: String,
    pub nickname: Option<String>,
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CreatePostRequest>,
) -> impl IntoResponse {
    let req = NewHumanPost {
        title: body.title,
        body: body.body,
        category_slug: body.category_slug,
        nickname: body.nickname,
        session_key: session_key(&addr, &headers),
    };

    match submit::submit_post(state.store.as_ref(), &state.scheduler, req).await {
        Ok(post) => (StatusCode::CREATED, Json(post)).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

/// GET /api/posts — the trending feed.
pub async fn trending_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_FEED_LIMIT).min(MAX_FEED_LIMIT);
    match state.store.trending_posts(limit).await {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => {
            error!(error = %e, "Trending feed query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/posts/{id}
pub async fn post_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.post(id).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, post_id = %id, "Post lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    pub nickname: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// POST /api/posts/{id}/comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<CreateCommentRequest>,
) -> impl IntoResponse {
    let req = NewHumanComment {
        post_id: id,
        body: body.body,
        nickname: body.nickname,
        session_key: session_key(&addr, &headers),
        parent_id: body.parent_id,
    };

    match submit::submit_comment(state.store.as_ref(), &state.scheduler, req).await {
        Ok(comment) => (StatusCode::CREATED, Json(comment)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/posts/{id}/vote — toggle the caller's like.
pub async fn toggle_vote(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let key = session_key(&addr, &headers);
    let guest = match submit::find_or_create_guest(state.store.as_ref(), &key, None).await {
        Ok(guest) => guest,
        Err(e) => return error_response(e),
    };

    match engagement::toggle_vote(state.store.as_ref(), id, guest.id, Utc::now()).await {
        Ok(liked) => Json(serde_json::json!({ "liked": liked })).into_response(),
        Err(e) => {
            error!(error = %e, post_id = %id, "Vote toggle failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /api/posts/{id}/view — count a view, deduped per actor per hour.
pub async fn record_view(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let fingerprint = hash_session_key(&session_key(&addr, &headers));
    let viewer = ViewerIdentity {
        guest_id: None,
        fingerprint: Some(&fingerprint),
    };

    match engagement::record_view(state.store.as_ref(), id, viewer, Utc::now()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, post_id = %id, "View recording failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
