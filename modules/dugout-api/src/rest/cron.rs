//! Cron trigger surface. Both endpoints are driven by an external scheduler
//! and guarded by the shared bearer secret.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use tracing::error;

use dugout_core::{debate, generator, ingestor, ranking};

use crate::auth::authorize_cron;
use crate::AppState;

/// POST /api/cron/collect — one ingestion sweep (news feed + history check).
pub async fn collect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize_cron(&headers, &state.cron_secret) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match ingestor::run_ingestor(state.store.as_ref(), state.feed.as_ref(), Utc::now()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!(error = %e, "Ingestion run failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /api/cron/generate — one generation sweep: news reactions, the daily
/// post when the board is quiet, the daily debate, then the trending rescore.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize_cron(&headers, &state.cron_secret) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let store = state.store.as_ref();
    let now = Utc::now();

    let report = match generator::run_generator(
        store,
        state.generator.as_ref(),
        state.dice.as_ref(),
        now,
    )
    .await
    {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Generation run failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let debate_post = match debate::run_daily_debate(
        store,
        state.generator.as_ref(),
        state.dice.as_ref(),
        now,
    )
    .await
    {
        Ok(post_id) => post_id,
        Err(e) => {
            error!(error = %e, "Daily debate run failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let rescored = match ranking::update_all_trending_scores(store, now).await {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, "Trending rescore failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Json(serde_json::json!({
        "reactions_created": report.reactions_created,
        "daily_created": report.daily_created,
        "debate_post": debate_post,
        "rescored": rescored,
    }))
    .into_response()
}
