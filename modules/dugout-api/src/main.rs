use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dugout_common::Config;
use dugout_core::{
    ContentGenerator, Dice, FeedSource, ForumStore, InteractionScheduler, PersonaGenerator,
    RssFeedSource, ThreadDice,
};
use dugout_store::{schema, seed, PgStore};
use genai_client::gemini::{Gemini, DEFAULT_MODEL};

mod auth;
mod rest;

pub struct AppState {
    pub store: Arc<dyn ForumStore>,
    pub scheduler: InteractionScheduler,
    pub generator: Arc<dyn ContentGenerator>,
    pub dice: Arc<dyn Dice>,
    pub feed: Arc<dyn FeedSource>,
    pub cron_secret: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dugout=info".parse()?))
        .init();

    let config = Config::from_env();

    let pg = PgStore::connect(&config.database_url).await?;
    schema::apply(pg.pool()).await?;
    seed::apply(pg.pool()).await?;

    let store: Arc<dyn ForumStore> = Arc::new(pg);
    let model = Gemini::new(config.google_ai_api_key.clone(), DEFAULT_MODEL);
    let generator: Arc<dyn ContentGenerator> = Arc::new(PersonaGenerator::new(Arc::new(model)));
    let dice: Arc<dyn Dice> = Arc::new(ThreadDice);
    let feed: Arc<dyn FeedSource> = Arc::new(RssFeedSource::new(config.news_feed_url.clone()));

    let scheduler = InteractionScheduler::new(store.clone(), generator.clone(), dice.clone());

    let state = Arc::new(AppState {
        store,
        scheduler,
        generator,
        dice,
        feed,
        cron_secret: config.cron_secret.clone(),
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Forum surface
        .route("/api/posts", post(rest::forum::create_post).get(rest::forum::trending_feed))
        .route("/api/posts/{id}", get(rest::forum::post_detail))
        .route("/api/posts/{id}/comments", post(rest::forum::create_comment))
        .route("/api/posts/{id}/vote", post(rest::forum::toggle_vote))
        .route("/api/posts/{id}/view", post(rest::forum::record_view))
        // Cron triggers
        .route("/api/cron/collect", post(rest::cron::collect))
        .route("/api/cron/generate", post(rest::cron::generate))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path only (no query params, no IP)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Dugout API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
