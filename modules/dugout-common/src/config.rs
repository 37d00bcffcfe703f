use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // AI provider
    pub google_ai_api_key: String,

    // Cron trigger surface
    pub cron_secret: String,

    // News ingestion
    pub news_feed_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

const DEFAULT_NEWS_FEED: &str =
    "https://news.google.com/rss/search?q=KBO+baseball&hl=en-US&gl=US&ceid=US:en";

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            google_ai_api_key: required_env("GOOGLE_AI_API_KEY"),
            cron_secret: required_env("CRON_SECRET"),
            news_feed_url: env::var("NEWS_FEED_URL")
                .unwrap_or_else(|_| DEFAULT_NEWS_FEED.to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
