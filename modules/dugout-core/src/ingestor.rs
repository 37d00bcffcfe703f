//! News ingestion: pull an external RSS feed, persist unseen items as
//! news-bot posts, and drop in at most one "on this day" history post per
//! calendar day.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use dugout_common::types::{NewPost, NewsItem, PostType, SourceType};

use crate::traits::{FeedSource, ForumStore};

/// At most this many feed items are considered per run.
pub const MAX_FEED_ITEMS: usize = 10;

/// Fixed initial scores: news posts start visible, history posts slightly
/// lower. Policy knobs.
pub const NEWS_INITIAL_SCORE: f64 = 100.0;
pub const HISTORY_INITIAL_SCORE: f64 = 80.0;

/// Nicknames of the seeded system-bot personas that author ingested content.
pub const NEWS_BOT_NICKNAME: &str = "Newswire Bot";
pub const HISTORY_BOT_NICKNAME: &str = "Almanac Bot";

const SUMMARY_MAX_CHARS: usize = 200;

#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub news_created: u32,
    pub history_created: u32,
}

/// One ingestion sweep: fetch the feed, save unseen items, then the history
/// check. Per-item failures are logged and skipped.
pub async fn run_ingestor(
    store: &dyn ForumStore,
    feed: &dyn FeedSource,
    now: DateTime<Utc>,
) -> anyhow::Result<IngestReport> {
    let mut report = IngestReport::default();

    let items = match feed.fetch().await {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "News feed fetch failed");
            Vec::new()
        }
    };

    for item in items.iter().take(MAX_FEED_ITEMS) {
        match save_news_item(store, item).await {
            Ok(Some(_)) => report.news_created += 1,
            Ok(None) => {}
            Err(e) => warn!(url = %item.url, error = %e, "Failed to save news item"),
        }
    }

    for event in history_events_for(now) {
        match save_history_event(store, event, now).await {
            Ok(Some(_)) => report.history_created += 1,
            Ok(None) => {}
            Err(e) => warn!(title = event.title, error = %e, "Failed to save history event"),
        }
    }

    info!(
        news = report.news_created,
        history = report.history_created,
        "Ingestion run complete"
    );
    Ok(report)
}

/// Persist one news item unless its exact source URL was seen before.
async fn save_news_item(store: &dyn ForumStore, item: &NewsItem) -> anyhow::Result<Option<Uuid>> {
    if store.source_url_exists(&item.url).await? {
        return Ok(None);
    }

    let bot = match store.persona_by_nickname(NEWS_BOT_NICKNAME).await? {
        Some(p) => p,
        None => {
            warn!("News bot persona is not seeded");
            return Ok(None);
        }
    };

    let post = store
        .create_post(NewPost {
            title: item.title.clone(),
            body: item.summary.clone(),
            post_type: PostType::Normal,
            category_slug: "news".to_string(),
            source_type: SourceType::News,
            source_url: Some(item.url.clone()),
            source_title: Some(item.title.clone()),
            source_provider: Some(item.source.clone()),
            summary_json: None,
            persona_id: Some(bot.id),
            guest_id: None,
            trending_score: NEWS_INITIAL_SCORE,
        })
        .await?;

    Ok(Some(post.id))
}

/// Persist a history event unless the bot already posted one today.
async fn save_history_event(
    store: &dyn ForumStore,
    event: &HistoryEvent,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<Uuid>> {
    let bot = match store.persona_by_nickname(HISTORY_BOT_NICKNAME).await? {
        Some(p) => p,
        None => {
            warn!("History bot persona is not seeded");
            return Ok(None);
        }
    };

    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    if store.history_post_exists_since(bot.id, midnight).await? {
        return Ok(None);
    }

    let post = store
        .create_post(NewPost {
            title: format!("📅 This day in baseball: {}", event.title),
            body: event.description.to_string(),
            post_type: PostType::Normal,
            category_slug: "news".to_string(),
            source_type: SourceType::History,
            source_url: None,
            source_title: None,
            source_provider: None,
            summary_json: None,
            persona_id: Some(bot.id),
            guest_id: None,
            trending_score: HISTORY_INITIAL_SCORE,
        })
        .await?;

    Ok(Some(post.id))
}

// ---------------------------------------------------------------------------
// History events
// ---------------------------------------------------------------------------

pub struct HistoryEvent {
    /// `MM-DD` key.
    pub date: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Date-keyed sample of notable baseball anniversaries.
const HISTORY_EVENTS: [HistoryEvent; 3] = [
    HistoryEvent {
        date: "04-15",
        title: "Jackie Robinson breaks the color barrier (1947)",
        description: "Jackie Robinson debuted for the Brooklyn Dodgers, ending six decades of segregation in the majors.",
    },
    HistoryEvent {
        date: "10-01",
        title: "Maris hits number 61 (1961)",
        description: "Roger Maris hit his 61st home run on the season's final day, passing Babe Ruth's single-season record.",
    },
    HistoryEvent {
        date: "11-13",
        title: "First KBO champions crowned (1982)",
        description: "The OB Bears won the inaugural Korean Series, taking the first KBO championship.",
    },
];

fn history_events_for(now: DateTime<Utc>) -> Vec<&'static HistoryEvent> {
    let key = format!("{:02}-{:02}", now.month(), now.day());
    HISTORY_EVENTS.iter().filter(|e| e.date == key).collect()
}

// ---------------------------------------------------------------------------
// RSS feed source
// ---------------------------------------------------------------------------

/// Production feed source: fetch over HTTP, parse with feed-rs.
pub struct RssFeedSource {
    http: reqwest::Client,
    url: String,
}

impl RssFeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        let bytes = self.http.get(&self.url).send().await?.bytes().await?;
        parse_feed(&bytes)
    }
}

/// Parse an RSS/Atom document into news items. Entries without a title or
/// link are skipped.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<NewsItem>> {
    let feed = feed_rs::parser::parse(bytes)?;
    let tag_re = Regex::new(r"<[^>]*>").expect("valid regex");

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.map(|t| strip_tags(&tag_re, &t.content))?;
            let url = entry.links.first().map(|l| l.href.clone())?;
            let summary = entry
                .summary
                .map(|s| {
                    let clean = strip_tags(&tag_re, &s.content);
                    genai_client::util::truncate_chars(&clean, SUMMARY_MAX_CHARS).to_string()
                })
                .unwrap_or_default();
            let source = entry
                .source
                .unwrap_or_else(|| "newswire".to_string());
            Some(NewsItem {
                title,
                url,
                summary,
                source,
            })
        })
        .collect();

    Ok(items)
}

fn strip_tags(tag_re: &Regex, s: &str) -> String {
    tag_re.replace_all(s, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, StaticFeed};
    use chrono::TimeZone;
    use dugout_common::types::PersonaRole;

    fn item(n: usize) -> NewsItem {
        NewsItem {
            title: format!("headline {n}"),
            url: format!("https://example.com/{n}"),
            summary: format!("summary {n}"),
            source: "wire".to_string(),
        }
    }

    async fn store_with_bots() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .add_persona(NEWS_BOT_NICKNAME, PersonaRole::System, "neutral newswire")
            .await;
        store
            .add_persona(HISTORY_BOT_NICKNAME, PersonaRole::System, "anniversaries")
            .await;
        store
    }

    #[tokio::test]
    async fn ingests_new_items_and_skips_seen_urls() {
        let store = store_with_bots().await;
        let feed = StaticFeed::new(vec![item(1), item(2)]);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();

        let report = run_ingestor(&store, &feed, now).await.unwrap();
        assert_eq!(report.news_created, 2);

        // Second run: both URLs are known.
        let report = run_ingestor(&store, &feed, now).await.unwrap();
        assert_eq!(report.news_created, 0);
    }

    #[tokio::test]
    async fn feed_items_capped_at_ten() {
        let store = store_with_bots().await;
        let feed = StaticFeed::new((0..15).map(item).collect());
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();

        let report = run_ingestor(&store, &feed, now).await.unwrap();
        assert_eq!(report.news_created, 10);
    }

    #[tokio::test]
    async fn news_posts_start_at_the_fixed_score() {
        let store = store_with_bots().await;
        let feed = StaticFeed::new(vec![item(1)]);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();

        run_ingestor(&store, &feed, now).await.unwrap();
        let posts = store.recent_news_posts(now - chrono::Duration::hours(1), 10).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].trending_score, 100.0);
        assert_eq!(posts[0].source_url.as_deref(), Some("https://example.com/1"));
    }

    #[tokio::test]
    async fn history_post_at_most_once_per_day() {
        let store = store_with_bots().await;
        let feed = StaticFeed::new(Vec::new());
        // Jackie Robinson Day.
        let now = Utc.with_ymd_and_hms(2026, 4, 15, 9, 0, 0).unwrap();

        let report = run_ingestor(&store, &feed, now).await.unwrap();
        assert_eq!(report.history_created, 1);

        let later = Utc.with_ymd_and_hms(2026, 4, 15, 21, 0, 0).unwrap();
        let report = run_ingestor(&store, &feed, later).await.unwrap();
        assert_eq!(report.history_created, 0);
    }

    #[tokio::test]
    async fn missing_bot_persona_is_a_soft_noop() {
        let store = MemoryStore::new();
        let feed = StaticFeed::new(vec![item(1)]);
        let now = Utc.with_ymd_and_hms(2026, 4, 15, 9, 0, 0).unwrap();

        let report = run_ingestor(&store, &feed, now).await.unwrap();
        assert_eq!(report.news_created, 0);
        assert_eq!(report.history_created, 0);
    }

    #[tokio::test]
    async fn failed_fetch_still_runs_history() {
        let store = store_with_bots().await;
        let feed = StaticFeed::failing();
        let now = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();

        let report = run_ingestor(&store, &feed, now).await.unwrap();
        assert_eq!(report.news_created, 0);
        assert_eq!(report.history_created, 1);
    }

    #[test]
    fn parses_rss_and_strips_markup() {
        let xml = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
              <title>Wire</title>
              <item>
                <title><![CDATA[Ace <b>traded</b> at deadline]]></title>
                <link>https://example.com/a</link>
                <description><![CDATA[<p>A blockbuster deal</p>]]></description>
              </item>
              <item>
                <title>No link here</title>
              </item>
            </channel></rss>"#;

        let items = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Ace traded at deadline");
        assert_eq!(items[0].url, "https://example.com/a");
        assert_eq!(items[0].summary, "A blockbuster deal");
    }

    #[test]
    fn history_table_is_date_keyed() {
        let on = Utc.with_ymd_and_hms(2026, 4, 15, 0, 0, 0).unwrap();
        assert_eq!(history_events_for(on).len(), 1);
        let off = Utc.with_ymd_and_hms(2026, 4, 16, 0, 0, 0).unwrap();
        assert!(history_events_for(off).is_empty());
    }
}
