//! Daily expert-debate orchestration.
//!
//! At most one DEBATE post per calendar day. The topic comes from the
//! hottest news post of the last 24 hours when there is one, otherwise from
//! a fixed fallback list. Requires exactly three expert personas; the first
//! expert is the nominal author and the fallback speaker for any script line
//! whose speaker name matches nobody.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use dugout_common::types::{NewPost, Persona, PersonaRole, PostType, SourceType};
use genai_client::util::truncate_chars;

use crate::personas::ContentGenerator;
use crate::traits::{Dice, ForumStore};

/// Debates are meant to be pinned near the top, same rationale as the human
/// boost.
pub const DEBATE_BONUS: f64 = 200.0;

const PANEL_SIZE: usize = 3;
const TOPIC_MAX_CHARS: usize = 50;

const FALLBACK_TOPICS: [&str; 8] = [
    "Who is the MVP favorite this season?",
    "Should the foreign-player quota change?",
    "Which teams make the postseason from here?",
    "Rookie of the year: who actually leads the race?",
    "Do shorter games need a rule change?",
    "Is the designated hitter killing small ball?",
    "How much blame does the manager deserve for a slump?",
    "Big-money signings: bargain or bust?",
];

/// Create today's debate post if none exists yet. Returns the new post id,
/// or `None` when today's debate already ran or creation failed softly.
pub async fn run_daily_debate(
    store: &dyn ForumStore,
    generator: &dyn ContentGenerator,
    dice: &dyn Dice,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<Uuid>> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    if store.debate_post_exists_since(midnight).await? {
        info!("Today's debate post already exists");
        return Ok(None);
    }

    let topic = debate_topic(store, dice, now).await?;
    create_debate_post(store, generator, &topic, now).await
}

/// Pick the debate topic: hottest news title from the last 24 hours with
/// bracket characters stripped, else a random fallback.
async fn debate_topic(
    store: &dyn ForumStore,
    dice: &dyn Dice,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let since = now - Duration::hours(24);
    if let Some(hot) = store.top_news_post_since(since).await? {
        return Ok(strip_brackets(&hot.title));
    }
    Ok(FALLBACK_TOPICS[dice.pick(FALLBACK_TOPICS.len())].to_string())
}

/// Remove headline bracket decorations and cap the topic length.
fn strip_brackets(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '「' | '」' | '『' | '』'))
        .collect();
    truncate_chars(cleaned.trim(), TOPIC_MAX_CHARS).to_string()
}

/// Generate the script and persist the debate post plus its ordered messages.
/// Soft-fails with `None` when fewer than three experts exist or the script
/// comes back empty.
async fn create_debate_post(
    store: &dyn ForumStore,
    generator: &dyn ContentGenerator,
    topic: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<Uuid>> {
    let experts: Vec<Persona> = store
        .personas_with_roles(&[PersonaRole::Expert])
        .await?
        .into_iter()
        .take(PANEL_SIZE)
        .collect();

    if experts.len() < PANEL_SIZE {
        warn!(found = experts.len(), "Not enough expert personas for a debate");
        return Ok(None);
    }

    let script = generator.debate_script(topic, &experts).await?;
    if script.is_empty() {
        warn!(topic, "Debate script generation failed");
        return Ok(None);
    }

    let panelists: Vec<&str> = experts.iter().map(|e| e.nickname.as_str()).collect();
    let summary = serde_json::json!({
        "topic": topic,
        "panelists": panelists,
        "message_count": script.len(),
    });

    let post = store
        .create_post(NewPost {
            title: format!("🔥 [Panel] {topic}"),
            body: format!("Three experts go head to head on \"{topic}\"."),
            post_type: PostType::Debate,
            category_slug: "debate".to_string(),
            source_type: SourceType::None,
            source_url: None,
            source_title: None,
            source_provider: None,
            summary_json: Some(summary.to_string()),
            persona_id: Some(experts[0].id),
            guest_id: None,
            trending_score: crate::ranking::trending_score(0, 0, 0, now, now) + DEBATE_BONUS,
        })
        .await?;

    for (i, line) in script.iter().enumerate() {
        let speaker = experts
            .iter()
            .find(|e| e.nickname == line.speaker)
            .unwrap_or(&experts[0]);
        store
            .create_debate_message(post.id, speaker.id, (i + 1) as u32, &line.text)
            .await?;
    }

    info!(post_id = %post.id, topic, lines = script.len(), "Debate post created");
    Ok(Some(post.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::DebateLine;
    use crate::testing::{FixedDice, MemoryStore, ScriptedGenerator};

    async fn three_experts(store: &MemoryStore) {
        store.add_persona("Analyst", PersonaRole::Expert, "numbers").await;
        store.add_persona("Scout", PersonaRole::Expert, "eyes").await;
        store.add_persona("OldCoach", PersonaRole::Expert, "fundamentals").await;
    }

    fn scripted(lines: Vec<(&str, &str)>) -> ScriptedGenerator {
        ScriptedGenerator::new().with_debate(
            lines
                .into_iter()
                .map(|(s, t)| DebateLine {
                    speaker: s.to_string(),
                    text: t.to_string(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn second_run_same_day_is_noop() {
        let store = MemoryStore::new();
        three_experts(&store).await;
        let generator = scripted(vec![("Analyst", "a"), ("Scout", "b")]);
        let dice = FixedDice::new(true);
        let now = Utc::now();

        let first = run_daily_debate(&store, &generator, &dice, now).await.unwrap();
        assert!(first.is_some());

        let second = run_daily_debate(&store, &generator, &dice, now).await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.debate_post_count(), 1);
    }

    #[tokio::test]
    async fn message_order_is_contiguous_from_one() {
        let store = MemoryStore::new();
        three_experts(&store).await;
        let generator = scripted(vec![
            ("Analyst", "opening"),
            ("Scout", "counter"),
            ("OldCoach", "closing"),
        ]);
        let dice = FixedDice::new(true);

        let post_id = run_daily_debate(&store, &generator, &dice, Utc::now())
            .await
            .unwrap()
            .unwrap();

        let mut orders: Vec<u32> = store
            .debate_messages(post_id)
            .iter()
            .map(|m| m.ord)
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn unknown_speaker_falls_back_to_first_expert() {
        let store = MemoryStore::new();
        three_experts(&store).await;
        let generator = scripted(vec![("Analyst", "a"), ("SomeoneElse", "b")]);
        let dice = FixedDice::new(true);

        let post_id = run_daily_debate(&store, &generator, &dice, Utc::now())
            .await
            .unwrap()
            .unwrap();

        let analyst = store.persona_by_nickname("Analyst").await.unwrap().unwrap();
        let messages = store.debate_messages(post_id);
        assert_eq!(messages.len(), 2);
        // Both lines resolve to real panelists; the unknown one to expert #1.
        assert_eq!(messages[1].speaker_id, analyst.id);
    }

    #[tokio::test]
    async fn fewer_than_three_experts_aborts() {
        let store = MemoryStore::new();
        store.add_persona("Analyst", PersonaRole::Expert, "numbers").await;
        let generator = scripted(vec![("Analyst", "a")]);
        let dice = FixedDice::new(true);

        let result = run_daily_debate(&store, &generator, &dice, Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.debate_post_count(), 0);
    }

    #[tokio::test]
    async fn empty_script_aborts_without_a_post() {
        let store = MemoryStore::new();
        three_experts(&store).await;
        let generator = ScriptedGenerator::new().with_debate(Vec::new());
        let dice = FixedDice::new(true);

        let result = run_daily_debate(&store, &generator, &dice, Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.debate_post_count(), 0);
    }

    #[tokio::test]
    async fn topic_prefers_hot_news_with_brackets_stripped() {
        let store = MemoryStore::new();
        store
            .seed_news_post("[BREAKING] Ace pitcher traded", "https://example.com/n1", 150.0)
            .await;
        let dice = FixedDice::new(true);

        let topic = debate_topic(&store, &dice, Utc::now()).await.unwrap();
        assert_eq!(topic, "BREAKING Ace pitcher traded");
    }

    #[tokio::test]
    async fn topic_falls_back_without_recent_news() {
        let store = MemoryStore::new();
        let dice = FixedDice::new(true);
        let topic = debate_topic(&store, &dice, Utc::now()).await.unwrap();
        assert_eq!(topic, FALLBACK_TOPICS[0]);
    }

    #[test]
    fn bracket_stripping_caps_length() {
        let long = format!("[tag] {}", "x".repeat(100));
        let stripped = strip_brackets(&long);
        assert!(stripped.chars().count() <= 50);
        assert!(!stripped.contains('['));
    }

    #[tokio::test]
    async fn debate_post_carries_the_bonus_score() {
        let store = MemoryStore::new();
        three_experts(&store).await;
        let generator = scripted(vec![("Analyst", "a"), ("Scout", "b")]);
        let dice = FixedDice::new(true);

        let post_id = run_daily_debate(&store, &generator, &dice, Utc::now())
            .await
            .unwrap()
            .unwrap();
        let post = store.post(post_id).await.unwrap().unwrap();
        assert_eq!(post.post_type, PostType::Debate);
        assert_eq!(post.trending_score, 200.0);
    }
}
