//! Timed synthetic-interaction scheduler.
//!
//! Simulates organic comment activity on any post and front-loads attention
//! onto human-authored posts. Every scheduled action is a fire-and-forget
//! tokio task: failures are logged and dropped, targets that vanished before
//! the timer fired are silent no-ops, and nothing is ever retried or
//! cancelled. At-most-once is the contract.
//!
//! Tests drive the timers with tokio's paused clock
//! (`#[tokio::test(start_paused = true)]`) instead of real sleeps.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use dugout_common::types::{NewComment, PersonaRole};

use crate::personas::ContentGenerator;
use crate::ranking::update_post_trending_score;
use crate::traits::{Dice, ForumStore};

/// The staggered injection delays: one comment lands right away, the second
/// after a random bucket, the third 300s after the second. Policy knobs, not
/// load-bearing invariants.
const FIRST_COMMENT_DELAY: Duration = Duration::from_secs(1);
const DELAY_BUCKETS_SECS: [u64; 3] = [60, 180, 600];
const THIRD_COMMENT_EXTRA_SECS: u64 = 300;
const WELCOME_DELAY: Duration = Duration::from_millis(500);

/// How many prior comments are handed to the generator as context.
const COMMENT_CONTEXT_LIMIT: usize = 5;

/// A rebuttal needs at least this many existing comments to bite onto.
const REBUTTAL_MIN_COMMENTS: usize = 2;

/// Only half of eligible posts get a rebuttal. Intentional randomness.
const REBUTTAL_CHANCE: f64 = 0.5;

/// Short affirming phrases for the welcome comment on human posts.
const WELCOME_PHRASES: [&str; 7] = [
    "Welcome aboard, good first post!",
    "Haha nice one, thanks for sharing",
    "Oh I felt this",
    "Finally someone said it",
    "Good read, keep them coming!",
    "Same here honestly",
    "Fair point, I'll give you that",
];

/// Canned rebuttal shapes. Index 0 quotes a fragment of the latest comment.
const REBUTTAL_TEMPLATES: usize = 5;

fn rebuttal_text(pick: usize, latest_fragment: &str) -> String {
    match pick {
        0 => format!("\"{latest_fragment}...\" and you actually believe that? 😑"),
        1 => "Nah, I genuinely don't follow the logic here".to_string(),
        2 => "Wow, completely different read on this from me".to_string(),
        3 => "I'd argue the exact opposite, honestly...".to_string(),
        _ => "No way, that's just not it".to_string(),
    }
}

/// Orchestrates when synthetic actors act. Cheap to clone; every field is
/// shared.
#[derive(Clone)]
pub struct InteractionScheduler {
    store: Arc<dyn ForumStore>,
    generator: Arc<dyn ContentGenerator>,
    dice: Arc<dyn Dice>,
}

impl InteractionScheduler {
    pub fn new(
        store: Arc<dyn ForumStore>,
        generator: Arc<dyn ContentGenerator>,
        dice: Arc<dyn Dice>,
    ) -> Self {
        Self {
            store,
            generator,
            dice,
        }
    }

    /// Entry point for a freshly created post. Human-authored posts get a
    /// near-immediate welcome comment; every post gets the three staggered
    /// AI comment injections. Returns before any of that fires.
    pub fn on_post_created(&self, post_id: Uuid) {
        let this = self.clone();
        tokio::spawn(async move {
            match this.store.post(post_id).await {
                Ok(Some(post)) if post.is_human() => {
                    let welcomer = this.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(WELCOME_DELAY).await;
                        if let Err(e) = welcomer.add_welcome_comment(post_id).await {
                            warn!(post_id = %post_id, error = %e, "Welcome comment failed");
                        }
                    });
                }
                Ok(Some(_)) => {}
                Ok(None) => return,
                Err(e) => {
                    warn!(post_id = %post_id, error = %e, "Post lookup failed, skipping interactions");
                    return;
                }
            }
            this.schedule_ai_comments(post_id);
        });
    }

    /// Schedule the three staggered AI comment injections. The second delay
    /// is drawn once from the bucket list; the third is that same draw plus
    /// a fixed 300 seconds.
    pub fn schedule_ai_comments(&self, post_id: Uuid) {
        let bucket = DELAY_BUCKETS_SECS[self.dice.pick(DELAY_BUCKETS_SECS.len())];

        self.spawn_comment_after(post_id, FIRST_COMMENT_DELAY);
        self.spawn_comment_after(post_id, Duration::from_secs(bucket));
        self.spawn_comment_after(
            post_id,
            Duration::from_secs(bucket + THIRD_COMMENT_EXTRA_SECS),
        );
    }

    fn spawn_comment_after(&self, post_id: Uuid, delay: Duration) {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = this.add_ai_comment(post_id).await {
                warn!(post_id = %post_id, error = %e, "AI comment injection failed");
            }
        });
    }

    /// Fire-and-forget rebuttal attempt, triggered by a new human comment.
    pub fn spawn_rebuttal(&self, post_id: Uuid) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.try_rebuttal(post_id).await {
                warn!(post_id = %post_id, error = %e, "Rebuttal injection failed");
            }
        });
    }

    /// One AI comment: load post and recent thread, pick a persona, generate,
    /// persist, bump the counter, rescore. `Ok(None)` covers every expected
    /// no-op (post gone, no personas seeded).
    pub async fn add_ai_comment(&self, post_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let post = match self.store.post(post_id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let recent = self
            .store
            .recent_comments(post_id, COMMENT_CONTEXT_LIMIT)
            .await?;
        let prior: Vec<String> = recent.iter().map(|c| c.body.clone()).collect();

        let personas = self
            .store
            .personas_with_roles(&[PersonaRole::Fan, PersonaRole::Troll, PersonaRole::Expert])
            .await?;
        if personas.is_empty() {
            return Ok(None);
        }
        let persona = &personas[self.dice.pick(personas.len())];

        let body = self
            .generator
            .comment(persona, &post.title, &post.body, &prior)
            .await?;

        let comment = self
            .store
            .create_comment(NewComment::from_persona(post_id, persona.id, body.trim()))
            .await?;
        self.store.increment_comment_count(post_id).await?;
        update_post_trending_score(self.store.as_ref(), post_id, Utc::now()).await?;

        info!(
            post_id = %post_id,
            persona = %persona.nickname,
            "AI comment injected"
        );
        Ok(Some(comment.id))
    }

    /// Welcome comment for a human post: a random fan persona drops a phrase
    /// from the fixed pool.
    async fn add_welcome_comment(&self, post_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        if self.store.post(post_id).await?.is_none() {
            return Ok(None);
        }

        let fans = self.store.personas_with_roles(&[PersonaRole::Fan]).await?;
        if fans.is_empty() {
            return Ok(None);
        }
        let persona = &fans[self.dice.pick(fans.len())];
        let phrase = WELCOME_PHRASES[self.dice.pick(WELCOME_PHRASES.len())];

        let comment = self
            .store
            .create_comment(NewComment::from_persona(post_id, persona.id, phrase))
            .await?;
        self.store.increment_comment_count(post_id).await?;
        update_post_trending_score(self.store.as_ref(), post_id, Utc::now()).await?;

        Ok(Some(comment.id))
    }

    /// Possibly append a troll rebuttal to a post's thread. Needs at least
    /// two existing comments, then passes a 50% gate; the rebuttal may quote
    /// a fragment of the most recent comment.
    pub async fn try_rebuttal(&self, post_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let post = match self.store.post(post_id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let recent = self.store.recent_comments(post.id, 3).await?;
        if recent.len() < REBUTTAL_MIN_COMMENTS {
            return Ok(None);
        }

        if !self.dice.chance(REBUTTAL_CHANCE) {
            return Ok(None);
        }

        let trolls = self.store.personas_with_roles(&[PersonaRole::Troll]).await?;
        if trolls.is_empty() {
            return Ok(None);
        }
        let troll = &trolls[self.dice.pick(trolls.len())];

        let latest = &recent[0];
        let fragment: String = latest.body.chars().take(10).collect();
        let body = rebuttal_text(self.dice.pick(REBUTTAL_TEMPLATES), &fragment);

        let comment = self
            .store
            .create_comment(NewComment::from_persona(post_id, troll.id, body))
            .await?;
        self.store.increment_comment_count(post_id).await?;
        update_post_trending_score(self.store.as_ref(), post_id, Utc::now()).await?;

        info!(post_id = %post_id, persona = %troll.nickname, "Rebuttal injected");
        Ok(Some(comment.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedDice, MemoryStore, ScriptedGenerator};

    fn scheduler(store: Arc<MemoryStore>, dice: FixedDice) -> InteractionScheduler {
        InteractionScheduler::new(
            store,
            Arc::new(ScriptedGenerator::new().with_comment("scripted reply")),
            Arc::new(dice),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn three_comments_land_on_schedule() {
        let store = Arc::new(MemoryStore::new());
        store.add_persona("FanOne", PersonaRole::Fan, "loud").await;
        let post_id = store.seed_persona_post("title", "gossip").await;

        // pick=0 → 60s bucket, so injections at 1s, 60s, 360s.
        let s = scheduler(store.clone(), FixedDice::new(true));
        s.schedule_ai_comments(post_id);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.post(post_id).await.unwrap().unwrap().comment_count, 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.post(post_id).await.unwrap().unwrap().comment_count, 2);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(store.post(post_id).await.unwrap().unwrap().comment_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn human_post_gets_welcome_plus_injections() {
        let store = Arc::new(MemoryStore::new());
        store.add_persona("FanOne", PersonaRole::Fan, "loud").await;
        let guest = store.create_guest("hash", "g").await.unwrap();
        let post_id = store.seed_guest_post("hello", "gossip", guest.id).await;

        let s = scheduler(store.clone(), FixedDice::new(true));
        s.on_post_created(post_id);

        // Welcome (0.5s) + first injection (1s) + bucket (60s) + third (360s).
        tokio::time::sleep(Duration::from_secs(400)).await;
        let post = store.post(post_id).await.unwrap().unwrap();
        assert_eq!(post.comment_count, 4);

        // The welcome comment is one of the fixed phrases from a fan.
        let comments = store.recent_comments(post_id, 10).await.unwrap();
        assert!(comments
            .iter()
            .any(|c| WELCOME_PHRASES.contains(&c.body.as_str())));
    }

    #[tokio::test(start_paused = true)]
    async fn persona_post_gets_no_welcome() {
        let store = Arc::new(MemoryStore::new());
        store.add_persona("FanOne", PersonaRole::Fan, "loud").await;
        let post_id = store.seed_persona_post("title", "gossip").await;

        let s = scheduler(store.clone(), FixedDice::new(true));
        s.on_post_created(post_id);

        tokio::time::sleep(Duration::from_secs(400)).await;
        assert_eq!(store.post(post_id).await.unwrap().unwrap().comment_count, 3);
    }

    #[tokio::test]
    async fn injection_on_missing_post_is_noop() {
        let store = Arc::new(MemoryStore::new());
        store.add_persona("FanOne", PersonaRole::Fan, "loud").await;
        let s = scheduler(store.clone(), FixedDice::new(true));

        let result = s.add_ai_comment(Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn injection_with_no_personas_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let post_id = store.seed_persona_post("title", "gossip").await;
        let s = scheduler(store.clone(), FixedDice::new(true));

        let result = s.add_ai_comment(post_id).await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.post(post_id).await.unwrap().unwrap().comment_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn generator_failure_never_escapes_the_timer() {
        let store = Arc::new(MemoryStore::new());
        store.add_persona("FanOne", PersonaRole::Fan, "loud").await;
        let post_id = store.seed_persona_post("title", "gossip").await;

        let s = InteractionScheduler::new(
            store.clone(),
            Arc::new(ScriptedGenerator::failing()),
            Arc::new(FixedDice::new(true)),
        );
        s.schedule_ai_comments(post_id);

        tokio::time::sleep(Duration::from_secs(700)).await;
        // All three injections failed softly; nothing was persisted.
        assert_eq!(store.post(post_id).await.unwrap().unwrap().comment_count, 0);
    }

    #[tokio::test]
    async fn rebuttal_requires_two_comments() {
        let store = Arc::new(MemoryStore::new());
        store.add_persona("Heckler", PersonaRole::Troll, "cynical").await;
        let post_id = store.seed_persona_post("title", "gossip").await;
        store.seed_comment(post_id, "only one comment").await;

        let s = scheduler(store.clone(), FixedDice::new(true));
        assert!(s.try_rebuttal(post_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rebuttal_respects_the_coin_flip() {
        let store = Arc::new(MemoryStore::new());
        store.add_persona("Heckler", PersonaRole::Troll, "cynical").await;
        let post_id = store.seed_persona_post("title", "gossip").await;
        store.seed_comment(post_id, "first").await;
        store.seed_comment(post_id, "second").await;

        let s = scheduler(store.clone(), FixedDice::new(false));
        assert!(s.try_rebuttal(post_id).await.unwrap().is_none());
        assert_eq!(store.post(post_id).await.unwrap().unwrap().comment_count, 0);
    }

    #[tokio::test]
    async fn rebuttal_comes_from_a_troll_and_may_quote() {
        let store = Arc::new(MemoryStore::new());
        let troll = store.add_persona("Heckler", PersonaRole::Troll, "cynical").await;
        let post_id = store.seed_persona_post("title", "gossip").await;
        store.seed_comment(post_id, "first").await;
        store.seed_comment(post_id, "the latest hot take here").await;

        // chance → true, picks → troll 0, template 0 (the quoting one).
        let s = scheduler(store.clone(), FixedDice::new(true));
        let id = s.try_rebuttal(post_id).await.unwrap();
        assert!(id.is_some());

        let comments = store.recent_comments(post_id, 1).await.unwrap();
        assert_eq!(comments[0].persona_id, Some(troll.id));
        assert!(comments[0].body.contains("the latest"));
        assert_eq!(store.post(post_id).await.unwrap().unwrap().comment_count, 1);
    }

    #[tokio::test]
    async fn rebuttal_on_missing_post_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let s = scheduler(store.clone(), FixedDice::new(true));
        assert!(s.try_rebuttal(Uuid::new_v4()).await.unwrap().is_none());
    }
}
