// Trait abstractions for the engine's external collaborators.
//
// ForumStore — relational persistence behind simple create/read/update calls.
// FeedSource — external news feed fetching.
// Dice — randomness as an injectable policy, so tests can force both branches
//   of every probabilistic decision (persona picks, delay buckets, the 30%
//   reaction gate, the 50% rebuttal gate).
//
// These enable deterministic testing with MemoryStore, StaticFeed, and
// FixedDice: no network, no database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use dugout_common::types::{
    Comment, DebateMessage, Guest, NewComment, NewPost, NewsItem, Persona, PersonaRole, Post,
    PostVote,
};

#[async_trait]
pub trait ForumStore: Send + Sync {
    // --- Posts ---

    async fn create_post(&self, new: NewPost) -> Result<Post>;

    async fn post(&self, id: Uuid) -> Result<Option<Post>>;

    async fn set_trending_score(&self, id: Uuid, score: f64) -> Result<()>;

    async fn increment_view_count(&self, id: Uuid) -> Result<()>;

    async fn increment_comment_count(&self, id: Uuid) -> Result<()>;

    /// Adjust like_count by `delta` (positive or negative).
    async fn adjust_like_count(&self, id: Uuid, delta: i64) -> Result<()>;

    /// Ids of all posts created at or after `since` (the rescore sweep set).
    async fn post_ids_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Uuid>>;

    async fn count_posts_since(&self, since: DateTime<Utc>) -> Result<u64>;

    /// Highest-trending news-sourced post created at or after `since`.
    async fn top_news_post_since(&self, since: DateTime<Utc>) -> Result<Option<Post>>;

    /// News-sourced posts created at or after `since`, newest first.
    async fn recent_news_posts(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Post>>;

    async fn debate_post_exists_since(&self, since: DateTime<Utc>) -> Result<bool>;

    /// Exact-URL dedup check for ingested news.
    async fn source_url_exists(&self, url: &str) -> Result<bool>;

    /// Has `persona_id` already authored a history post at or after `since`?
    async fn history_post_exists_since(&self, persona_id: Uuid, since: DateTime<Utc>)
        -> Result<bool>;

    /// Posts ordered by trending score, highest first.
    async fn trending_posts(&self, limit: usize) -> Result<Vec<Post>>;

    // --- Comments ---

    async fn create_comment(&self, new: NewComment) -> Result<Comment>;

    /// Up to `limit` comments on a post, newest first.
    async fn recent_comments(&self, post_id: Uuid, limit: usize) -> Result<Vec<Comment>>;

    // --- Personas ---

    async fn personas_with_roles(&self, roles: &[PersonaRole]) -> Result<Vec<Persona>>;

    async fn persona_by_nickname(&self, nickname: &str) -> Result<Option<Persona>>;

    // --- Guests ---

    async fn guest_by_identity(&self, identity_hash: &str) -> Result<Option<Guest>>;

    async fn create_guest(&self, identity_hash: &str, nickname: &str) -> Result<Guest>;

    // --- Votes ---

    async fn vote(&self, post_id: Uuid, guest_id: Uuid) -> Result<Option<PostVote>>;

    async fn create_vote(&self, post_id: Uuid, guest_id: Uuid) -> Result<PostVote>;

    async fn delete_vote(&self, vote_id: Uuid) -> Result<()>;

    // --- Views ---

    /// Any view of `post_id` at or after `since` by the same guest OR the
    /// same fingerprint?
    async fn viewed_since(
        &self,
        post_id: Uuid,
        guest_id: Option<Uuid>,
        fingerprint: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    /// Append a view event. The log is only read back through `viewed_since`.
    async fn record_view(
        &self,
        post_id: Uuid,
        guest_id: Option<Uuid>,
        fingerprint: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()>;

    // --- Debate messages ---

    async fn create_debate_message(
        &self,
        post_id: Uuid,
        speaker_id: Uuid,
        ord: u32,
        body: &str,
    ) -> Result<DebateMessage>;
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current items of the external news feed.
    async fn fetch(&self) -> Result<Vec<NewsItem>>;
}

/// Injectable random source.
pub trait Dice: Send + Sync {
    /// Uniform index in `0..len`. Callers guarantee `len > 0`.
    fn pick(&self, len: usize) -> usize;

    /// `true` with the given probability.
    fn chance(&self, probability: f64) -> bool;
}

/// Production dice backed by the thread-local rand generator.
pub struct ThreadDice;

impl Dice for ThreadDice {
    fn pick(&self, len: usize) -> usize {
        rand::random_range(0..len)
    }

    fn chance(&self, probability: f64) -> bool {
        rand::random_bool(probability)
    }
}
