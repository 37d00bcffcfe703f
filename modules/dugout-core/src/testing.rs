//! Test doubles for the engine's collaborator traits.
//!
//! - `MemoryStore` (ForumStore) — stateful in-memory forum
//! - `ScriptedGenerator` (ContentGenerator) — fixed responses, optional failure
//! - `FixedDice` (Dice) — forced picks and coin flips
//! - `StaticFeed` (FeedSource) — canned feed items, optional failure
//!
//! No network, no database; `cargo test` runs in seconds.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use dugout_common::types::{
    Comment, DebateMessage, Guest, NewComment, NewPost, NewsItem, Persona, PersonaRole, Post,
    PostType, PostVote, SourceType,
};

use crate::personas::{ContentGenerator, DebateLine, GeneratedPost};
use crate::traits::{Dice, FeedSource, ForumStore};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    personas: Vec<Persona>,
    guests: Vec<Guest>,
    votes: Vec<PostVote>,
    views: Vec<ViewEvent>,
    debate_messages: Vec<DebateMessage>,
}

struct ViewEvent {
    post_id: Uuid,
    guest_id: Option<Uuid>,
    fingerprint: Option<String>,
    at: DateTime<Utc>,
}

/// In-memory ForumStore with the same uniqueness guarantees the relational
/// schema enforces: one vote row per (post, guest), one debate message per
/// (post, ord), unique persona nicknames.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Seeding helpers ---

    pub async fn add_persona(&self, nickname: &str, role: PersonaRole, traits: &str) -> Persona {
        let persona = Persona {
            id: Uuid::new_v4(),
            nickname: nickname.to_string(),
            role,
            traits: traits.to_string(),
        };
        self.inner.lock().unwrap().personas.push(persona.clone());
        persona
    }

    /// A normal persona-authored post with zeroed counters.
    pub async fn seed_persona_post(&self, title: &str, category: &str) -> Uuid {
        self.create_post(NewPost::persona_post(title, "body", category, Uuid::new_v4()))
            .await
            .unwrap()
            .id
    }

    pub async fn seed_guest_post(&self, title: &str, category: &str, guest_id: Uuid) -> Uuid {
        let mut new = NewPost::persona_post(title, "body", category, Uuid::new_v4());
        new.persona_id = None;
        new.guest_id = Some(guest_id);
        self.create_post(new).await.unwrap().id
    }

    pub async fn seed_news_post(&self, title: &str, url: &str, score: f64) -> Uuid {
        let mut new = NewPost::persona_post(title, "summary", "news", Uuid::new_v4());
        new.source_type = SourceType::News;
        new.source_url = Some(url.to_string());
        new.source_title = Some(title.to_string());
        new.trending_score = score;
        self.create_post(new).await.unwrap().id
    }

    /// Insert a comment row without touching the post's comment counter.
    pub async fn seed_comment(&self, post_id: Uuid, body: &str) -> Uuid {
        self.create_comment(NewComment::from_persona(post_id, Uuid::new_v4(), body))
            .await
            .unwrap()
            .id
    }

    pub fn set_created_at(&self, post_id: Uuid, at: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.posts.iter_mut().find(|p| p.id == post_id) {
            p.created_at = at;
        }
    }

    pub fn set_comment_count(&self, post_id: Uuid, count: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.posts.iter_mut().find(|p| p.id == post_id) {
            p.comment_count = count;
        }
    }

    // --- Inspection helpers ---

    pub fn debate_post_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|p| p.post_type == PostType::Debate)
            .count()
    }

    pub fn debate_messages(&self, post_id: Uuid) -> Vec<DebateMessage> {
        let mut messages: Vec<DebateMessage> = self
            .inner
            .lock()
            .unwrap()
            .debate_messages
            .iter()
            .filter(|m| m.post_id == post_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.ord);
        messages
    }
}

#[async_trait]
impl ForumStore for MemoryStore {
    async fn create_post(&self, new: NewPost) -> Result<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            title: new.title,
            body: new.body,
            post_type: new.post_type,
            category_slug: new.category_slug,
            source_type: new.source_type,
            source_url: new.source_url,
            source_title: new.source_title,
            source_provider: new.source_provider,
            summary_json: new.summary_json,
            persona_id: new.persona_id,
            guest_id: new.guest_id,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            trending_score: new.trending_score,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().posts.push(post.clone());
        Ok(post)
    }

    async fn post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn set_trending_score(&self, id: Uuid, score: f64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.posts.iter_mut().find(|p| p.id == id) {
            p.trending_score = score;
        }
        Ok(())
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.posts.iter_mut().find(|p| p.id == id) {
            p.view_count += 1;
        }
        Ok(())
    }

    async fn increment_comment_count(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.posts.iter_mut().find(|p| p.id == id) {
            p.comment_count += 1;
        }
        Ok(())
    }

    async fn adjust_like_count(&self, id: Uuid, delta: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.posts.iter_mut().find(|p| p.id == id) {
            p.like_count = p.like_count.saturating_add_signed(delta);
        }
        Ok(())
    }

    async fn post_ids_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Uuid>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|p| p.created_at >= since)
            .map(|p| p.id)
            .collect())
    }

    async fn count_posts_since(&self, since: DateTime<Utc>) -> Result<u64> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|p| p.created_at >= since)
            .count() as u64)
    }

    async fn top_news_post_since(&self, since: DateTime<Utc>) -> Result<Option<Post>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|p| p.source_type == SourceType::News && p.created_at >= since)
            .max_by(|a, b| a.trending_score.total_cmp(&b.trending_score))
            .cloned())
    }

    async fn recent_news_posts(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Post>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .rev()
            .filter(|p| p.source_type == SourceType::News && p.created_at >= since)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn debate_post_exists_since(&self, since: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .any(|p| p.post_type == PostType::Debate && p.created_at >= since))
    }

    async fn source_url_exists(&self, url: &str) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .any(|p| p.source_url.as_deref() == Some(url)))
    }

    async fn history_post_exists_since(
        &self,
        persona_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.inner.lock().unwrap().posts.iter().any(|p| {
            p.persona_id == Some(persona_id)
                && p.source_type == SourceType::History
                && p.created_at >= since
        }))
    }

    async fn trending_posts(&self, limit: usize) -> Result<Vec<Post>> {
        let mut posts = self.inner.lock().unwrap().posts.clone();
        posts.sort_by(|a, b| b.trending_score.total_cmp(&a.trending_score));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            body: new.body,
            post_id: new.post_id,
            persona_id: new.persona_id,
            guest_id: new.guest_id,
            parent_id: new.parent_id,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().comments.push(comment.clone());
        Ok(comment)
    }

    async fn recent_comments(&self, post_id: Uuid, limit: usize) -> Result<Vec<Comment>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn personas_with_roles(&self, roles: &[PersonaRole]) -> Result<Vec<Persona>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .personas
            .iter()
            .filter(|p| roles.contains(&p.role))
            .cloned()
            .collect())
    }

    async fn persona_by_nickname(&self, nickname: &str) -> Result<Option<Persona>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .personas
            .iter()
            .find(|p| p.nickname == nickname)
            .cloned())
    }

    async fn guest_by_identity(&self, identity_hash: &str) -> Result<Option<Guest>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .guests
            .iter()
            .find(|g| g.identity_hash == identity_hash)
            .cloned())
    }

    async fn create_guest(&self, identity_hash: &str, nickname: &str) -> Result<Guest> {
        let guest = Guest {
            id: Uuid::new_v4(),
            identity_hash: identity_hash.to_string(),
            nickname: nickname.to_string(),
            password_hash: None,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().guests.push(guest.clone());
        Ok(guest)
    }

    async fn vote(&self, post_id: Uuid, guest_id: Uuid) -> Result<Option<PostVote>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .votes
            .iter()
            .find(|v| v.post_id == post_id && v.guest_id == guest_id)
            .cloned())
    }

    async fn create_vote(&self, post_id: Uuid, guest_id: Uuid) -> Result<PostVote> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .votes
            .iter()
            .any(|v| v.post_id == post_id && v.guest_id == guest_id)
        {
            bail!("unique constraint violation: vote ({post_id}, {guest_id})");
        }
        let vote = PostVote {
            id: Uuid::new_v4(),
            post_id,
            guest_id,
            created_at: Utc::now(),
        };
        inner.votes.push(vote.clone());
        Ok(vote)
    }

    async fn delete_vote(&self, vote_id: Uuid) -> Result<()> {
        self.inner.lock().unwrap().votes.retain(|v| v.id != vote_id);
        Ok(())
    }

    async fn viewed_since(
        &self,
        post_id: Uuid,
        guest_id: Option<Uuid>,
        fingerprint: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.inner.lock().unwrap().views.iter().any(|v| {
            v.post_id == post_id
                && v.at >= since
                && ((guest_id.is_some() && v.guest_id == guest_id)
                    || (fingerprint.is_some() && v.fingerprint.as_deref() == fingerprint))
        }))
    }

    async fn record_view(
        &self,
        post_id: Uuid,
        guest_id: Option<Uuid>,
        fingerprint: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.inner.lock().unwrap().views.push(ViewEvent {
            post_id,
            guest_id,
            fingerprint: fingerprint.map(str::to_string),
            at,
        });
        Ok(())
    }

    async fn create_debate_message(
        &self,
        post_id: Uuid,
        speaker_id: Uuid,
        ord: u32,
        body: &str,
    ) -> Result<DebateMessage> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .debate_messages
            .iter()
            .any(|m| m.post_id == post_id && m.ord == ord)
        {
            bail!("unique constraint violation: debate message ({post_id}, {ord})");
        }
        let message = DebateMessage {
            id: Uuid::new_v4(),
            post_id,
            speaker_id,
            ord,
            body: body.to_string(),
        };
        inner.debate_messages.push(message.clone());
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// ContentGenerator returning fixed responses. `failing()` makes every call
/// error, for failure-isolation tests.
#[derive(Default)]
pub struct ScriptedGenerator {
    post: Option<GeneratedPost>,
    comment: Option<String>,
    debate: Option<Vec<DebateLine>>,
    fail: bool,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_post(mut self, title: &str, body: &str) -> Self {
        self.post = Some(GeneratedPost {
            title: title.to_string(),
            body: body.to_string(),
        });
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn with_debate(mut self, lines: Vec<DebateLine>) -> Self {
        self.debate = Some(lines);
        self
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn post(
        &self,
        _persona: &Persona,
        topic: &str,
        _source: Option<&NewsItem>,
    ) -> Result<GeneratedPost> {
        if self.fail {
            bail!("scripted generation failure");
        }
        Ok(self.post.clone().unwrap_or_else(|| GeneratedPost {
            title: topic.to_string(),
            body: "generated body".to_string(),
        }))
    }

    async fn comment(
        &self,
        _persona: &Persona,
        _post_title: &str,
        _post_body: &str,
        _prior_comments: &[String],
    ) -> Result<String> {
        if self.fail {
            bail!("scripted generation failure");
        }
        Ok(self
            .comment
            .clone()
            .unwrap_or_else(|| "generated comment".to_string()))
    }

    async fn debate_script(&self, _topic: &str, _experts: &[Persona]) -> Result<Vec<DebateLine>> {
        if self.fail {
            bail!("scripted generation failure");
        }
        Ok(self.debate.clone().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// FixedDice
// ---------------------------------------------------------------------------

/// Dice with forced outcomes: coin flips return `default_chance`, picks pop
/// from a queue (default 0 when the queue is empty).
pub struct FixedDice {
    default_chance: bool,
    picks: Mutex<VecDeque<usize>>,
}

impl FixedDice {
    pub fn new(default_chance: bool) -> Self {
        Self {
            default_chance,
            picks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_picks(self, picks: &[usize]) -> Self {
        *self.picks.lock().unwrap() = picks.iter().copied().collect();
        self
    }
}

impl Dice for FixedDice {
    fn pick(&self, len: usize) -> usize {
        let forced = self.picks.lock().unwrap().pop_front().unwrap_or(0);
        forced.min(len.saturating_sub(1))
    }

    fn chance(&self, _probability: f64) -> bool {
        self.default_chance
    }
}

// ---------------------------------------------------------------------------
// StaticFeed
// ---------------------------------------------------------------------------

/// FeedSource returning canned items, or an error when built with
/// `failing()`.
pub struct StaticFeed {
    items: Vec<NewsItem>,
    fail: bool,
}

impl StaticFeed {
    pub fn new(items: Vec<NewsItem>) -> Self {
        Self { items, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            items: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        if self.fail {
            bail!("scripted feed failure");
        }
        Ok(self.items.clone())
    }
}
