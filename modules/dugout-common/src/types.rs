use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Behavioral role of a synthetic actor. Fixed at seeding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaRole {
    Expert,
    Fan,
    Troll,
    System,
}

impl PersonaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaRole::Expert => "expert",
            PersonaRole::Fan => "fan",
            PersonaRole::Troll => "troll",
            PersonaRole::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expert" => Some(PersonaRole::Expert),
            "fan" => Some(PersonaRole::Fan),
            "troll" => Some(PersonaRole::Troll),
            "system" => Some(PersonaRole::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for PersonaRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostType {
    Normal,
    Debate,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Normal => "NORMAL",
            PostType::Debate => "DEBATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NORMAL" => Some(PostType::Normal),
            "DEBATE" => Some(PostType::Debate),
            _ => None,
        }
    }
}

/// Where a post's content came from. `News` and `History` posts are authored
/// by the system bot personas; everything else is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    None,
    News,
    History,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::None => "NONE",
            SourceType::News => "NEWS",
            SourceType::History => "HISTORY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(SourceType::None),
            "NEWS" => Some(SourceType::News),
            "HISTORY" => Some(SourceType::History),
            _ => None,
        }
    }
}

/// A named synthetic actor. Immutable after seeding; read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: Uuid,
    /// Unique display name.
    pub nickname: String,
    pub role: PersonaRole,
    /// Free-text behavioral descriptor, fed verbatim into generation prompts.
    pub traits: String,
}

/// An anonymous human actor, created ad hoc per session. Never merged:
/// repeat visits without a stored token become new guests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
    pub id: Uuid,
    pub identity_hash: String,
    pub nickname: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub post_type: PostType,
    pub category_slug: String,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    pub source_provider: Option<String>,
    /// Presentation metadata for debate posts (topic, panel, message count).
    pub summary_json: Option<String>,
    /// Author: exactly one of persona_id / guest_id is set.
    pub persona_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// Derived from (counters, created_at, is_human) as of the last recompute.
    /// May be stale between mutations; never an independent source of truth.
    pub trending_score: f64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_human(&self) -> bool {
        self.guest_id.is_some()
    }
}

/// Fields the caller supplies when creating a post. The store assigns id,
/// created_at, and zeroed counters.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub post_type: PostType,
    pub category_slug: String,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    pub source_provider: Option<String>,
    pub summary_json: Option<String>,
    pub persona_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub trending_score: f64,
}

impl NewPost {
    /// A normal persona-authored post with no external source.
    pub fn persona_post(
        title: impl Into<String>,
        body: impl Into<String>,
        category_slug: impl Into<String>,
        persona_id: Uuid,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            post_type: PostType::Normal,
            category_slug: category_slug.into(),
            source_type: SourceType::None,
            source_url: None,
            source_title: None,
            source_provider: None,
            summary_json: None,
            persona_id: Some(persona_id),
            guest_id: None,
            trending_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub body: String,
    pub post_id: Uuid,
    pub persona_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    /// Threading parent. Stored but not otherwise exploited.
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub body: String,
    pub post_id: Uuid,
    pub persona_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
}

impl NewComment {
    pub fn from_persona(post_id: Uuid, persona_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            post_id,
            persona_id: Some(persona_id),
            guest_id: None,
            parent_id: None,
        }
    }

    pub fn from_guest(post_id: Uuid, guest_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            post_id,
            persona_id: None,
            guest_id: Some(guest_id),
            parent_id: None,
        }
    }
}

/// One scripted line of a debate post. `ord` is strictly monotonic per post,
/// unique together with post_id, contiguous from 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateMessage {
    pub id: Uuid,
    pub post_id: Uuid,
    pub speaker_id: Uuid,
    pub ord: u32,
    pub body: String,
}

/// One row per (post, guest) pair; existence means "liked".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostVote {
    pub id: Uuid,
    pub post_id: Uuid,
    pub guest_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
}

/// A news item pulled from an external feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub source: String,
}
