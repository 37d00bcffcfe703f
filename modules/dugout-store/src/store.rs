//! PgStore — the production ForumStore.
//!
//! Queries are runtime-bound (no compile-time schema checks) so the crate
//! builds without a live database. Enum columns are stored as their text
//! form and decoded through the shared `parse` helpers.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use dugout_common::types::{
    Comment, DebateMessage, Guest, NewComment, NewPost, Persona, PersonaRole, Post, PostType,
    PostVote, SourceType,
};
use dugout_core::ForumStore;

const POST_COLUMNS: &str = "id, title, body, post_type, category_slug, source_type, source_url, \
     source_title, source_provider, summary_json, persona_id, guest_id, view_count, like_count, \
     comment_count, trending_score, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        tracing::info!("Connected to Postgres");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ForumStore for PgStore {
    async fn create_post(&self, new: NewPost) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (id, title, body, post_type, category_slug, source_type,
                               source_url, source_title, source_provider, summary_json,
                               persona_id, guest_id, trending_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.body)
        .bind(new.post_type.as_str())
        .bind(&new.category_slug)
        .bind(new.source_type.as_str())
        .bind(&new.source_url)
        .bind(&new.source_title)
        .bind(&new.source_provider)
        .bind(&new.summary_json)
        .bind(new.persona_id)
        .bind(new.guest_id)
        .bind(new.trending_score)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn post(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    async fn set_trending_score(&self, id: Uuid, score: f64) -> Result<()> {
        sqlx::query("UPDATE posts SET trending_score = $2 WHERE id = $1")
            .bind(id)
            .bind(score)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_comment_count(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn adjust_like_count(&self, id: Uuid, delta: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET like_count = GREATEST(like_count + $2, 0) WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn post_ids_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            "SELECT id FROM posts WHERE created_at >= $1 ORDER BY created_at ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn count_posts_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM posts WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0.max(0) as u64)
    }

    async fn top_news_post_since(&self, since: DateTime<Utc>) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE source_type = 'NEWS' AND created_at >= $1
            ORDER BY trending_score DESC
            LIMIT 1
            "#
        ))
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    async fn recent_news_posts(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE source_type = 'NEWS' AND created_at >= $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn debate_post_exists_since(&self, since: DateTime<Utc>) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE post_type = 'DEBATE' AND created_at >= $1)",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn source_url_exists(&self, url: &str) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE source_url = $1)",
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn history_post_exists_since(
        &self,
        persona_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM posts
                WHERE persona_id = $1 AND source_type = 'HISTORY' AND created_at >= $2
            )
            "#,
        )
        .bind(persona_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn trending_posts(&self, limit: usize) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY trending_score DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (id, body, post_id, persona_id, guest_id, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, body, post_id, persona_id, guest_id, parent_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.body)
        .bind(new.post_id)
        .bind(new.persona_id)
        .bind(new.guest_id)
        .bind(new.parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn recent_comments(&self, post_id: Uuid, limit: usize) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, body, post_id, persona_id, guest_id, parent_id, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(post_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn personas_with_roles(&self, roles: &[PersonaRole]) -> Result<Vec<Persona>> {
        let role_names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        let rows = sqlx::query_as::<_, PersonaRow>(
            "SELECT id, nickname, role, traits FROM personas WHERE role = ANY($1)",
        )
        .bind(&role_names)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn persona_by_nickname(&self, nickname: &str) -> Result<Option<Persona>> {
        let row = sqlx::query_as::<_, PersonaRow>(
            "SELECT id, nickname, role, traits FROM personas WHERE nickname = $1",
        )
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    async fn guest_by_identity(&self, identity_hash: &str) -> Result<Option<Guest>> {
        let row = sqlx::query_as::<_, GuestRow>(
            r#"
            SELECT id, identity_hash, nickname, password_hash, created_at
            FROM guests
            WHERE identity_hash = $1
            "#,
        )
        .bind(identity_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    async fn create_guest(&self, identity_hash: &str, nickname: &str) -> Result<Guest> {
        let row = sqlx::query_as::<_, GuestRow>(
            r#"
            INSERT INTO guests (id, identity_hash, nickname)
            VALUES ($1, $2, $3)
            RETURNING id, identity_hash, nickname, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(identity_hash)
        .bind(nickname)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn vote(&self, post_id: Uuid, guest_id: Uuid) -> Result<Option<PostVote>> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, post_id, guest_id, created_at
            FROM post_votes
            WHERE post_id = $1 AND guest_id = $2
            "#,
        )
        .bind(post_id)
        .bind(guest_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    async fn create_vote(&self, post_id: Uuid, guest_id: Uuid) -> Result<PostVote> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            INSERT INTO post_votes (id, post_id, guest_id)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, guest_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(guest_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn delete_vote(&self, vote_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM post_votes WHERE id = $1")
            .bind(vote_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn viewed_since(
        &self,
        post_id: Uuid,
        guest_id: Option<Uuid>,
        fingerprint: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM post_views
                WHERE post_id = $1
                  AND viewed_at >= $4
                  AND (($2::uuid IS NOT NULL AND guest_id = $2)
                    OR ($3::text IS NOT NULL AND fingerprint = $3))
            )
            "#,
        )
        .bind(post_id)
        .bind(guest_id)
        .bind(fingerprint)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn record_view(
        &self,
        post_id: Uuid,
        guest_id: Option<Uuid>,
        fingerprint: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO post_views (post_id, guest_id, fingerprint, viewed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(post_id)
        .bind(guest_id)
        .bind(fingerprint)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_debate_message(
        &self,
        post_id: Uuid,
        speaker_id: Uuid,
        ord: u32,
        body: &str,
    ) -> Result<DebateMessage> {
        let row = sqlx::query_as::<_, DebateMessageRow>(
            r#"
            INSERT INTO debate_messages (id, post_id, speaker_id, ord, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, speaker_id, ord, body
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(speaker_id)
        .bind(ord as i32)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn decode_error(column: &str, value: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("unrecognized {column} value: {value}").into())
}

struct PostRow(Post);

impl<'r> sqlx::FromRow<'r, PgRow> for PostRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let post_type: String = row.try_get("post_type")?;
        let source_type: String = row.try_get("source_type")?;
        Ok(PostRow(Post {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            post_type: PostType::parse(&post_type)
                .ok_or_else(|| decode_error("post_type", &post_type))?,
            category_slug: row.try_get("category_slug")?,
            source_type: SourceType::parse(&source_type)
                .ok_or_else(|| decode_error("source_type", &source_type))?,
            source_url: row.try_get("source_url")?,
            source_title: row.try_get("source_title")?,
            source_provider: row.try_get("source_provider")?,
            summary_json: row.try_get("summary_json")?,
            persona_id: row.try_get("persona_id")?,
            guest_id: row.try_get("guest_id")?,
            view_count: row.try_get::<i64, _>("view_count")?.max(0) as u64,
            like_count: row.try_get::<i64, _>("like_count")?.max(0) as u64,
            comment_count: row.try_get::<i64, _>("comment_count")?.max(0) as u64,
            trending_score: row.try_get("trending_score")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

struct CommentRow(Comment);

impl<'r> sqlx::FromRow<'r, PgRow> for CommentRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(CommentRow(Comment {
            id: row.try_get("id")?,
            body: row.try_get("body")?,
            post_id: row.try_get("post_id")?,
            persona_id: row.try_get("persona_id")?,
            guest_id: row.try_get("guest_id")?,
            parent_id: row.try_get("parent_id")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

struct PersonaRow(Persona);

impl<'r> sqlx::FromRow<'r, PgRow> for PersonaRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(PersonaRow(Persona {
            id: row.try_get("id")?,
            nickname: row.try_get("nickname")?,
            role: PersonaRole::parse(&role).ok_or_else(|| decode_error("role", &role))?,
            traits: row.try_get("traits")?,
        }))
    }
}

struct GuestRow(Guest);

impl<'r> sqlx::FromRow<'r, PgRow> for GuestRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(GuestRow(Guest {
            id: row.try_get("id")?,
            identity_hash: row.try_get("identity_hash")?,
            nickname: row.try_get("nickname")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

struct VoteRow(PostVote);

impl<'r> sqlx::FromRow<'r, PgRow> for VoteRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(VoteRow(PostVote {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            guest_id: row.try_get("guest_id")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

struct DebateMessageRow(DebateMessage);

impl<'r> sqlx::FromRow<'r, PgRow> for DebateMessageRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(DebateMessageRow(DebateMessage {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            speaker_id: row.try_get("speaker_id")?,
            ord: row.try_get::<i32, _>("ord")?.max(0) as u32,
            body: row.try_get("body")?,
        }))
    }
}
