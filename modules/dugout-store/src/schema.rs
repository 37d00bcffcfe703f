//! Table definitions. Applied statement by statement: the extended query
//! protocol rejects multi-statement strings.

use anyhow::Result;
use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        slug TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS personas (
        id       UUID PRIMARY KEY,
        nickname TEXT NOT NULL UNIQUE,
        role     TEXT NOT NULL,
        traits   TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS guests (
        id            UUID        PRIMARY KEY,
        identity_hash TEXT        NOT NULL UNIQUE,
        nickname      TEXT        NOT NULL,
        password_hash TEXT,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id              UUID             PRIMARY KEY,
        title           TEXT             NOT NULL,
        body            TEXT             NOT NULL,
        post_type       TEXT             NOT NULL DEFAULT 'NORMAL',
        category_slug   TEXT             NOT NULL REFERENCES categories(slug),
        source_type     TEXT             NOT NULL DEFAULT 'NONE',
        source_url      TEXT,
        source_title    TEXT,
        source_provider TEXT,
        summary_json    TEXT,
        persona_id      UUID             REFERENCES personas(id),
        guest_id        UUID             REFERENCES guests(id),
        view_count      BIGINT           NOT NULL DEFAULT 0,
        like_count      BIGINT           NOT NULL DEFAULT 0,
        comment_count   BIGINT           NOT NULL DEFAULT 0,
        trending_score  DOUBLE PRECISION NOT NULL DEFAULT 0,
        created_at      TIMESTAMPTZ      NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_posts_trending
        ON posts (trending_score DESC)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_posts_created_at
        ON posts (created_at)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_posts_source_url
        ON posts (source_url)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id         UUID        PRIMARY KEY,
        body       TEXT        NOT NULL,
        post_id    UUID        NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        persona_id UUID        REFERENCES personas(id),
        guest_id   UUID        REFERENCES guests(id),
        parent_id  UUID        REFERENCES comments(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_comments_post
        ON comments (post_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_votes (
        id         UUID        PRIMARY KEY,
        post_id    UUID        NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        guest_id   UUID        NOT NULL REFERENCES guests(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (post_id, guest_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_views (
        id          UUID        PRIMARY KEY DEFAULT gen_random_uuid(),
        post_id     UUID        NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        guest_id    UUID,
        fingerprint TEXT,
        viewed_at   TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_post_views_lookup
        ON post_views (post_id, viewed_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS debate_messages (
        id         UUID   PRIMARY KEY,
        post_id    UUID   NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        speaker_id UUID   NOT NULL REFERENCES personas(id),
        ord        INT    NOT NULL,
        body       TEXT   NOT NULL,
        UNIQUE (post_id, ord)
    )
    "#,
];

/// Create all tables and indexes. Idempotent.
pub async fn apply(pool: &PgPool) -> Result<()> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
