use crate::models::Post;
use async_trait::async_trait;
use sqlx::PgPool;

/// Post persistence. The service layer only sees this trait so tests can
/// substitute an in-memory double and assert on call counts.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Most recent posts first, at most `limit` rows.
    async fn find_recent(&self, limit: i64) -> Result<Vec<Post>, sqlx::Error>;

    /// Insert a post; `id` and `created_at` are assigned by the database.
    async fn insert(&self, author_id: &str, content: &str) -> Result<Post, sqlx::Error>;
}

/// PostgreSQL-backed post store.
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_recent(&self, limit: i64) -> Result<Vec<Post>, sqlx::Error> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, created_at
            FROM posts
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn insert(&self, author_id: &str, content: &str) -> Result<Post, sqlx::Error> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, content)
            VALUES ($1, $2)
            RETURNING id, author_id, content, created_at
            "#,
        )
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }
}
