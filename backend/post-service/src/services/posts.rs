/// Post service - the read-side join and the write-side admission sequence
use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::models::{AuthorProjection, EnrichedPost, Post};
use crate::validators;
use identity_client::{IdentityDirectory, IdentityRecord};
use rate_limiter::RateLimiter;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// How many posts a single list call returns at most.
pub const RECENT_POSTS_LIMIT: i64 = 100;

/// Cap on the identity directory batch lookup.
const IDENTITY_LOOKUP_LIMIT: usize = 100;

/// Holds the process-wide collaborator handles. Constructed once at startup
/// and shared across requests; the collaborators own all mutable state.
pub struct PostService {
    store: Arc<dyn PostStore>,
    identity: Arc<dyn IdentityDirectory>,
    limiter: Arc<dyn RateLimiter>,
}

impl PostService {
    pub fn new(
        store: Arc<dyn PostStore>,
        identity: Arc<dyn IdentityDirectory>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            store,
            identity,
            limiter,
        }
    }

    /// List the most recent posts, each enriched with its author.
    ///
    /// Posts and identities live in systems with no referential integrity
    /// between them, so the in-memory join checks every reference: a post
    /// whose author is missing from the directory, or resolves to a record
    /// without a username, fails the whole call. No partial list is returned.
    pub async fn list_recent_posts(&self) -> Result<Vec<EnrichedPost>> {
        let posts = self.store.find_recent(RECENT_POSTS_LIMIT).await?;
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let author_ids: Vec<String> = posts
            .iter()
            .filter(|post| seen.insert(post.author_id.clone()))
            .map(|post| post.author_id.clone())
            .collect();

        let records = self
            .identity
            .get_users(&author_ids, IDENTITY_LOOKUP_LIMIT)
            .await?;
        let authors: HashMap<String, IdentityRecord> = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let author = authors
                    .get(&post.author_id)
                    .and_then(AuthorProjection::from_identity)
                    .ok_or_else(|| {
                        tracing::error!(
                            post_id = %post.id,
                            author_id = %post.author_id,
                            "post references an unresolvable author"
                        );
                        AppError::Internal("author for post not found".to_string())
                    })?;
                Ok(EnrichedPost { post, author })
            })
            .collect()
    }

    /// Create a post for `author_id`.
    ///
    /// Order matters: content validation first (an invalid request must not
    /// consume a rate-limit slot), then the admission check, then the insert.
    /// Nothing is persisted on any failure path.
    pub async fn create_post(&self, author_id: &str, content: &str) -> Result<Post> {
        validators::validate_post_content(content).map_err(|err| {
            AppError::Validation(
                err.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            )
        })?;

        let decision = self.limiter.limit(author_id).await?;
        if !decision.allowed {
            tracing::warn!(%author_id, "post creation rate limited");
            return Err(AppError::RateLimited);
        }

        let post = self.store.insert(author_id, content).await?;
        Ok(post)
    }
}
