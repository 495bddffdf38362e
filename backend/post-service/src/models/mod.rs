/// Data models for post-service
///
/// - `Post`: an immutable emoji post as persisted
/// - `AuthorProjection`: the reduced view of an identity record exposed in
///   read responses
/// - `EnrichedPost`: a post paired with its resolved author, built per request
use chrono::{DateTime, Utc};
use identity_client::IdentityRecord;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A post as stored. Posts are append-only: nothing mutates or deletes a row
/// after the insert, so there are no status or soft-delete columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Post {
    pub id: Uuid,
    /// Opaque reference into the external identity directory
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Read-only author view derived from an identity record. `username` is
/// non-optional here: a record without a username never becomes a projection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthorProjection {
    pub id: String,
    pub username: String,
    pub profile_image_url: Option<String>,
}

impl AuthorProjection {
    /// Project an identity record down to the fields clients may see.
    /// Returns `None` when the record has no username, which callers treat
    /// as an unresolvable author.
    pub fn from_identity(record: &IdentityRecord) -> Option<Self> {
        let username = record.username.clone()?;
        Some(Self {
            id: record.id.clone(),
            username,
            profile_image_url: record.profile_image_url.clone(),
        })
    }
}

/// A post joined with its author for the duration of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EnrichedPost {
    pub post: Post,
    pub author: AuthorProjection,
}
