//! Identity directory client
//!
//! The identity directory is an external service that owns user accounts;
//! this crate exposes the read-only lookup the post service needs (batch
//! fetch by ID) behind the `IdentityDirectory` trait so callers can swap the
//! HTTP implementation for a mock in tests.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// A user record as returned by the identity directory. `username` is
/// optional on the wire: accounts created through some providers have no
/// handle until the owner picks one.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityRecord {
    pub id: String,
    pub username: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity directory returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Batch lookup of identity records by ID.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn get_users(
        &self,
        ids: &[String],
        limit: usize,
    ) -> Result<Vec<IdentityRecord>, IdentityError>;
}

/// HTTP client for the identity directory's user listing endpoint.
pub struct HttpIdentityDirectory {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    users: Vec<IdentityRecord>,
}

impl HttpIdentityDirectory {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn get_users(
        &self,
        ids: &[String],
        limit: usize,
    ) -> Result<Vec<IdentityRecord>, IdentityError> {
        let url = format!("{}/api/v1/users", self.base_url);

        debug!(count = ids.len(), "fetching identity records");

        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids.join(",")), ("limit", limit.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IdentityError::Status { status, body });
        }

        let list = response.json::<UserListResponse>().await?;
        Ok(list.users)
    }
}
