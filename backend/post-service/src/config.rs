/// Configuration management for Post Service
///
/// This module handles loading and managing configuration from environment
/// variables.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration (rate limiter state)
    pub cache: CacheConfig,
    /// Identity directory configuration
    pub identity: IdentityConfig,
    /// Post admission quota
    pub rate_limit: RateLimitSettings,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL
    pub url: String,
}

/// Identity directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity directory service
    pub base_url: String,
}

/// Post admission quota: `max_requests` successful creations per author per
/// rolling `window_seconds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret used to validate Bearer tokens
    pub jwt_secret: String,
    /// What to do with an unauthenticated create call
    pub anonymous_author_policy: AnonymousAuthorPolicy,
}

/// Handling of create calls that carry no token. `AttributeToEmpty` keeps
/// the historical behavior of attributing the post to the empty author ID;
/// `Reject` turns such calls away with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnonymousAuthorPolicy {
    Reject,
    AttributeToEmpty,
}

impl AnonymousAuthorPolicy {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(AnonymousAuthorPolicy::Reject),
            "attribute-to-empty" => Ok(AnonymousAuthorPolicy::AttributeToEmpty),
            other => Err(format!(
                "ANONYMOUS_AUTHOR_POLICY must be 'reject' or 'attribute-to-empty', got '{}'",
                other
            )),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("POST_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("POST_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8082),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if app_env.eq_ignore_ascii_case("production") && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/chirp".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            cache: CacheConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            identity: IdentityConfig {
                base_url: std::env::var("IDENTITY_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:8084".to_string()),
            },
            rate_limit: RateLimitSettings {
                max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3),
                window_seconds: std::env::var("RATE_LIMIT_WINDOW_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            },
            auth: {
                let jwt_secret = match std::env::var("JWT_SECRET") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    Err(_) => "dev-secret".to_string(),
                };

                let anonymous_author_policy = match std::env::var("ANONYMOUS_AUTHOR_POLICY") {
                    Ok(raw) => AnonymousAuthorPolicy::parse(&raw)?,
                    Err(_) => AnonymousAuthorPolicy::AttributeToEmpty,
                };

                AuthConfig {
                    jwt_secret,
                    anonymous_author_policy,
                }
            },
        })
    }
}
