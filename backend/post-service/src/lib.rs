/// Post Service Library
///
/// Handles the posts endpoints for the Chirp platform: listing recent posts
/// enriched with author profiles from the identity directory, and creating
/// emoji-only posts guarded by a per-author rate limit.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and their DTOs
/// - `models`: Data structures for posts and author projections
/// - `services`: Business logic layer (the read join and the write admission)
/// - `db`: Post persistence behind the `PostStore` trait
/// - `validators`: Emoji-only content rule
/// - `middleware`: Bearer token authentication and request timing
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
