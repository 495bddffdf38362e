/// Database access layer
pub mod post_repo;

pub use post_repo::{PgPostStore, PostStore};
