/// HTTP request handlers
pub mod posts;

pub use posts::{create_post, get_posts};
