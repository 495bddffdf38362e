/// Service-level tests for the post reader and writer against mocked
/// collaborators: persistence, identity directory, and rate limiter.
#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use mockall::mock;
    use std::sync::Arc;
    use uuid::Uuid;

    use identity_client::{IdentityDirectory, IdentityError, IdentityRecord};
    use post_service::db::PostStore;
    use post_service::models::Post;
    use post_service::services::PostService;
    use post_service::AppError;
    use rate_limiter::{LimitDecision, RateLimitError, RateLimiter};

    // ============================================
    // Mock collaborators
    // ============================================

    mock! {
        Store {}

        #[async_trait]
        impl PostStore for Store {
            async fn find_recent(&self, limit: i64) -> Result<Vec<Post>, sqlx::Error>;
            async fn insert(&self, author_id: &str, content: &str) -> Result<Post, sqlx::Error>;
        }
    }

    mock! {
        Directory {}

        #[async_trait]
        impl IdentityDirectory for Directory {
            async fn get_users(
                &self,
                ids: &[String],
                limit: usize,
            ) -> Result<Vec<IdentityRecord>, IdentityError>;
        }
    }

    mock! {
        Limiter {}

        #[async_trait]
        impl RateLimiter for Limiter {
            async fn limit(&self, key: &str) -> Result<LimitDecision, RateLimitError>;
        }
    }

    // ============================================
    // Test helpers
    // ============================================

    fn post(author_id: &str, content: &str, age_secs: i64) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    fn record(id: &str, username: Option<&str>) -> IdentityRecord {
        IdentityRecord {
            id: id.to_string(),
            username: username.map(str::to_string),
            profile_image_url: Some(format!("https://img/{}.png", id)),
        }
    }

    fn service(
        store: MockStore,
        directory: MockDirectory,
        limiter: MockLimiter,
    ) -> PostService {
        PostService::new(Arc::new(store), Arc::new(directory), Arc::new(limiter))
    }

    // ============================================
    // Post reader
    // ============================================

    #[tokio::test]
    async fn list_preserves_store_order_and_resolves_authors() {
        let posts = vec![
            post("user_2", "🎉", 0),
            post("user_1", "👍", 10),
            post("user_2", "🔥", 20),
        ];
        let expected_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let mut store = MockStore::new();
        let fetched = posts.clone();
        store
            .expect_find_recent()
            .withf(|limit| *limit == 100)
            .times(1)
            .returning(move |_| Ok(fetched.clone()));

        let mut directory = MockDirectory::new();
        directory
            .expect_get_users()
            // duplicate author IDs are deduplicated before the lookup
            .withf(|ids, limit| {
                ids.len() == 2
                    && ids.contains(&"user_1".to_string())
                    && ids.contains(&"user_2".to_string())
                    && *limit == 100
            })
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    record("user_1", Some("ada")),
                    record("user_2", Some("grace")),
                ])
            });

        let service = service(store, directory, MockLimiter::new());
        let enriched = service.list_recent_posts().await.expect("enriched list");

        let got_ids: Vec<Uuid> = enriched.iter().map(|e| e.post.id).collect();
        assert_eq!(got_ids, expected_ids);
        assert_eq!(enriched[0].author.username, "grace");
        assert_eq!(enriched[1].author.username, "ada");
        assert_eq!(enriched[2].author.username, "grace");
    }

    #[tokio::test]
    async fn list_fails_when_an_author_is_missing() {
        let mut store = MockStore::new();
        let posts = vec![post("user_1", "👍", 0), post("ghost", "🎃", 5)];
        store
            .expect_find_recent()
            .times(1)
            .returning(move |_| Ok(posts.clone()));

        let mut directory = MockDirectory::new();
        directory
            .expect_get_users()
            .times(1)
            .returning(|_, _| Ok(vec![record("user_1", Some("ada"))]));

        let service = service(store, directory, MockLimiter::new());
        let err = service.list_recent_posts().await.unwrap_err();

        match err {
            AppError::Internal(msg) => assert_eq!(msg, "author for post not found"),
            other => panic!("expected Internal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn list_fails_when_an_author_has_no_username() {
        let mut store = MockStore::new();
        let posts = vec![post("user_1", "👍", 0)];
        store
            .expect_find_recent()
            .times(1)
            .returning(move |_| Ok(posts.clone()));

        let mut directory = MockDirectory::new();
        directory
            .expect_get_users()
            .times(1)
            .returning(|_, _| Ok(vec![record("user_1", None)]));

        let service = service(store, directory, MockLimiter::new());
        let err = service.list_recent_posts().await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn list_is_idempotent_without_intervening_writes() {
        let posts = vec![post("user_1", "👍", 0), post("user_1", "🎉", 10)];
        let expected_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let mut store = MockStore::new();
        let fetched = posts.clone();
        store
            .expect_find_recent()
            .times(2)
            .returning(move |_| Ok(fetched.clone()));

        let mut directory = MockDirectory::new();
        directory
            .expect_get_users()
            .times(2)
            .returning(|_, _| Ok(vec![record("user_1", Some("ada"))]));

        let service = service(store, directory, MockLimiter::new());
        let first = service.list_recent_posts().await.expect("first list");
        let second = service.list_recent_posts().await.expect("second list");

        assert_eq!(first, second);
        let got_ids: Vec<Uuid> = first.iter().map(|e| e.post.id).collect();
        assert_eq!(got_ids, expected_ids);
    }

    #[tokio::test]
    async fn empty_store_yields_empty_list_without_directory_call() {
        let mut store = MockStore::new();
        store.expect_find_recent().times(1).returning(|_| Ok(vec![]));

        let mut directory = MockDirectory::new();
        directory.expect_get_users().never();

        let service = service(store, directory, MockLimiter::new());
        let enriched = service.list_recent_posts().await.expect("empty list");
        assert!(enriched.is_empty());
    }

    // ============================================
    // Post writer
    // ============================================

    #[tokio::test]
    async fn valid_emoji_post_is_persisted_for_the_caller() {
        let call_start = Utc::now();

        let mut store = MockStore::new();
        store
            .expect_insert()
            .withf(|author_id, content| author_id == "user_1" && content == "👍")
            .times(1)
            .returning(|author_id, content| {
                Ok(Post {
                    id: Uuid::new_v4(),
                    author_id: author_id.to_string(),
                    content: content.to_string(),
                    created_at: Utc::now(),
                })
            });

        let mut limiter = MockLimiter::new();
        limiter
            .expect_limit()
            .withf(|key| key == "user_1")
            .times(1)
            .returning(|_| Ok(LimitDecision { allowed: true }));

        let service = service(store, MockDirectory::new(), limiter);
        let post = service.create_post("user_1", "👍").await.expect("created");

        assert_eq!(post.content, "👍");
        assert_eq!(post.author_id, "user_1");
        assert!(!post.id.is_nil());
        assert!(post.created_at >= call_start);
    }

    #[tokio::test]
    async fn non_emoji_content_fails_validation_before_any_side_effect() {
        let mut store = MockStore::new();
        store.expect_insert().never();

        let mut limiter = MockLimiter::new();
        limiter.expect_limit().never();

        let service = service(store, MockDirectory::new(), limiter);
        let err = service.create_post("user_1", "hello").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn denied_admission_aborts_before_persistence() {
        let mut store = MockStore::new();
        store.expect_insert().never();

        let mut limiter = MockLimiter::new();
        limiter
            .expect_limit()
            .times(1)
            .returning(|_| Ok(LimitDecision { allowed: false }));

        let service = service(store, MockDirectory::new(), limiter);
        let err = service.create_post("user_1", "👍").await.unwrap_err();

        assert!(matches!(err, AppError::RateLimited));
    }

    #[tokio::test]
    async fn limiter_failure_is_internal_and_nothing_is_persisted() {
        let mut store = MockStore::new();
        store.expect_insert().never();

        let mut limiter = MockLimiter::new();
        limiter.expect_limit().times(1).returning(|_| {
            Err(RateLimitError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection reset",
            ))))
        });

        let service = service(store, MockDirectory::new(), limiter);
        let err = service.create_post("user_1", "👍").await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn directory_failure_propagates_as_identity_error() {
        let mut store = MockStore::new();
        let posts = vec![post("user_1", "👍", 0)];
        store
            .expect_find_recent()
            .times(1)
            .returning(move |_| Ok(posts.clone()));

        let mut directory = MockDirectory::new();
        directory.expect_get_users().times(1).returning(|_, _| {
            Err(IdentityError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "upstream down".to_string(),
            })
        });

        let service = service(store, directory, MockLimiter::new());
        let err = service.list_recent_posts().await.unwrap_err();

        assert!(matches!(err, AppError::IdentityError(_)));
    }
}
