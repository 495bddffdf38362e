/// Post handlers - HTTP endpoints for post operations
use crate::config::{AnonymousAuthorPolicy, AuthConfig};
use crate::error::{AppError, Result};
use crate::middleware::CallerId;
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    /// Emoji-only post body, 1-280 characters
    pub content: String,
}

/// List recent posts with their authors, newest first
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    tag = "posts",
    responses(
        (status = 200, description = "Recent posts enriched with author profiles", body = [crate::models::EnrichedPost]),
        (status = 500, description = "Unresolvable post author or collaborator failure")
    )
)]
pub async fn get_posts(service: web::Data<PostService>) -> Result<HttpResponse> {
    let posts = service.list_recent_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Create a new post
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "posts",
    request_body = CreatePostRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Post created", body = crate::models::Post),
        (status = 400, description = "Content is not emoji-only or has invalid length"),
        (status = 401, description = "Invalid token, or no token under the reject policy"),
        (status = 429, description = "Author exceeded the posting quota")
    )
)]
pub async fn create_post(
    service: web::Data<PostService>,
    auth: web::Data<AuthConfig>,
    caller: Option<CallerId>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let author_id = match caller {
        Some(caller) => caller.0,
        None => match auth.anonymous_author_policy {
            AnonymousAuthorPolicy::Reject => {
                return Err(AppError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            }
            // Historical behavior: attribute the post to the empty author ID
            AnonymousAuthorPolicy::AttributeToEmpty => String::new(),
        },
    };

    let post = service.create_post(&author_id, &req.content).await?;
    Ok(HttpResponse::Created().json(post))
}
