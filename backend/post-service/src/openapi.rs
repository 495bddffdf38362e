/// OpenAPI documentation for Chirp Post Service
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::handlers::posts::CreatePostRequest;
use crate::models::{AuthorProjection, EnrichedPost, Post};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chirp Post Service API",
        version = "1.0.0",
        description = "Posts service for the Chirp platform. Lists recent posts enriched with author profiles from the identity directory and creates emoji-only posts subject to a per-author rate limit.",
        contact(
            name = "Chirp Team",
            email = "team@chirp.dev"
        ),
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8082", description = "Development server"),
    ),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "posts", description = "Post listing and creation"),
    ),
    paths(
        handlers::posts::get_posts,
        handlers::posts::create_post,
    ),
    components(
        schemas(Post, AuthorProjection, EnrichedPost, CreatePostRequest)
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token from the identity provider"))
                        .build(),
                ),
            )
        }
    }
}
