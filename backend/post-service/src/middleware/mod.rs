/// HTTP middleware utilities for post-service
///
/// Provides Bearer token authentication and request timing. Authentication
/// validates a token when one is presented and stores the caller's identity
/// in request extensions; requests without a token pass through untouched so
/// the handlers can apply the configured anonymous-caller policy.
use crate::error::AppError;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

// =====================================================================
// Bearer token authentication
// =====================================================================

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// Extracted caller identity stored in request extensions after auth.
#[derive(Debug, Clone)]
pub struct CallerId(pub String);

/// Actix middleware that validates a Bearer token against the configured
/// HS256 secret. An invalid or malformed token is rejected; a missing token
/// is not an authentication failure here.
pub struct JwtAuthMiddleware {
    decoding_key: Rc<DecodingKey>,
}

impl JwtAuthMiddleware {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: Rc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            decoding_key: self.decoding_key.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    decoding_key: Rc<DecodingKey>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let decoding_key = self.decoding_key.clone();

        Box::pin(async move {
            if let Some(header) = req.headers().get("Authorization") {
                let header = header.to_str().map_err(|_| {
                    Error::from(AppError::Unauthorized(
                        "Invalid Authorization header".to_string(),
                    ))
                })?;

                let token = header.strip_prefix("Bearer ").ok_or_else(|| {
                    Error::from(AppError::Unauthorized(
                        "Invalid Authorization scheme".to_string(),
                    ))
                })?;

                let claims =
                    decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
                        .map_err(|_| {
                            Error::from(AppError::Unauthorized(
                                "Invalid or expired token".to_string(),
                            ))
                        })?;

                req.extensions_mut().insert(CallerId(claims.claims.sub));
            }

            service.call(req).await
        })
    }
}

impl FromRequest for CallerId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CallerId>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Caller identity missing".to_string()).into()),
        )
    }
}

// =====================================================================
// Request timing
// =====================================================================

/// Requests slower than this get a `warn` instead of a `debug` line.
const SLOW_REQUEST_MS: u128 = 500;

/// Flags slow requests. `TracingLogger` already records per-request spans;
/// this middleware only exists to make outliers stand out in the log stream
/// together with the response status they ended with.
pub struct RequestTimingMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestTimingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTimingMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTimingMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestTimingMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestTimingMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await?;
            let elapsed_ms = start.elapsed().as_millis();
            let status = res.status().as_u16();
            if elapsed_ms >= SLOW_REQUEST_MS {
                tracing::warn!(%method, %path, status, elapsed_ms, "slow request");
            } else {
                tracing::debug!(%method, %path, status, elapsed_ms, "request completed");
            }
            Ok(res)
        })
    }
}
