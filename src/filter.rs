//! Authorization Filter (AC-3, IA-2)
//!
//! Per-request gate executed once per inbound request, before any
//! authorization-sensitive handler.
//!
//! [`authorize_request`] never rejects by itself: it verifies the bearer
//! token when one is present, binds the [`AuthenticatedPrincipal`] into
//! the request-scoped context (request extensions, never process-wide
//! state) on success, clears the context on failure, and passes the
//! request along either way. The final accept/reject belongs to the
//! downstream authorization layer; [`require_authentication`] is that
//! layer for routes outside the configured public set.
//!
//! # Usage
//!
//! ```ignore
//! use axum::{middleware, Router, routing::get};
//!
//! let app = Router::new()
//!     .route("/user/list", get(list_users))
//!     .layer(middleware::from_fn_with_state(config.clone(), require_authentication))
//!     .layer(middleware::from_fn_with_state(provider.clone(), authorize_request));
//! ```
//!
//! Layer ordering matters: `authorize_request` runs first (outermost) so
//! the context is populated before the guard consults it.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AuthenticatedPrincipal;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::observability::SecurityEvent;
use crate::responders;
use crate::security_event;
use crate::token::{TokenProvider, TOKEN_PREFIX};

/// Verify the bearer token, if any, and bind the authenticated principal
/// to the request-scoped context.
///
/// Algorithm, in order:
///
/// 1. Pre-flight (`OPTIONS`) requests short-circuit with 200.
/// 2. A missing or non-Bearer `Authorization` header passes the request
///    through unauthenticated.
/// 3. Otherwise the claimed subject is peeked, the token fully verified
///    against it, and, when no principal is already bound, the verified
///    subject and authorities are bound into the request extensions.
/// 4. Any validation failure clears the context (fail closed) and the
///    request continues down the chain.
pub async fn authorize_request(
    State(provider): State<Arc<TokenProvider>>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .filter(|h| h.starts_with(TOKEN_PREFIX))
        .map(|h| h[TOKEN_PREFIX.len()..].to_string());

    let Some(token) = bearer else {
        // No credential presented; downstream authorization decides.
        return next.run(request).await;
    };

    let already_bound = request.extensions().get::<AuthenticatedPrincipal>().is_some();

    let verified = provider
        .subject_of(&token)
        .ok()
        .filter(|subject| provider.is_token_valid(subject, &token))
        .and_then(|subject| {
            provider
                .verify(&token)
                .ok()
                .map(|claims| AuthenticatedPrincipal::new(subject, claims.authority_list()))
        });

    match verified {
        Some(principal) if !already_bound => {
            security_event!(
                SecurityEvent::AccessGranted,
                subject = %principal.subject,
                path = %request.uri().path(),
                "Request authenticated"
            );
            request.extensions_mut().insert(principal);
        }
        Some(_) => {
            // A principal is already bound; leave the context untouched.
        }
        None => {
            // Fail closed: a bad token clears any existing context.
            request.extensions_mut().remove::<AuthenticatedPrincipal>();
        }
    }

    next.run(request).await
}

/// Reject unauthenticated requests outside the configured public paths.
///
/// The downstream authorization layer for [`authorize_request`]'s
/// pass-through requests: public paths go through untouched; anything
/// else without a bound principal receives the 401 responder body.
pub async fn require_authentication(
    State(config): State<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if config.is_public_path(path) {
        return next.run(request).await;
    }

    if request.extensions().get::<AuthenticatedPrincipal>().is_none() {
        return responders::authentication_required(path);
    }

    next.run(request).await
}

/// Extract the bound principal in a handler.
///
/// ```ignore
/// async fn delete_user(principal: AuthenticatedPrincipal) -> Result<(), AuthError> {
///     principal.require_authority("user:delete")?;
///     // ...
/// }
/// ```
impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .ok_or(AuthError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    fn test_config() -> Arc<AuthConfig> {
        Arc::new(
            AuthConfig::builder()
                .signing_secret(AuthConfig::generate_secret(64))
                .build(),
        )
    }

    /// Handler reporting whether a principal was bound
    async fn whoami(request: Request) -> String {
        match request.extensions().get::<AuthenticatedPrincipal>() {
            Some(p) => format!("{}:{}", p.subject, p.authorities.join(",")),
            None => "anonymous".to_string(),
        }
    }

    fn app(provider: Arc<TokenProvider>) -> Router {
        Router::new()
            .route("/user/list", get(whoami))
            .layer(middleware::from_fn_with_state(provider, authorize_request))
    }

    fn guarded_app(provider: Arc<TokenProvider>, config: Arc<AuthConfig>) -> Router {
        Router::new()
            .route("/user/list", get(whoami))
            .route("/user/login", get(whoami))
            .layer(middleware::from_fn_with_state(config, require_authentication))
            .layer(middleware::from_fn_with_state(provider, authorize_request))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_header_passes_through_unauthenticated() {
        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));

        let response = app(provider)
            .oneshot(
                Request::builder()
                    .uri("/user/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_valid_token_binds_principal() {
        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));
        let token = provider
            .issue(&Principal::new("alice", vec!["user:read".to_string()]))
            .unwrap();

        let response = app(provider)
            .oneshot(
                Request::builder()
                    .uri("/user/list")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "alice:user:read");
    }

    #[tokio::test]
    async fn test_expired_token_clears_context() {
        // Zero lifetime and zero leeway: the token is already expired one
        // second after issuance.
        let config = Arc::new(
            AuthConfig::builder()
                .signing_secret(AuthConfig::generate_secret(64))
                .token_lifetime(std::time::Duration::ZERO)
                .clock_leeway(std::time::Duration::ZERO)
                .build(),
        );
        let provider = Arc::new(TokenProvider::new(&config));
        let token = provider
            .issue(&Principal::new("alice", vec!["user:read".to_string()]))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));

        let response = app(provider)
            .oneshot(
                Request::builder()
                    .uri("/user/list")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // The filter passes through unauthenticated; rejection is the
        // downstream layer's decision.
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_passes_through() {
        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));

        let response = app(provider)
            .oneshot(
                Request::builder()
                    .uri("/user/list")
                    .header(AUTHORIZATION, "Basic YWxpY2U6czNjcmV0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_string(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_garbage_token_passes_through_unauthenticated() {
        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));

        let response = app(provider)
            .oneshot(
                Request::builder()
                    .uri("/user/list")
                    .header(AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_options_short_circuits() {
        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));

        let response = app(provider)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/user/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // The handler never ran
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_guard_rejects_unauthenticated_protected_request() {
        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));

        let response = guarded_app(provider, config)
            .oneshot(
                Request::builder()
                    .uri("/user/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["statusText"], "UNAUTHORIZED");
        assert_eq!(
            body["message"],
            responders::AUTHENTICATION_REQUIRED_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_guard_allows_public_path() {
        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));

        let response = guarded_app(provider, config)
            .oneshot(
                Request::builder()
                    .uri("/user/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_guard_allows_authenticated_request() {
        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));
        let token = provider
            .issue(&Principal::new("alice", vec!["user:read".to_string()]))
            .unwrap();

        let response = guarded_app(provider, config)
            .oneshot(
                Request::builder()
                    .uri("/user/list")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "alice:user:read");
    }

    #[tokio::test]
    async fn test_extractor_rejects_missing_principal() {
        async fn secure(principal: AuthenticatedPrincipal) -> String {
            principal.subject
        }

        let config = test_config();
        let provider = Arc::new(TokenProvider::new(&config));
        let app = Router::new()
            .route("/secure", get(secure))
            .layer(middleware::from_fn_with_state(provider, authorize_request));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/secure")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
