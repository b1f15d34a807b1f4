//! # Portcullis
//!
//! Stateless JWT authentication and authorization pipeline for Axum
//! user-management APIs.
//!
//! This crate provides the security core of a user-management REST
//! service: token lifecycle, authority derivation from roles, the
//! per-request authorization filter, and the login-attempt limiter that
//! guards against brute force. Routing, persistence, email and password
//! hashing stay with the application and plug in through small
//! collaborator traits.
//!
//! ## Features
//!
//! - **Role/Authority Table** (AC-2): fixed role → authority-set mapping
//! - **Login Attempt Limiter** (AC-7): bounded, time-expiring failure
//!   counters per principal
//! - **Token Provider** (IA-2): HS512-signed JWTs binding subject,
//!   authorities and expiry
//! - **Authorization Filter** (AC-3): per-request bearer verification into
//!   a request-scoped principal context
//! - **Access-Denial Responders** (SI-11): fixed structured 401/403 bodies
//! - **Security Event Logging** (AU-2, AU-3): structured audit events via
//!   `tracing`
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Router};
//! use portcullis::{
//!     filter::{authorize_request, require_authentication},
//!     observability::{self, ObservabilityConfig},
//!     AuthConfig, TokenProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     observability::init(ObservabilityConfig::from_env())?;
//!
//!     let config = Arc::new(AuthConfig::from_env());
//!     config.validate()?;
//!     let provider = Arc::new(TokenProvider::new(&config));
//!
//!     let app: Router = Router::new()
//!         .route("/user/list", get(list_users))
//!         .layer(middleware::from_fn_with_state(config.clone(), require_authentication))
//!         .layer(middleware::from_fn_with_state(provider.clone(), authorize_request));
//!
//!     // Serve...
//!     Ok(())
//! }
//! ```
//!
//! ## Statelessness
//!
//! Every request re-verifies its token independently; the only
//! process-wide shared state is the login-attempt cache and the read-only
//! signing configuration. Instances scale horizontally behind a load
//! balancer with no session affinity.

pub mod auth;
pub mod authority;
pub mod config;
pub mod error;
pub mod filter;
pub mod login;
pub mod observability;
pub mod responders;
pub mod token;

// Re-exports
pub use auth::{
    AuthenticatedPrincipal, Authenticator, CredentialVerifier, LoginOutcome, Principal,
    PrincipalSource,
};
pub use authority::{authorities_for, Role};
pub use config::{AuthConfig, AuthConfigBuilder, ConfigError};
pub use error::{AuthError, TOKEN_CANNOT_BE_VERIFIED};
pub use login::{AttemptPolicy, LoginAttemptCache};
pub use responders::{ResponseBody, ACCESS_DENIED_MESSAGE, AUTHENTICATION_REQUIRED_MESSAGE};
pub use token::{Claims, TokenProvider, JWT_TOKEN_HEADER, TOKEN_PREFIX};
