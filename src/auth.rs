//! Principal Model and Login Orchestration (IA-2, AC-7)
//!
//! The pipeline's view of an account is a read-only projection owned by
//! the persistence layer; lookup, persistence and credential verification
//! are collaborator traits supplied by the application. This module wires
//! those collaborators to the attempt limiter and the token provider into
//! the full login flow:
//!
//! 1. Look up the principal; unknown subjects count as a failed attempt.
//! 2. Lock bookkeeping: an unlocked account whose limiter has tripped is
//!    locked and persisted; an already-locked account has its stale
//!    counters evicted.
//! 3. Locked or inactive accounts are rejected before any credential
//!    check.
//! 4. Credentials go through the opaque verifier; a mismatch records a
//!    failure.
//! 5. Success evicts the counters and issues a token.
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::auth::Authenticator;
//!
//! let authenticator = Authenticator::new(user_repo, password_verifier, cache, provider);
//! let outcome = authenticator.login("alice", "s3cret")?;
//! let (name, value) = outcome.token_header()?;
//! // attach header to the login response
//! ```

use std::sync::Arc;

use crate::authority::Role;
use crate::error::AuthError;
use crate::login::LoginAttemptCache;
use crate::observability::SecurityEvent;
use crate::security_event;
use crate::token::{token_response_header, TokenProvider};

/// Read-only projection of an account, owned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Unique username
    pub subject: String,
    /// Granted authorities, in declaration order, without duplicates
    pub authorities: Vec<String>,
    /// Locked after repeated failed attempts or by an administrator
    pub locked: bool,
    /// Inactive accounts cannot authenticate
    pub active: bool,
}

impl Principal {
    /// Create an active, unlocked principal.
    pub fn new(subject: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            authorities,
            locked: false,
            active: true,
        }
    }

    /// Create an active, unlocked principal carrying the fixed authority
    /// set of a role.
    pub fn with_role(subject: impl Into<String>, role: Role) -> Self {
        Self::new(
            subject,
            role.authorities().iter().map(|a| a.to_string()).collect(),
        )
    }
}

/// The authenticated identity bound to a request: the verified subject and
/// its authorities, nothing else.
///
/// Bound into the request-scoped context by the authorization filter and
/// read back by handlers; never stored process-wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    /// Verified subject
    pub subject: String,
    /// Authorities carried by the verified token
    pub authorities: Vec<String>,
}

impl AuthenticatedPrincipal {
    /// Create an authenticated principal.
    pub fn new(subject: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            authorities,
        }
    }

    /// Check a single authority.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    /// Check any of several authorities.
    pub fn has_any_authority(&self, authorities: &[&str]) -> bool {
        authorities.iter().any(|a| self.has_authority(a))
    }

    /// Require an authority, failing with
    /// [`AuthError::InsufficientAuthority`] when absent.
    pub fn require_authority(&self, authority: &str) -> Result<(), AuthError> {
        if self.has_authority(authority) {
            Ok(())
        } else {
            security_event!(
                SecurityEvent::AccessDenied,
                subject = %self.subject,
                authority = %authority,
                "Missing required authority"
            );
            Err(AuthError::InsufficientAuthority)
        }
    }
}

impl From<&Principal> for AuthenticatedPrincipal {
    fn from(principal: &Principal) -> Self {
        Self {
            subject: principal.subject.clone(),
            authorities: principal.authorities.clone(),
        }
    }
}

/// Principal lookup and persistence, owned by the application.
pub trait PrincipalSource: Send + Sync {
    /// Find a principal by its unique subject.
    fn find_by_subject(&self, subject: &str) -> Option<Principal>;

    /// Persist a changed projection (lock-state updates).
    fn persist(&self, principal: &Principal);
}

/// Opaque credential verification, owned by the application.
///
/// Wraps whatever one-way hash comparison the application uses; the
/// pipeline never sees password material beyond this call.
pub trait CredentialVerifier: Send + Sync {
    /// True iff `plaintext` matches the stored credential for `subject`.
    fn verify(&self, subject: &str, plaintext: &str) -> bool;
}

/// Successful login: the authenticated principal and its freshly issued
/// token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The authenticated identity
    pub principal: AuthenticatedPrincipal,
    /// Signed compact token to hand back to the client
    pub token: String,
}

impl LoginOutcome {
    /// Build the custom response header pair carrying the token.
    pub fn token_header(
        &self,
    ) -> Result<(axum::http::HeaderName, axum::http::HeaderValue), AuthError> {
        token_response_header(&self.token)
    }
}

/// Orchestrates login across the collaborators, the attempt limiter and
/// the token provider.
///
/// Holds no per-request state; safe to share behind an `Arc` and call
/// concurrently.
pub struct Authenticator<S, V> {
    source: S,
    verifier: V,
    attempts: LoginAttemptCache,
    tokens: Arc<TokenProvider>,
}

impl<S: PrincipalSource, V: CredentialVerifier> Authenticator<S, V> {
    /// Create an authenticator.
    pub fn new(
        source: S,
        verifier: V,
        attempts: LoginAttemptCache,
        tokens: Arc<TokenProvider>,
    ) -> Self {
        Self {
            source,
            verifier,
            attempts,
            tokens,
        }
    }

    /// The attempt limiter, shared with anything else that records
    /// failures.
    pub fn attempts(&self) -> &LoginAttemptCache {
        &self.attempts
    }

    /// Authenticate credentials and issue a token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] for an unknown subject or a
    ///   credential mismatch (indistinguishable to the caller)
    /// - [`AuthError::AccountLocked`] / [`AuthError::AccountDisabled`]
    ///   before any credential check
    /// - [`AuthError::TokenCreation`] if signing fails
    pub fn login(&self, subject: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(mut principal) = self.source.find_by_subject(subject) else {
            self.attempts.record_failure(subject);
            security_event!(
                SecurityEvent::AuthenticationFailure,
                subject = %subject,
                reason = "unknown_subject",
                "Login failed"
            );
            return Err(AuthError::InvalidCredentials);
        };

        self.refresh_lock_state(&mut principal);

        if principal.locked {
            security_event!(
                SecurityEvent::AuthenticationFailure,
                subject = %subject,
                reason = "account_locked",
                "Login refused"
            );
            return Err(AuthError::AccountLocked);
        }

        if !principal.active {
            security_event!(
                SecurityEvent::AuthenticationFailure,
                subject = %subject,
                reason = "account_disabled",
                "Login refused"
            );
            return Err(AuthError::AccountDisabled);
        }

        if !self.verifier.verify(subject, password) {
            let failed_count = self.attempts.record_failure(subject);
            security_event!(
                SecurityEvent::AuthenticationFailure,
                subject = %subject,
                failed_count = failed_count,
                reason = "bad_credentials",
                "Login failed"
            );
            return Err(AuthError::InvalidCredentials);
        }

        self.attempts.evict(subject);
        let token = self.tokens.issue(&principal)?;

        security_event!(
            SecurityEvent::AuthenticationSuccess,
            subject = %subject,
            "Login successful"
        );

        Ok(LoginOutcome {
            principal: AuthenticatedPrincipal::from(&principal),
            token,
        })
    }

    /// Lock bookkeeping before the credential check.
    ///
    /// Unlocked account whose limiter has tripped: lock it and persist.
    /// Already-locked account: evict counters so an administrative unlock
    /// starts from a clean state.
    fn refresh_lock_state(&self, principal: &mut Principal) {
        if !principal.locked {
            if self.attempts.has_exceeded_max_attempts(&principal.subject) {
                principal.locked = true;
                self.source.persist(principal);
                security_event!(
                    SecurityEvent::AccountLocked,
                    subject = %principal.subject,
                    "Account locked after repeated failed logins"
                );
            }
        } else {
            self.attempts.evict(&principal.subject);
        }
    }
}
