//! Token Provider (IA-2, IA-5)
//!
//! Issues and verifies compact signed tokens binding a principal to its
//! authorities and an expiry. Tokens are HS512-signed JWTs; the signing
//! secret is explicit configuration handed to the constructor once at
//! startup, never a mutable global.
//!
//! Verification is stateless: every request re-verifies the presented
//! token independently, so the service scales horizontally at the cost of
//! one signature check per request. There is no revocation list; a token
//! dies only by expiry.
//!
//! # Usage
//!
//! ```
//! use portcullis::{AuthConfig, Principal, TokenProvider};
//!
//! let config = AuthConfig::builder()
//!     .signing_secret(AuthConfig::generate_secret(64))
//!     .build();
//! let provider = TokenProvider::new(&config);
//!
//! let principal = Principal::new("alice", vec!["user:read".to_string()]);
//! let token = provider.issue(&principal).unwrap();
//!
//! let claims = provider.verify(&token).unwrap();
//! assert_eq!(claims.sub, "alice");
//! assert!(provider.is_token_valid("alice", &token));
//! assert!(!provider.is_token_valid("mallory", &token));
//! ```

use axum::http::{HeaderName, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::auth::Principal;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::observability::SecurityEvent;
use crate::security_event;

/// Scheme prefix expected on the `Authorization` header
pub const TOKEN_PREFIX: &str = "Bearer ";

/// Custom response header carrying a freshly issued token after login
pub const JWT_TOKEN_HEADER: &str = "Jwt-Token";

/// Delimiter for the flattened authorities claim
const AUTHORITIES_DELIMITER: char = ',';

/// Claims carried by an issued token.
///
/// Authorities are flattened into a single delimited string so the claim
/// survives any JSON round-trip as one opaque value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (unique username)
    pub sub: String,
    /// Delimited authority list
    pub authorities: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

impl Claims {
    /// Split the flattened authorities claim back into a list.
    pub fn authority_list(&self) -> Vec<String> {
        if self.authorities.is_empty() {
            return Vec::new();
        }
        self.authorities
            .split(AUTHORITIES_DELIMITER)
            .map(|a| a.to_string())
            .collect()
    }
}

/// Issues and verifies signed tokens.
///
/// Construct once at startup from a validated [`AuthConfig`] and share
/// behind an `Arc`; all methods take `&self` and are safe for concurrent
/// use.
pub struct TokenProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime: chrono::Duration,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("signing_key", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenProvider {
    /// Create a provider from configuration.
    ///
    /// The expiry check applies `config.clock_leeway` as the only
    /// tolerance; issuer and audience are validated on every decode.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = config.clock_leeway.as_secs();
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);

        Self {
            encoding: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            lifetime: chrono::Duration::from_std(config.token_lifetime)
                .unwrap_or_else(|_| chrono::Duration::days(5)),
        }
    }

    /// Issue a signed token for a principal.
    ///
    /// Encodes subject and authorities with `iat` = now and
    /// `exp` = now + configured lifetime.
    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.lifetime;

        let claims = Claims {
            sub: principal.subject.clone(),
            authorities: principal
                .authorities
                .join(&AUTHORITIES_DELIMITER.to_string()),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)
            .map_err(|e| AuthError::token_creation(e.to_string()))?;

        security_event!(
            SecurityEvent::TokenIssued,
            subject = %principal.subject,
            expires_at = claims.exp,
            "Issued token"
        );

        Ok(token)
    }

    /// Verify a token's signature, structure, issuer, audience and expiry.
    ///
    /// # Errors
    ///
    /// Any failure (signature mismatch, malformed structure, expiry)
    /// returns [`AuthError::InvalidToken`]. Clients see one uniform
    /// message; the distinguishing cause goes to the audit log only.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                security_event!(
                    SecurityEvent::TokenRejected,
                    reason = %e,
                    "Token verification failed"
                );
                AuthError::invalid_token(e.to_string())
            })
    }

    /// Extract the claimed subject without validating the token.
    ///
    /// Cheap peek used to look up the principal before the full
    /// [`is_token_valid`](Self::is_token_valid) check. MUST NOT be
    /// trusted for authorization decisions on its own.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when the token is not three
    /// base64url segments of JSON carrying a string `sub` claim.
    pub fn subject_of(&self, token: &str) -> Result<String, AuthError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(AuthError::invalid_token("malformed token structure")),
        };

        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| AuthError::invalid_token(format!("payload not base64url: {}", e)))?;

        let claims: serde_json::Value = serde_json::from_slice(&decoded)
            .map_err(|e| AuthError::invalid_token(format!("payload not JSON: {}", e)))?;

        claims
            .get("sub")
            .and_then(|s| s.as_str())
            .map(String::from)
            .ok_or_else(|| AuthError::invalid_token("missing sub claim"))
    }

    /// Check that a token verifies and is bound to the supplied subject.
    ///
    /// True iff [`verify`](Self::verify) succeeds and the embedded
    /// subject equals `subject`. The comparison is constant-time; a token
    /// presented for a different identity is rejected even when otherwise
    /// valid.
    pub fn is_token_valid(&self, subject: &str, token: &str) -> bool {
        if subject.is_empty() {
            return false;
        }
        match self.verify(token) {
            Ok(claims) => claims.sub.as_bytes().ct_eq(subject.as_bytes()).into(),
            Err(_) => false,
        }
    }
}

/// Build the custom response header pair carrying a freshly issued token.
pub fn token_response_header(token: &str) -> Result<(HeaderName, HeaderValue), AuthError> {
    let value = HeaderValue::from_str(token)
        .map_err(|e| AuthError::token_creation(format!("token not header-safe: {}", e)))?;
    Ok((HeaderName::from_static("jwt-token"), value))
}
