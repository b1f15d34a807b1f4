//! Authentication Configuration
//!
//! Builder-pattern configuration for the authentication pipeline. Loaded
//! once at process start and passed by reference into the components that
//! need it; nothing here is a mutable global.
//!
//! # Example
//!
//! ```
//! use portcullis::AuthConfig;
//! use std::time::Duration;
//!
//! let config = AuthConfig::builder()
//!     .signing_secret(AuthConfig::generate_secret(64))
//!     .token_lifetime(Duration::from_secs(24 * 60 * 60))
//!     .max_attempts(3)
//!     .build();
//!
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

/// Configuration for the authentication pipeline.
///
/// Defaults follow the service's reference policy: 5-day tokens, 5 failed
/// attempts inside a 15-minute window before lockout.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric signing secret for tokens (IA-5).
    /// Must pass [`validate`](Self::validate) before use.
    pub signing_secret: String,

    /// Token lifetime from issuance to expiry
    pub token_lifetime: Duration,

    /// Clock-skew tolerance applied when validating expiry.
    ///
    /// Defaults to 5 seconds to absorb clock drift between the issuing
    /// and verifying hosts; set to zero for strict expiry.
    pub clock_leeway: Duration,

    /// Token issuer (`iss` claim)
    pub issuer: String,

    /// Token audience (`aud` claim)
    pub audience: String,

    /// Failed attempts before lockout (AC-7)
    pub max_attempts: u32,

    /// Retention window for failed-attempt records, anchored to the
    /// record's last write
    pub attempt_window: Duration,

    /// Maximum number of attempt records held at once
    pub attempt_cache_capacity: usize,

    /// Path prefixes served without authentication
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            token_lifetime: Duration::from_secs(5 * 24 * 60 * 60), // 5 days
            clock_leeway: Duration::from_secs(5),
            issuer: "portcullis".to_string(),
            audience: "user-management".to_string(),
            max_attempts: 5,
            attempt_window: Duration::from_secs(15 * 60), // 15 minutes
            attempt_cache_capacity: 100,
            public_paths: vec![
                "/user/login".to_string(),
                "/user/register".to_string(),
                "/user/image".to_string(),
            ],
        }
    }
}

/// Minimum acceptable signing-secret length in bytes
const MIN_SECRET_LENGTH: usize = 32;

/// Substrings that disqualify a signing secret outright
const WEAK_PATTERNS: &[&str] = &[
    "secret", "password", "changeme", "default", "example", "test", "1234",
];

impl AuthConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `JWT_SECRET`: signing secret (no default; validate before use)
    /// - `JWT_LIFETIME_SECS`: token lifetime in seconds (default: 432000 = 5 days)
    /// - `JWT_LEEWAY_SECS`: expiry leeway in seconds (default: 5)
    /// - `JWT_ISSUER`: `iss` claim (default: "portcullis")
    /// - `JWT_AUDIENCE`: `aud` claim (default: "user-management")
    /// - `LOGIN_MAX_ATTEMPTS`: failures before lockout (default: 5)
    /// - `LOGIN_ATTEMPT_WINDOW_SECS`: record retention in seconds (default: 900)
    /// - `LOGIN_ATTEMPT_CACHE_CAPACITY`: max tracked principals (default: 100)
    /// - `PUBLIC_PATHS`: comma-separated path prefixes
    ///   (default: "/user/login,/user/register,/user/image")
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let signing_secret = std::env::var("JWT_SECRET").unwrap_or_default();

        let token_lifetime = std::env::var("JWT_LIFETIME_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.token_lifetime);

        let clock_leeway = std::env::var("JWT_LEEWAY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.clock_leeway);

        let issuer = std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer);
        let audience = std::env::var("JWT_AUDIENCE").unwrap_or(defaults.audience);

        let max_attempts = std::env::var("LOGIN_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_attempts);

        let attempt_window = std::env::var("LOGIN_ATTEMPT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.attempt_window);

        let attempt_cache_capacity = std::env::var("LOGIN_ATTEMPT_CACHE_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.attempt_cache_capacity);

        let public_paths = std::env::var("PUBLIC_PATHS")
            .map(|s| {
                s.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.public_paths);

        Self {
            signing_secret,
            token_lifetime,
            clock_leeway,
            issuer,
            audience,
            max_attempts,
            attempt_window,
            attempt_cache_capacity,
            public_paths,
        }
    }

    /// Create a new builder for programmatic configuration.
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Validate the configuration for use.
    ///
    /// Checks the signing secret (length, weak patterns) and rejects
    /// degenerate limiter settings. Call once at startup; the pipeline
    /// assumes a validated configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort {
                actual: self.signing_secret.len(),
                minimum: MIN_SECRET_LENGTH,
            });
        }

        let lower = self.signing_secret.to_lowercase();
        if let Some(pattern) = WEAK_PATTERNS.iter().find(|p| lower.contains(**p)) {
            return Err(ConfigError::WeakSecret {
                pattern: pattern.to_string(),
            });
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidLimit(
                "LOGIN_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if self.attempt_cache_capacity == 0 {
            return Err(ConfigError::InvalidLimit(
                "LOGIN_ATTEMPT_CACHE_CAPACITY must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Check whether a request path is served without authentication.
    ///
    /// Prefix match, so `/user/image` covers `/user/image/alice/a.jpg`.
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| path.starts_with(p))
    }

    /// Generate a cryptographically secure random signing secret.
    ///
    /// Characters are drawn from A-Z, a-z, 0-9 and punctuation; a length
    /// of 64 comfortably passes [`validate`](Self::validate).
    pub fn generate_secret(length: usize) -> String {
        use rand::Rng;

        const CHARSET: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Signing secret below the minimum length
    #[error("Signing secret is {actual} bytes, minimum is {minimum}")]
    SecretTooShort {
        /// Provided length
        actual: usize,
        /// Required minimum
        minimum: usize,
    },

    /// Signing secret contains a disqualifying pattern
    #[error("Signing secret contains weak pattern: '{pattern}'")]
    WeakSecret {
        /// The matched pattern
        pattern: String,
    },

    /// A limiter setting is degenerate
    #[error("{0}")]
    InvalidLimit(String),
}

/// Builder for [`AuthConfig`]
#[derive(Debug, Clone, Default)]
pub struct AuthConfigBuilder {
    config: AuthConfig,
}

impl AuthConfigBuilder {
    /// Set the signing secret
    pub fn signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.signing_secret = secret.into();
        self
    }

    /// Set the token lifetime
    pub fn token_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.token_lifetime = lifetime;
        self
    }

    /// Set the expiry clock leeway
    pub fn clock_leeway(mut self, leeway: Duration) -> Self {
        self.config.clock_leeway = leeway;
        self
    }

    /// Set the token issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.config.issuer = issuer.into();
        self
    }

    /// Set the token audience
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.config.audience = audience.into();
        self
    }

    /// Set the failed attempts allowed before lockout
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the attempt-record retention window
    pub fn attempt_window(mut self, window: Duration) -> Self {
        self.config.attempt_window = window;
        self
    }

    /// Set the maximum number of tracked principals
    pub fn attempt_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.attempt_cache_capacity = capacity;
        self
    }

    /// Set the unauthenticated path prefixes
    pub fn public_paths(mut self, paths: Vec<String>) -> Self {
        self.config.public_paths = paths;
        self
    }

    /// Build the configuration
    pub fn build(self) -> AuthConfig {
        self.config
    }
}
