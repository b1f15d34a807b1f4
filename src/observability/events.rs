//! Security Event Logging
//!
//! Provides structured logging for security-relevant events as required by
//! NIST SP 800-53 AU-2 (Audit Events), AU-3 (Content of Audit Records).
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::observability::SecurityEvent;
//! use portcullis::security_event;
//!
//! security_event!(
//!     SecurityEvent::AuthenticationSuccess,
//!     subject = %principal.subject,
//!     "Login successful"
//! );
//!
//! security_event!(
//!     SecurityEvent::TokenRejected,
//!     reason = "expired_signature",
//!     "Token verification failed"
//! );
//! ```

use std::fmt;

/// Security event categories for audit logging.
///
/// These categories align with NIST SP 800-53 AU-2 auditable events,
/// restricted to what the authentication pipeline itself emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    // Authentication events
    /// Credentials accepted and a token issued
    AuthenticationSuccess,
    /// Failed login attempt
    AuthenticationFailure,
    /// A signed token was issued
    TokenIssued,
    /// A presented token failed verification
    TokenRejected,

    // Authorization events
    /// Request bound to an authenticated principal
    AccessGranted,
    /// Request lacked authentication or a required authority
    AccessDenied,

    // Account security events
    /// Account locked after repeated failed attempts
    AccountLocked,
    /// Account lock cleared
    AccountUnlocked,
}

impl SecurityEvent {
    /// Get the event category for filtering/grouping
    pub fn category(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess
            | Self::AuthenticationFailure
            | Self::TokenIssued
            | Self::TokenRejected => "authentication",

            Self::AccessGranted | Self::AccessDenied => "authorization",

            Self::AccountLocked | Self::AccountUnlocked => "security",
        }
    }

    /// Get the severity level for the event
    pub fn severity(&self) -> Severity {
        match self {
            // High - security-relevant failures
            Self::AuthenticationFailure
            | Self::TokenRejected
            | Self::AccessDenied
            | Self::AccountLocked => Severity::High,

            // Medium - important state changes
            Self::AuthenticationSuccess | Self::AccountUnlocked => Severity::Medium,

            // Low - routine operations
            Self::TokenIssued | Self::AccessGranted => Severity::Low,
        }
    }

    /// Get the event name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess => "authentication_success",
            Self::AuthenticationFailure => "authentication_failure",
            Self::TokenIssued => "token_issued",
            Self::TokenRejected => "token_rejected",
            Self::AccessGranted => "access_granted",
            Self::AccessDenied => "access_denied",
            Self::AccountLocked => "account_locked",
            Self::AccountUnlocked => "account_unlocked",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine operations
    Low,
    /// Important state changes
    Medium,
    /// Security-relevant failures
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Log a security event with structured fields.
///
/// The macro automatically includes:
/// - `security_event`: Event type name
/// - `category`: Event category
/// - `severity`: Event severity level
///
/// # Examples
///
/// ```ignore
/// security_event!(
///     SecurityEvent::AccountLocked,
///     subject = %subject,
///     failed_count = failed_count,
///     "Account locked after failed login attempts"
/// );
/// ```
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        let severity = event.severity();
        let category = event.category();
        let event_name = event.name();

        match severity {
            $crate::observability::Severity::High => {
                ::tracing::warn!(
                    security_event = event_name,
                    category = category,
                    severity = "high",
                    $($field)*
                );
            }
            $crate::observability::Severity::Medium => {
                ::tracing::info!(
                    security_event = event_name,
                    category = category,
                    severity = "medium",
                    $($field)*
                );
            }
            $crate::observability::Severity::Low => {
                ::tracing::debug!(
                    security_event = event_name,
                    category = category,
                    severity = "low",
                    $($field)*
                );
            }
        }
    }};
}

pub use security_event;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_categories() {
        assert_eq!(
            SecurityEvent::AuthenticationSuccess.category(),
            "authentication"
        );
        assert_eq!(SecurityEvent::TokenRejected.category(), "authentication");
        assert_eq!(SecurityEvent::AccessDenied.category(), "authorization");
        assert_eq!(SecurityEvent::AccountLocked.category(), "security");
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(
            SecurityEvent::AuthenticationFailure.severity(),
            Severity::High
        );
        assert_eq!(
            SecurityEvent::AuthenticationSuccess.severity(),
            Severity::Medium
        );
        assert_eq!(SecurityEvent::TokenIssued.severity(), Severity::Low);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_event_name() {
        assert_eq!(SecurityEvent::TokenRejected.name(), "token_rejected");
        assert_eq!(SecurityEvent::AccountUnlocked.name(), "account_unlocked");
    }
}
