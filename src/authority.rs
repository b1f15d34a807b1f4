//! Role and Authority Table (AC-2, AC-3)
//!
//! Static mapping from role names to fixed authority sets. Roles bundle
//! permission strings; fine-grained access checks compare individual
//! authorities (e.g. `user:delete`), never role names.
//!
//! The table is fixed for the process lifetime. Declaration order inside
//! each set is preserved so serialized authority lists are deterministic;
//! the sets contain no duplicates, so membership checks behave as set
//! semantics.
//!
//! # Usage
//!
//! ```
//! use portcullis::authority::Role;
//!
//! let role = Role::from_name("admin").unwrap();
//! assert!(role.authorities().contains(&"user:create"));
//!
//! assert!(Role::from_name("bogus").is_err());
//! ```

use std::fmt;

use crate::error::AuthError;

/// Authorities granted to every role
const USER_AUTHORITIES: &[&str] = &["user:read"];
/// Authorities for human-resources staff
const HR_AUTHORITIES: &[&str] = &["user:read", "user:update"];
/// Authorities for managers
const MANAGER_AUTHORITIES: &[&str] = &["user:read", "user:update"];
/// Authorities for administrators
const ADMIN_AUTHORITIES: &[&str] = &["user:read", "user:create", "user:update"];
/// Authorities for super administrators
const SUPER_ADMIN_AUTHORITIES: &[&str] = &["user:read", "user:create", "user:update", "user:delete"];

/// A named bundle of authorities assigned to a principal.
///
/// The variant set is fixed; each variant indexes into a `const` authority
/// table rather than carrying behavior of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Regular user
    User,
    /// Human-resources staff
    Hr,
    /// Manager
    Manager,
    /// Administrator
    Admin,
    /// Super administrator
    SuperAdmin,
}

impl Role {
    /// All roles, in privilege order
    pub const ALL: &'static [Role] = &[
        Role::User,
        Role::Hr,
        Role::Manager,
        Role::Admin,
        Role::SuperAdmin,
    ];

    /// Get the fixed authority set for this role, in declaration order.
    pub fn authorities(&self) -> &'static [&'static str] {
        match self {
            Self::User => USER_AUTHORITIES,
            Self::Hr => HR_AUTHORITIES,
            Self::Manager => MANAGER_AUTHORITIES,
            Self::Admin => ADMIN_AUTHORITIES,
            Self::SuperAdmin => SUPER_ADMIN_AUTHORITIES,
        }
    }

    /// Look up a role by name, case-insensitively.
    ///
    /// Accepts the bare variant name (`"admin"`, `"SUPER_ADMIN"`) and
    /// tolerates a `ROLE_` prefix for compatibility with data written by
    /// systems that store prefixed role names.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownRole`] when the name matches no variant.
    pub fn from_name(name: &str) -> Result<Self, AuthError> {
        let upper = name.trim().to_uppercase();
        let bare = upper.strip_prefix("ROLE_").unwrap_or(&upper);

        match bare {
            "USER" => Ok(Self::User),
            "HR" => Ok(Self::Hr),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            _ => Err(AuthError::UnknownRole {
                name: name.to_string(),
            }),
        }
    }

    /// Get the canonical role name
    pub fn name(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Hr => "HR",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Look up the authority set for a role name.
///
/// Convenience wrapper over [`Role::from_name`] + [`Role::authorities`],
/// matching the pipeline's collaborator contract.
pub fn authorities_for(role: &str) -> Result<&'static [&'static str], AuthError> {
    Ok(Role::from_name(role)?.authorities())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Role::from_name("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_name("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::from_name("Super_Admin").unwrap(), Role::SuperAdmin);
        assert_eq!(Role::from_name(" hr ").unwrap(), Role::Hr);
    }

    #[test]
    fn test_lookup_tolerates_role_prefix() {
        assert_eq!(Role::from_name("ROLE_USER").unwrap(), Role::User);
        assert_eq!(Role::from_name("role_manager").unwrap(), Role::Manager);
    }

    #[test]
    fn test_unknown_role_fails() {
        let err = Role::from_name("bogus").unwrap_err();
        assert!(matches!(err, AuthError::UnknownRole { .. }));
    }

    #[test]
    fn test_admin_authority_set() {
        let authorities = authorities_for("admin").unwrap();
        assert_eq!(authorities, &["user:read", "user:create", "user:update"]);
    }

    #[test]
    fn test_authority_sets_have_no_duplicates() {
        for role in Role::ALL {
            let authorities = role.authorities();
            let mut deduped: Vec<_> = authorities.to_vec();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), authorities.len(), "{} has duplicates", role);
        }
    }

    #[test]
    fn test_every_role_grants_read() {
        for role in Role::ALL {
            assert!(role.authorities().contains(&"user:read"));
        }
    }

    #[test]
    fn test_only_super_admin_can_delete() {
        for role in Role::ALL {
            let can_delete = role.authorities().contains(&"user:delete");
            assert_eq!(can_delete, *role == Role::SuperAdmin);
        }
    }
}
