//! Requester identity passed explicitly to every core operation.
//!
//! The upstream auth layer resolves the caller's ID and role; the booking
//! core never reads ambient request state. [`Identity`] is the only
//! authorization input the service layer accepts.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UserId;

/// Role assigned to a requester by the upstream auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular user: may only touch their own bookings.
    User,
    /// Administrator: may read, update, or delete any booking.
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

/// Authenticated requester: user ID plus role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// The requester's user ID.
    pub user_id: UserId,
    /// The requester's role.
    pub role: Role,
}

impl Identity {
    /// Creates a new `Identity`.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns `true` if the requester holds the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Returns `true` if the requester owns the given user's resources
    /// or holds the admin role.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.user_id == owner || self.is_admin()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn admin_can_access_any_owner() {
        let admin = Identity::new(UserId::new(), Role::Admin);
        assert!(admin.can_access(UserId::new()));
    }

    #[test]
    fn user_can_access_only_self() {
        let me = UserId::new();
        let identity = Identity::new(me, Role::User);
        assert!(identity.can_access(me));
        assert!(!identity.can_access(UserId::new()));
    }
}
