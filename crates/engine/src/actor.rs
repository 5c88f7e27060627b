// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The authenticated caller, as resolved by the layer in front of the engine.

use crate::error::EngineError;
use quarters_domain::{Role, User, UserId};

/// A caller whose identity and role were established by the authentication
/// layer.
///
/// The engine trusts the identity but not the role: the claimed role must
/// match the user's stored role at the time of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The acting user.
    pub user_id: UserId,
    /// The role the caller claims to act in.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Builds an actor from raw identity claims.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Authorization` if the role is not recognized.
    pub fn from_claims(user_id: i64, role: &str) -> Result<Self, EngineError> {
        let role: Role = role.parse().map_err(|_| {
            EngineError::unauthorized("authenticate", format!("unrecognized role '{role}'"))
        })?;
        Ok(Self::new(UserId::new(user_id), role))
    }

    /// Checks the claim against the stored user and returns the user.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Authorization` if the user is deactivated or
    /// the stored role differs from the claimed one.
    pub(crate) fn verify(&self, stored: User) -> Result<User, EngineError> {
        if !stored.is_active {
            return Err(EngineError::unauthorized(
                "authenticate",
                format!("user {} is deactivated", self.user_id),
            ));
        }
        if stored.role == self.role {
            Ok(stored)
        } else {
            Err(EngineError::unauthorized(
                "authenticate",
                format!(
                    "user {} claims role '{}' but holds '{}'",
                    self.user_id, self.role, stored.role
                ),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quarters_domain::TenureStatus;

    fn stored(role: Role, is_active: bool) -> User {
        User {
            id: UserId::new(7),
            display_name: String::from("Marta"),
            role,
            district: None,
            housing_status: TenureStatus::None,
            lodging_status: TenureStatus::None,
            assigned_housing_unit: None,
            assigned_lodging_unit: None,
            is_active,
            version: 1,
        }
    }

    #[test]
    fn test_from_claims_parses_role() {
        let actor = AuthenticatedActor::from_claims(7, "district_chief").unwrap();
        assert_eq!(actor.user_id, UserId::new(7));
        assert_eq!(actor.role, Role::DistrictChief);
    }

    #[test]
    fn test_unknown_role_is_a_hard_denial() {
        assert!(matches!(
            AuthenticatedActor::from_claims(7, "superuser"),
            Err(EngineError::Authorization { .. })
        ));
    }

    #[test]
    fn test_verify_accepts_matching_active_user() {
        let actor = AuthenticatedActor::new(UserId::new(7), Role::Admin);
        let user = actor.verify(stored(Role::Admin, true)).unwrap();
        assert_eq!(user.id, UserId::new(7));
    }

    #[test]
    fn test_verify_rejects_role_mismatch_and_deactivated_user() {
        let actor = AuthenticatedActor::new(UserId::new(7), Role::Admin);
        assert!(matches!(
            actor.verify(stored(Role::Applicant, true)),
            Err(EngineError::Authorization { .. })
        ));
        assert!(matches!(
            actor.verify(stored(Role::Admin, false)),
            Err(EngineError::Authorization { .. })
        ));
    }
}
