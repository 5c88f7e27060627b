// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::role::Role;
use crate::status::{HousingStatus, TenureStatus};
use crate::unit::{District, UnitId, UnitKind};
use serde::{Deserialize, Serialize};

/// Identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person known to the system.
///
/// Users are created by registration and never deleted. The unit references
/// and tenure statuses are written only by the occupancy ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier.
    pub id: UserId,
    /// Name shown in documents and reports.
    pub display_name: String,
    /// Current role.
    pub role: Role,
    /// District, mandatory for inspectors and district chiefs.
    pub district: Option<District>,
    /// Tenure of a housing unit.
    pub housing_status: TenureStatus,
    /// Tenure of a lodging unit.
    pub lodging_status: TenureStatus,
    /// The housing unit held, if any.
    pub assigned_housing_unit: Option<UnitId>,
    /// The lodging unit occupied, if any.
    pub assigned_lodging_unit: Option<UnitId>,
    /// False once deactivated.
    pub is_active: bool,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl User {
    /// The unit reference for one resource kind.
    #[must_use]
    pub const fn assigned_unit(&self, kind: UnitKind) -> Option<UnitId> {
        match kind {
            UnitKind::Housing => self.assigned_housing_unit,
            UnitKind::Lodging => self.assigned_lodging_unit,
        }
    }

    /// The tenure status for one resource kind.
    #[must_use]
    pub const fn status(&self, kind: UnitKind) -> TenureStatus {
        match kind {
            UnitKind::Housing => self.housing_status,
            UnitKind::Lodging => self.lodging_status,
        }
    }

    /// Sets both the unit reference and status for one kind.
    pub(crate) const fn set_tenure(
        &mut self,
        kind: UnitKind,
        unit: Option<UnitId>,
        status: TenureStatus,
    ) {
        match kind {
            UnitKind::Housing => {
                self.assigned_housing_unit = unit;
                self.housing_status = status;
            }
            UnitKind::Lodging => {
                self.assigned_lodging_unit = unit;
                self.lodging_status = status;
            }
        }
    }

    /// Records an active tenure of `unit`.
    pub const fn begin_tenure(&mut self, kind: UnitKind, unit: UnitId) {
        self.set_tenure(kind, Some(unit), TenureStatus::Active);
        self.rederive_occupant_role();
    }

    /// Clears the tenure for one kind.
    pub const fn end_tenure(&mut self, kind: UnitKind) {
        self.set_tenure(kind, None, TenureStatus::None);
        self.rederive_occupant_role();
    }

    /// The five-valued summary status, housing taking precedence.
    #[must_use]
    pub const fn summary_status(&self) -> HousingStatus {
        HousingStatus::summarize(self.housing_status, self.lodging_status)
    }

    /// Re-derives an occupant-class role from the tenure statuses.
    ///
    /// Staff roles are left untouched.
    pub const fn rederive_occupant_role(&mut self) {
        if !self.role.is_occupant_class() {
            return;
        }
        self.role = match (self.housing_status, self.lodging_status) {
            (TenureStatus::Active, _) => Role::UnitHolder,
            (_, TenureStatus::Active) => Role::LodgedOccupant,
            _ => Role::Applicant,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant() -> User {
        User {
            id: UserId::new(1),
            display_name: String::from("U1"),
            role: Role::Applicant,
            district: None,
            housing_status: TenureStatus::None,
            lodging_status: TenureStatus::None,
            assigned_housing_unit: None,
            assigned_lodging_unit: None,
            is_active: true,
            version: 1,
        }
    }

    #[test]
    fn test_begin_tenure_promotes_applicant() {
        let mut user = applicant();
        user.begin_tenure(UnitKind::Housing, UnitId::new(10));

        assert_eq!(user.role, Role::UnitHolder);
        assert_eq!(user.assigned_unit(UnitKind::Housing), Some(UnitId::new(10)));
        assert_eq!(user.summary_status(), HousingStatus::UnitHolderActive);
    }

    #[test]
    fn test_ending_housing_falls_back_to_lodging_role() {
        let mut user = applicant();
        user.begin_tenure(UnitKind::Lodging, UnitId::new(20));
        user.begin_tenure(UnitKind::Housing, UnitId::new(10));
        assert_eq!(user.role, Role::UnitHolder);

        user.end_tenure(UnitKind::Housing);

        assert_eq!(user.role, Role::LodgedOccupant);
        assert_eq!(user.summary_status(), HousingStatus::LodgedActive);
    }

    #[test]
    fn test_staff_role_is_not_rederived() {
        let mut user = applicant();
        user.role = Role::Inspector;
        user.begin_tenure(UnitKind::Housing, UnitId::new(10));

        assert_eq!(user.role, Role::Inspector);
        assert_eq!(user.housing_status, TenureStatus::Active);
    }
}
