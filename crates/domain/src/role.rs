// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The closed set of institutional roles.
///
/// Every module consumes this enumeration; role strings are parsed exactly
/// once, at the boundary, and never compared ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Personnel who applied for, but do not hold, a unit.
    Applicant,
    /// Holder of a housing unit.
    UnitHolder,
    /// Occupant of a lodging unit.
    LodgedOccupant,
    /// Inspects units within an assigned district.
    Inspector,
    /// Supervises a district.
    DistrictChief,
    /// Housing administration staff.
    Admin,
    /// Top-level administration; closes assignment and vacating acts.
    AdminGeneral,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Applicant,
        Self::UnitHolder,
        Self::LodgedOccupant,
        Self::Inspector,
        Self::DistrictChief,
        Self::Admin,
        Self::AdminGeneral,
    ];

    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::UnitHolder => "unit_holder",
            Self::LodgedOccupant => "lodged_occupant",
            Self::Inspector => "inspector",
            Self::DistrictChief => "district_chief",
            Self::Admin => "admin",
            Self::AdminGeneral => "admin_general",
        }
    }

    /// Occupant-class roles are derived from a user's tenure; staff roles
    /// are never changed by occupancy.
    #[must_use]
    pub const fn is_occupant_class(&self) -> bool {
        matches!(
            self,
            Self::Applicant | Self::UnitHolder | Self::LodgedOccupant
        )
    }

    /// Roles that must carry a district assignment.
    #[must_use]
    pub const fn requires_district(&self) -> bool {
        matches!(self, Self::Inspector | Self::DistrictChief)
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::InvalidRole(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
