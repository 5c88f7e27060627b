// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tenure status tracking.
//!
//! A user carries one tenure status per resource kind. The engine only ever
//! moves a status between `None` and `Active`; `Pending` exists for records
//! brought in by administrative override and is held to the same invariants
//! as `Active`.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tenure of a user for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenureStatus {
    /// No unit of this kind.
    #[default]
    None,
    /// A unit is assigned but the tenure is not yet active.
    Pending,
    /// The user actively occupies a unit of this kind.
    Active,
}

impl TenureStatus {
    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }

    /// Returns true if this status implies a unit reference.
    #[must_use]
    pub const fn holds_unit(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }
}

impl FromStr for TenureStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            _ => Err(DomainError::InvalidTenureStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for TenureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary housing status of a user across both resource kinds.
///
/// Housing tenure takes precedence over lodging tenure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingStatus {
    /// Neither a housing nor a lodging unit.
    NoUnit,
    /// Housing unit assigned, tenure pending.
    UnitHolderPending,
    /// Housing unit actively held.
    UnitHolderActive,
    /// Lodging unit assigned, tenure pending.
    LodgedPending,
    /// Lodging unit actively occupied.
    LodgedActive,
}

impl HousingStatus {
    /// Derives the summary from the two tenure axes.
    #[must_use]
    pub const fn summarize(housing: TenureStatus, lodging: TenureStatus) -> Self {
        match (housing, lodging) {
            (TenureStatus::Active, _) => Self::UnitHolderActive,
            (TenureStatus::Pending, _) => Self::UnitHolderPending,
            (TenureStatus::None, TenureStatus::Active) => Self::LodgedActive,
            (TenureStatus::None, TenureStatus::Pending) => Self::LodgedPending,
            (TenureStatus::None, TenureStatus::None) => Self::NoUnit,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoUnit => "no_unit",
            Self::UnitHolderPending => "unit_holder_pending",
            Self::UnitHolderActive => "unit_holder_active",
            Self::LodgedPending => "lodged_pending",
            Self::LodgedActive => "lodged_active",
        }
    }
}

impl std::fmt::Display for HousingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
