// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::occupancy::OccupancyRecord;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of a housing or lodging unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(i64);

impl UnitId {
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

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two resource kinds tracked by the occupancy ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A fiscal housing unit.
    Housing,
    /// A naval lodging unit.
    Lodging,
}

impl UnitKind {
    /// Both kinds.
    pub const ALL: [Self; 2] = [Self::Housing, Self::Lodging];

    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Housing => "housing",
            Self::Lodging => "lodging",
        }
    }
}

impl FromStr for UnitKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "housing" => Ok(Self::Housing),
            "lodging" => Ok(Self::Lodging),
            _ => Err(DomainError::InvalidUnitKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operational state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalState {
    /// Free to be assigned.
    Available,
    /// Has a current occupancy.
    Occupied,
    /// Held back, but still assignable.
    Reserved,
    /// Earmarked for an upcoming assignment.
    FutureAssignment,
    /// Under maintenance; not assignable.
    Maintenance,
    /// Permanently out of service.
    Decommissioned,
}

impl OperationalState {
    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::FutureAssignment => "future_assignment",
            Self::Maintenance => "maintenance",
            Self::Decommissioned => "decommissioned",
        }
    }

    /// Returns true if a unit in this state may receive a new occupant.
    ///
    /// `Occupied` is accepted here because displacement is decided by the
    /// ledger, not by the operational state.
    #[must_use]
    pub const fn accepts_assignment(&self) -> bool {
        matches!(
            self,
            Self::Available | Self::Occupied | Self::Reserved | Self::FutureAssignment
        )
    }
}

impl FromStr for OperationalState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "reserved" => Ok(Self::Reserved),
            "future_assignment" => Ok(Self::FutureAssignment),
            "maintenance" => Ok(Self::Maintenance),
            "decommissioned" => Ok(Self::Decommissioned),
            _ => Err(DomainError::InvalidOperationalState(s.to_string())),
        }
    }
}

impl std::fmt::Display for OperationalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Administrative district (barrio).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct District(String);

impl District {
    /// Creates a district, normalizing surrounding whitespace.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_string())
    }

    /// Returns the district name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for District {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A housing or lodging unit with its occupancy record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Housing or lodging.
    pub kind: UnitKind,
    /// Unique unit code, e.g. `K01`.
    pub code: String,
    /// District the unit belongs to.
    pub district: District,
    /// Free-text description.
    pub description: String,
    /// Operational state. Only the ledger moves it into or out of `Occupied`.
    pub operational_state: OperationalState,
    /// Current occupancy and closed history.
    pub occupancy: OccupancyRecord,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl Unit {
    /// Returns true if `user` is the current occupant.
    #[must_use]
    pub fn is_occupied_by(&self, user: crate::user::UserId) -> bool {
        self.occupancy.occupant() == Some(user)
    }
}
