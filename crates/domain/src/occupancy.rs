// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The occupancy record of a unit.
//!
//! An `OccupancyRecord` pairs the (optional) current occupancy with the
//! append-only list of closed intervals. Its fields are private: the only
//! legal operations are opening a new occupancy when none is current,
//! closing the current one into history, and flipping the reminder flag.

use crate::dates::iso_date;
use crate::error::DomainError;
use crate::unit::UnitId;
use crate::user::UserId;
use serde::{Deserialize, Serialize};
use time::Date;

/// The active occupancy of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    /// The occupying user.
    pub occupant: UserId,
    /// The date the occupancy took effect.
    #[serde(with = "iso_date")]
    pub assigned_on: Date,
    /// The date the occupant is expected to vacate, if known.
    #[serde(with = "iso_date::option")]
    pub expected_vacate_on: Option<Date>,
    /// Whether the 90-day vacate reminder has already been sent.
    pub reminder_sent: bool,
    /// Why the occupancy was opened.
    pub reason: Option<String>,
}

impl Occupancy {
    /// Creates a new occupancy with the reminder flag unset.
    #[must_use]
    pub const fn new(
        occupant: UserId,
        assigned_on: Date,
        expected_vacate_on: Option<Date>,
        reason: Option<String>,
    ) -> Self {
        Self {
            occupant,
            assigned_on,
            expected_vacate_on,
            reminder_sent: false,
            reason,
        }
    }
}

/// A closed occupancy interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedOccupancy {
    /// The former occupant.
    pub occupant: UserId,
    /// Entry date.
    #[serde(with = "iso_date")]
    pub entered_on: Date,
    /// Exit date.
    #[serde(with = "iso_date")]
    pub exited_on: Date,
    /// Why the occupancy ended.
    pub reason: String,
}

/// Current occupancy plus closed history for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OccupancyRecord {
    current: Option<Occupancy>,
    history: Vec<ClosedOccupancy>,
}

impl OccupancyRecord {
    /// An empty record: never occupied.
    #[must_use]
    pub const fn vacant() -> Self {
        Self {
            current: None,
            history: Vec::new(),
        }
    }

    /// Rebuilds a record from stored parts.
    ///
    /// Used by the persistence layer when loading a unit; it performs no
    /// transition and appends nothing.
    #[must_use]
    pub const fn from_parts(current: Option<Occupancy>, history: Vec<ClosedOccupancy>) -> Self {
        Self { current, history }
    }

    /// The active occupancy, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Occupancy> {
        self.current.as_ref()
    }

    /// The current occupant, if any.
    #[must_use]
    pub fn occupant(&self) -> Option<UserId> {
        self.current.as_ref().map(|c| c.occupant)
    }

    /// Closed intervals, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ClosedOccupancy] {
        &self.history
    }

    /// Returns true if an occupancy is active.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.current.is_some()
    }

    /// Opens a new occupancy.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnitAlreadyOccupied` if an occupancy is current.
    pub fn open(&mut self, unit: UnitId, occupancy: Occupancy) -> Result<(), DomainError> {
        if let Some(existing) = &self.current {
            return Err(DomainError::UnitAlreadyOccupied {
                unit,
                occupant: existing.occupant,
            });
        }
        self.current = Some(occupancy);
        Ok(())
    }

    /// Closes the current occupancy into history.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is current or if `exited_on` precedes the
    /// entry date.
    pub fn close(
        &mut self,
        unit: UnitId,
        exited_on: Date,
        reason: &str,
    ) -> Result<ClosedOccupancy, DomainError> {
        let Some(current) = &self.current else {
            return Err(DomainError::UnitNotOccupied { unit });
        };
        if exited_on < current.assigned_on {
            return Err(DomainError::InvalidOccupancyInterval {
                unit,
                entered_on: current.assigned_on,
                exited_on,
            });
        }

        let closed = ClosedOccupancy {
            occupant: current.occupant,
            entered_on: current.assigned_on,
            exited_on,
            reason: reason.to_string(),
        };
        self.history.push(closed.clone());
        self.current = None;
        Ok(closed)
    }

    /// Sets the reminder flag on the current occupancy.
    ///
    /// Returns `Ok(false)` when the flag was already set.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnitNotOccupied` if nothing is current.
    pub fn mark_reminder_sent(&mut self, unit: UnitId) -> Result<bool, DomainError> {
        match self.current.as_mut() {
            None => Err(DomainError::UnitNotOccupied { unit }),
            Some(current) if current.reminder_sent => Ok(false),
            Some(current) => {
                current.reminder_sent = true;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::macros::date;

    fn occupancy(user: i64) -> Occupancy {
        Occupancy::new(UserId::new(user), date!(2026 - 01 - 10), None, None)
    }

    #[test]
    fn test_open_refuses_second_occupant() {
        let mut record = OccupancyRecord::vacant();
        record.open(UnitId::new(1), occupancy(7)).unwrap();

        let result = record.open(UnitId::new(1), occupancy(8));

        assert_eq!(
            result,
            Err(DomainError::UnitAlreadyOccupied {
                unit: UnitId::new(1),
                occupant: UserId::new(7),
            })
        );
        assert_eq!(record.occupant(), Some(UserId::new(7)));
    }

    #[test]
    fn test_close_moves_current_into_history() {
        let mut record = OccupancyRecord::vacant();
        record.open(UnitId::new(1), occupancy(7)).unwrap();

        let closed = record
            .close(UnitId::new(1), date!(2026 - 06 - 30), "vacated")
            .unwrap();

        assert!(!record.is_occupied());
        assert_eq!(record.history(), &[closed]);
        assert_eq!(record.history()[0].entered_on, date!(2026 - 01 - 10));
    }

    #[test]
    fn test_close_rejects_exit_before_entry() {
        let mut record = OccupancyRecord::vacant();
        record.open(UnitId::new(1), occupancy(7)).unwrap();

        let result = record.close(UnitId::new(1), date!(2025 - 12 - 31), "vacated");

        assert!(matches!(
            result,
            Err(DomainError::InvalidOccupancyInterval { .. })
        ));
        assert!(record.is_occupied());
        assert!(record.history().is_empty());
    }

    #[test]
    fn test_reminder_flag_is_idempotent() {
        let mut record = OccupancyRecord::vacant();
        assert!(record.mark_reminder_sent(UnitId::new(1)).is_err());

        record.open(UnitId::new(1), occupancy(7)).unwrap();
        assert_eq!(record.mark_reminder_sent(UnitId::new(1)), Ok(true));
        assert_eq!(record.mark_reminder_sent(UnitId::new(1)), Ok(false));
        assert!(record.current().unwrap().reminder_sent);
    }
}
