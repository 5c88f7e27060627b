// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Whole-database occupancy consistency scan.

use quarters::{CoreError, translate_domain_error};
use quarters_domain::{
    DomainError, Unit, UnitId, UnitKind, User, UserId, verify_pair, verify_unit, verify_user,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// One broken invariant found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The invariant concerned.
    pub invariant: String,
    /// Description of the violation.
    pub detail: String,
}

impl Violation {
    fn new(invariant: &str, detail: String) -> Self {
        Self {
            invariant: invariant.to_string(),
            detail,
        }
    }
}

impl From<DomainError> for Violation {
    fn from(err: DomainError) -> Self {
        match translate_domain_error(err) {
            CoreError::ConsistencyViolation { invariant, detail } => Self { invariant, detail },
            other => Self::new("unclassified", other.to_string()),
        }
    }
}

/// The outcome of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Number of users examined.
    pub users_checked: usize,
    /// Number of units examined.
    pub units_checked: usize,
    /// Every violation found, units first.
    pub violations: Vec<Violation>,
}

impl ConsistencyReport {
    /// Returns true if no violation was found.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks every unit and user against the occupancy invariants.
///
/// Reports, without stopping at the first:
/// - units whose operational state disagrees with their occupancy
/// - users whose unit references disagree with their tenure statuses
/// - occupant pointers that are not mirrored on the other side
/// - occupants or assigned units that do not exist
/// - users occupying more than one unit of a kind
#[must_use]
pub fn scan(users: &[User], units: &[Unit]) -> ConsistencyReport {
    let users_by_id: BTreeMap<UserId, &User> = users.iter().map(|u| (u.id, u)).collect();
    let units_by_id: BTreeMap<UnitId, &Unit> = units.iter().map(|u| (u.id, u)).collect();
    let mut violations: Vec<Violation> = Vec::new();
    let mut tenures: BTreeMap<(UserId, UnitKind), Vec<&str>> = BTreeMap::new();

    for unit in units {
        if let Err(err) = verify_unit(unit) {
            violations.push(err.into());
        }
        let Some(occupant) = unit.occupancy.occupant() else {
            continue;
        };
        tenures
            .entry((occupant, unit.kind))
            .or_default()
            .push(unit.code.as_str());
        match users_by_id.get(&occupant) {
            Some(user) => {
                if let Err(err) = verify_pair(unit, user) {
                    violations.push(err.into());
                }
            }
            None => violations.push(Violation::new(
                "occupant-exists",
                format!("unit {} names missing occupant {occupant}", unit.code),
            )),
        }
    }

    for ((user, kind), codes) in &tenures {
        if codes.len() > 1 {
            violations.push(Violation::new(
                "one-tenure-per-kind",
                format!("user {user} occupies {kind} units {}", codes.join(", ")),
            ));
        }
    }

    for user in users {
        if let Err(err) = verify_user(user) {
            violations.push(err.into());
        }
        for kind in UnitKind::ALL {
            let Some(unit_id) = user.assigned_unit(kind) else {
                continue;
            };
            match units_by_id.get(&unit_id) {
                // Pointers from the unit side were checked above.
                Some(unit) if unit.is_occupied_by(user.id) => {}
                Some(unit) => {
                    if let Err(err) = verify_pair(unit, user) {
                        violations.push(err.into());
                    }
                }
                None => violations.push(Violation::new(
                    "assigned-unit-exists",
                    format!("user {} references missing {kind} unit {unit_id}", user.id),
                )),
            }
        }
    }

    ConsistencyReport {
        users_checked: users.len(),
        units_checked: units.len(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarters_domain::{
        District, Occupancy, OccupancyRecord, OperationalState, Role, TenureStatus,
    };
    use time::macros::date;

    fn user(id: i64) -> User {
        User {
            id: UserId::new(id),
            display_name: format!("User {id}"),
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

    fn unit(id: i64, code: &str) -> Unit {
        Unit {
            id: UnitId::new(id),
            kind: UnitKind::Housing,
            code: code.to_string(),
            district: District::new("Norte"),
            description: String::new(),
            operational_state: OperationalState::Available,
            occupancy: OccupancyRecord::vacant(),
            version: 1,
        }
    }

    fn occupy(unit: &mut Unit, user: &mut User) {
        unit.occupancy = OccupancyRecord::from_parts(
            Some(Occupancy::new(user.id, date!(2026 - 01 - 10), None, None)),
            Vec::new(),
        );
        unit.operational_state = OperationalState::Occupied;
        user.begin_tenure(unit.kind, unit.id);
    }

    #[test]
    fn test_consistent_records_pass() {
        let mut k01 = unit(10, "K01");
        let mut holder = user(5);
        occupy(&mut k01, &mut holder);

        let report = scan(&[holder, user(6)], &[k01, unit(11, "K02")]);

        assert!(report.is_consistent(), "{:?}", report.violations);
        assert_eq!(report.users_checked, 2);
        assert_eq!(report.units_checked, 2);
    }

    #[test]
    fn test_one_sided_pointer_is_reported() {
        let mut k01 = unit(10, "K01");
        let mut holder = user(5);
        occupy(&mut k01, &mut holder);
        let stranger = user(5);

        let report = scan(&[stranger], &[k01]);

        assert_eq!(report.violations.len(), 1);
        assert_eq!(
            report.violations[0].invariant,
            "bidirectional-occupant-pointer"
        );
    }

    #[test]
    fn test_double_tenure_and_missing_occupant_are_reported() {
        let mut k01 = unit(10, "K01");
        let mut k02 = unit(11, "K02");
        let mut holder = user(5);
        occupy(&mut k01, &mut holder);
        occupy(&mut k02, &mut holder.clone());
        let mut k03 = unit(12, "K03");
        occupy(&mut k03, &mut user(99));

        let report = scan(&[holder], &[k01, k02, k03]);
        let invariants: Vec<&str> = report
            .violations
            .iter()
            .map(|v| v.invariant.as_str())
            .collect();

        assert!(invariants.contains(&"one-tenure-per-kind"));
        assert!(invariants.contains(&"occupant-exists"));
    }

    #[test]
    fn test_state_mismatch_is_reported() {
        let mut k01 = unit(10, "K01");
        k01.operational_state = OperationalState::Occupied;

        let report = scan(&[], &[k01]);

        assert_eq!(report.violations.len(), 1);
        assert_eq!(
            report.violations[0].invariant,
            "occupied-iff-current-occupancy"
        );
    }
}
