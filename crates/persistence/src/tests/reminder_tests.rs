// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{fixture, occupy_in_db};
use crate::mutations::records::write_unit;
use time::macros::date;

#[test]
fn test_units_inside_the_window_are_due() {
    let mut f = fixture();
    let (unit, _) = occupy_in_db(&mut f.db, &f.unit, &f.applicant);

    // Expected vacate date is 2026-05-01.
    let due = f.db.units_due_for_reminder(date!(2026 - 03 - 02), 90).unwrap();
    assert_eq!(due, vec![unit]);

    let not_yet = f.db.units_due_for_reminder(date!(2026 - 03 - 02), 30).unwrap();
    assert!(not_yet.is_empty());
}

#[test]
fn test_overdue_units_are_still_due() {
    let mut f = fixture();
    occupy_in_db(&mut f.db, &f.unit, &f.applicant);

    let due = f.db.units_due_for_reminder(date!(2026 - 06 - 15), 0).unwrap();
    assert_eq!(due.len(), 1);
}

#[test]
fn test_flagged_and_vacant_units_are_not_due() {
    let mut f = fixture();
    let (mut unit, _) = occupy_in_db(&mut f.db, &f.unit, &f.applicant);

    unit.occupancy.mark_reminder_sent(unit.id).unwrap();
    f.db.atomically(|tx| write_unit(tx.conn, &unit)).unwrap();

    let due = f.db.units_due_for_reminder(date!(2026 - 04 - 20), 90).unwrap();
    assert!(due.is_empty());
}
