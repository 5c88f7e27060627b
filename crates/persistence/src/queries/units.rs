// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use num_traits::ToPrimitive;
use quarters_domain::{ClosedOccupancy, Unit, UnitId, UnitKind, format_date};
use time::Date;
use tracing::debug;

use crate::data_models::{OccupancyHistoryRow, UnitRow};
use crate::diesel_schema::{occupancy_history, units};
use crate::error::PersistenceError;

fn load_history(
    conn: &mut SqliteConnection,
    unit_id: i64,
) -> Result<Vec<ClosedOccupancy>, PersistenceError> {
    let rows: Vec<OccupancyHistoryRow> = occupancy_history::table
        .filter(occupancy_history::unit_id.eq(unit_id))
        .order(occupancy_history::history_id.asc())
        .select(OccupancyHistoryRow::as_select())
        .load(conn)?;

    rows.into_iter()
        .map(OccupancyHistoryRow::into_domain)
        .collect()
}

fn with_history(conn: &mut SqliteConnection, row: UnitRow) -> Result<Unit, PersistenceError> {
    let history: Vec<ClosedOccupancy> = load_history(conn, row.unit_id)?;
    row.into_domain(history)
}

/// Loads a unit, including its closed occupancy history.
///
/// # Errors
///
/// Returns `NotFound` if no such unit exists.
pub fn load_unit(conn: &mut SqliteConnection, unit_id: UnitId) -> Result<Unit, PersistenceError> {
    debug!(unit_id = unit_id.value(), "Loading unit");

    let row: Option<UnitRow> = units::table
        .filter(units::unit_id.eq(unit_id.value()))
        .select(UnitRow::as_select())
        .first(conn)
        .optional()?;

    let row: UnitRow = row.ok_or_else(|| PersistenceError::not_found("unit", unit_id.value()))?;
    with_history(conn, row)
}

/// Looks up a unit by kind and code.
///
/// # Errors
///
/// Returns an error if the query fails. Returns `Ok(None)` if no unit of
/// that kind carries the code.
pub fn find_unit_by_code(
    conn: &mut SqliteConnection,
    kind: UnitKind,
    code: &str,
) -> Result<Option<Unit>, PersistenceError> {
    let row: Option<UnitRow> = units::table
        .filter(units::kind.eq(kind.as_str()))
        .filter(units::code.eq(code))
        .select(UnitRow::as_select())
        .first(conn)
        .optional()?;

    row.map(|row| with_history(conn, row)).transpose()
}

/// Loads every unit, ordered by ID.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_units(conn: &mut SqliteConnection) -> Result<Vec<Unit>, PersistenceError> {
    let rows: Vec<UnitRow> = units::table
        .order(units::unit_id.asc())
        .select(UnitRow::as_select())
        .load(conn)?;

    rows.into_iter().map(|row| with_history(conn, row)).collect()
}

/// Lists occupied units whose reminder flag is unset and whose expected
/// vacate date is on or before `today + window_days`.
///
/// Overdue occupancies are included.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn units_due_for_reminder(
    conn: &mut SqliteConnection,
    today: Date,
    window_days: u32,
) -> Result<Vec<Unit>, PersistenceError> {
    let horizon: Date = today
        .checked_add(time::Duration::days(i64::from(window_days)))
        .unwrap_or(Date::MAX);
    let horizon: String = format_date(horizon);

    let rows: Vec<UnitRow> = units::table
        .filter(units::occupant_user_id.is_not_null())
        .filter(units::reminder_sent.eq(0))
        .filter(units::expected_vacate_on.le(horizon.as_str()))
        .order((units::expected_vacate_on.asc(), units::unit_id.asc()))
        .select(UnitRow::as_select())
        .load(conn)?;

    debug!(horizon = %horizon, due = rows.len(), "Units due for vacate reminder");

    rows.into_iter().map(|row| with_history(conn, row)).collect()
}

/// Counts the stored closed occupancies of a unit.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_history(conn: &mut SqliteConnection, unit_id: UnitId) -> Result<usize, PersistenceError> {
    let count: i64 = occupancy_history::table
        .filter(occupancy_history::unit_id.eq(unit_id.value()))
        .count()
        .get_result(conn)?;

    count
        .to_usize()
        .ok_or_else(|| PersistenceError::corrupt("unit", unit_id.value(), "negative history count"))
}
