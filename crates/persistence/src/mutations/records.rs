// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use num_traits::ToPrimitive;
use quarters_audit::AuditEntry;
use quarters_domain::{ClosedOccupancy, Document, DocumentId, HistoryEntry, Unit, User, format_date};
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{
    DocumentChanges, NewAuditEntryRow, NewDocumentHistoryRow, NewDocumentRow,
    NewOccupancyHistoryRow, UnitChanges, UserChanges, format_timestamp,
};
use crate::diesel_schema::{audit_entries, document_history, documents, occupancy_history, units, users};
use crate::error::PersistenceError;
use crate::queries;

fn require_one_row(
    updated: usize,
    resource: &str,
    id: i64,
    expected_version: i64,
) -> Result<(), PersistenceError> {
    if updated == 1 {
        Ok(())
    } else {
        Err(PersistenceError::VersionConflict {
            resource: resource.to_string(),
            id,
            expected_version,
        })
    }
}

/// Returns the entries of `given` past the `stored` count.
fn appended<'a, T>(
    resource: &str,
    id: i64,
    stored: usize,
    given: &'a [T],
) -> Result<&'a [T], PersistenceError> {
    given.get(stored..).ok_or_else(|| PersistenceError::HistoryRewrite {
        resource: resource.to_string(),
        id,
        stored,
        given: given.len(),
    })
}

/// Writes a user's tenure, role and activation, conditional on its version.
///
/// Returns the user with its new version.
///
/// # Errors
///
/// Returns `VersionConflict` if the stored version differs from
/// `user.version`.
pub fn write_user(conn: &mut SqliteConnection, user: &User) -> Result<User, PersistenceError> {
    let id: i64 = user.id.value();
    let updated: usize = diesel::update(
        users::table
            .filter(users::user_id.eq(id))
            .filter(users::version.eq(user.version)),
    )
    .set(UserChanges::from_user(user))
    .execute(conn)?;
    require_one_row(updated, "user", id, user.version)?;

    debug!(user_id = id, version = user.version + 1, "Wrote user");
    let mut written: User = user.clone();
    written.version += 1;
    Ok(written)
}

/// Writes a unit's occupancy and operational state, conditional on its
/// version, and appends any newly closed occupancies to its history.
///
/// Returns the unit with its new version.
///
/// # Errors
///
/// Returns `VersionConflict` if the stored version differs from
/// `unit.version`, and `HistoryRewrite` if `unit` carries fewer closed
/// occupancies than are stored.
pub fn write_unit(conn: &mut SqliteConnection, unit: &Unit) -> Result<Unit, PersistenceError> {
    let id: i64 = unit.id.value();
    let updated: usize = diesel::update(
        units::table
            .filter(units::unit_id.eq(id))
            .filter(units::version.eq(unit.version)),
    )
    .set(UnitChanges::from_unit(unit))
    .execute(conn)?;
    require_one_row(updated, "unit", id, unit.version)?;

    let stored: usize = queries::units::count_history(conn, unit.id)?;
    let new_entries: &[ClosedOccupancy] =
        appended("unit", id, stored, unit.occupancy.history())?;
    for closed in new_entries {
        diesel::insert_into(occupancy_history::table)
            .values(NewOccupancyHistoryRow {
                unit_id: id,
                occupant_user_id: closed.occupant.value(),
                entered_on: format_date(closed.entered_on),
                exited_on: format_date(closed.exited_on),
                reason: &closed.reason,
            })
            .execute(conn)?;
    }

    debug!(
        unit_id = id,
        version = unit.version + 1,
        closed_occupancies = new_entries.len(),
        "Wrote unit"
    );
    let mut written: Unit = unit.clone();
    written.version += 1;
    Ok(written)
}

fn insert_history(
    conn: &mut SqliteConnection,
    document_id: i64,
    first_position: usize,
    entries: &[HistoryEntry],
) -> Result<(), PersistenceError> {
    for (offset, entry) in entries.iter().enumerate() {
        let position: i64 = (first_position + offset)
            .to_i64()
            .ok_or_else(|| PersistenceError::corrupt("document", document_id, "history too long"))?;
        diesel::insert_into(document_history::table)
            .values(NewDocumentHistoryRow {
                document_id,
                position,
                recorded_at: format_timestamp(entry.recorded_at)?,
                actor_user_id: entry.actor_id.value(),
                actor_role: entry.actor_role.as_str(),
                action: &entry.action,
                note: entry.note.as_deref(),
            })
            .execute(conn)?;
    }
    Ok(())
}

/// Inserts a new document with its history, assigning the next sequence
/// number for its type.
///
/// Returns the document with its ID, sequence number and version 1.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_document(
    conn: &mut SqliteConnection,
    document: &Document,
) -> Result<Document, PersistenceError> {
    let sequence_number: i64 = queries::documents::next_sequence_number(conn, document.document_type)?;

    diesel::insert_into(documents::table)
        .values(NewDocumentRow {
            document_type: document.document_type.as_str(),
            sequence_number,
            state: document.state.as_str(),
            titular_user_id: document.titular.value(),
            unit_id: document.unit.map(|u| u.value()),
            source_document_id: document.source_document.map(|d| d.value()),
            created_by: document.created_by.value(),
            payload_json: serde_json::to_string(&document.payload)?,
            created_at: format_timestamp(document.created_at)?,
            updated_at: format_timestamp(document.updated_at)?,
        })
        .execute(conn)?;
    let document_id: i64 = get_last_insert_rowid(conn)?;

    insert_history(conn, document_id, 0, &document.history)?;

    debug!(
        document_id,
        sequence_number,
        document_type = %document.document_type,
        "Inserted document"
    );
    let mut written: Document = document.clone();
    written.id = Some(DocumentId::new(document_id));
    written.sequence_number = Some(sequence_number);
    written.version = 1;
    Ok(written)
}

/// Writes an existing document's state and payload, conditional on its
/// version, and appends new history entries.
///
/// Returns the document with its new version.
///
/// # Errors
///
/// Returns `VersionConflict` if the stored version differs, and
/// `HistoryRewrite` if `document` carries fewer history entries than are
/// stored.
pub fn write_document(
    conn: &mut SqliteConnection,
    document_id: DocumentId,
    document: &Document,
) -> Result<Document, PersistenceError> {
    let id: i64 = document_id.value();
    let updated: usize = diesel::update(
        documents::table
            .filter(documents::document_id.eq(id))
            .filter(documents::version.eq(document.version)),
    )
    .set(DocumentChanges {
        state: document.state.as_str(),
        payload_json: serde_json::to_string(&document.payload)?,
        updated_at: format_timestamp(document.updated_at)?,
        version: document.version + 1,
    })
    .execute(conn)?;
    require_one_row(updated, "document", id, document.version)?;

    let stored: usize = queries::documents::count_history(conn, document_id)?;
    let new_entries: &[HistoryEntry] = appended("document", id, stored, &document.history)?;
    insert_history(conn, id, stored, new_entries)?;

    debug!(document_id = id, state = %document.state, "Wrote document");
    let mut written: Document = document.clone();
    written.version += 1;
    Ok(written)
}

/// Appends an audit entry.
///
/// Returns the entry with its assigned ID.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_audit_entry(
    conn: &mut SqliteConnection,
    entry: &AuditEntry,
) -> Result<AuditEntry, PersistenceError> {
    diesel::insert_into(audit_entries::table)
        .values(NewAuditEntryRow::from_entry(entry)?)
        .execute(conn)?;
    let audit_id: i64 = get_last_insert_rowid(conn)?;

    let mut written: AuditEntry = entry.clone();
    written.id = Some(audit_id);
    Ok(written)
}
