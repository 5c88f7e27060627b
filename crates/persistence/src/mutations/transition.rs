// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use quarters::{TransitionResult, UnitChangeResult};
use quarters_audit::{AuditEntry, ResourceType};
use quarters_domain::{Document, DocumentId, Unit, User};
use tracing::{debug, info};

use crate::error::PersistenceError;
use crate::mutations::records::{
    insert_audit_entry, insert_document, write_document, write_unit, write_user,
};

/// Points an audit entry planned for a not-yet-inserted document at the
/// document's assigned ID.
fn bind_document_entry(entry: &AuditEntry, document_id: DocumentId) -> AuditEntry {
    if entry.resource_type != ResourceType::Document || entry.resource_id.is_some() {
        return entry.clone();
    }
    let mut bound: AuditEntry = entry.clone().with_resource_id(document_id.value());
    bound.cause.id = format!("document:{document_id}");
    bound
}

/// Writes every record of a planned create or transition.
///
/// Users are written before units, then the document, then the audit
/// entries. Each user, unit and existing document write is conditional on
/// the version it was loaded with. Returns the result as stored: new
/// versions, the document's ID and sequence number, and audit entry IDs.
///
/// # Errors
///
/// Returns the first write failure. The caller's transaction must then be
/// rolled back; this function does not undo earlier writes itself.
pub fn write_transition(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
) -> Result<TransitionResult, PersistenceError> {
    let users: Vec<User> = result
        .users
        .iter()
        .map(|user| write_user(conn, user))
        .collect::<Result<_, _>>()?;
    let units: Vec<Unit> = result
        .units
        .iter()
        .map(|unit| write_unit(conn, unit))
        .collect::<Result<_, _>>()?;

    let document: Document = match result.document.id {
        Some(document_id) => write_document(conn, document_id, &result.document)?,
        None => insert_document(conn, &result.document)?,
    };
    let document_id: DocumentId = document.id.ok_or_else(|| {
        PersistenceError::DatabaseError(String::from("document written without an ID"))
    })?;

    let audit_entries: Vec<AuditEntry> = result
        .audit_entries
        .iter()
        .map(|entry| insert_audit_entry(conn, &bind_document_entry(entry, document_id)))
        .collect::<Result<_, _>>()?;

    info!(
        document_id = document_id.value(),
        state = %document.state,
        users = users.len(),
        units = units.len(),
        audit_entries = audit_entries.len(),
        "Wrote transition"
    );

    Ok(TransitionResult {
        document,
        units,
        users,
        audit_entries,
    })
}

/// Writes a unit-only change and its audit entry.
///
/// # Errors
///
/// Returns `VersionConflict` if the unit changed since it was loaded.
pub fn write_unit_change(
    conn: &mut SqliteConnection,
    change: &UnitChangeResult,
) -> Result<UnitChangeResult, PersistenceError> {
    let unit: Unit = write_unit(conn, &change.unit)?;
    let audit_entry: AuditEntry = insert_audit_entry(conn, &change.audit_entry)?;

    debug!(unit_id = unit.id.value(), "Wrote unit change");
    Ok(UnitChangeResult { unit, audit_entry })
}
