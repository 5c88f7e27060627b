// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use quarters_audit::{AuditEntry, ResourceType};

use crate::data_models::AuditEntryRow;
use crate::diesel_schema::audit_entries;
use crate::error::PersistenceError;

/// Lists every audit entry in insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_audit_entries(conn: &mut SqliteConnection) -> Result<Vec<AuditEntry>, PersistenceError> {
    let rows: Vec<AuditEntryRow> = audit_entries::table
        .order(audit_entries::audit_id.asc())
        .select(AuditEntryRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AuditEntryRow::into_domain).collect()
}

/// Lists the audit entries recorded against one resource, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn audit_entries_for(
    conn: &mut SqliteConnection,
    resource_type: ResourceType,
    resource_id: i64,
) -> Result<Vec<AuditEntry>, PersistenceError> {
    let rows: Vec<AuditEntryRow> = audit_entries::table
        .filter(audit_entries::resource_type.eq(resource_type.as_str()))
        .filter(audit_entries::resource_id.eq(resource_id))
        .order(audit_entries::audit_id.asc())
        .select(AuditEntryRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AuditEntryRow::into_domain).collect()
}
