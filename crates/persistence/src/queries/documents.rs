// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use num_traits::ToPrimitive;
use quarters_domain::{Document, DocumentId, DocumentType, HistoryEntry};
use tracing::debug;

use crate::data_models::{DocumentHistoryRow, DocumentRow};
use crate::diesel_schema::{document_history, documents};
use crate::error::PersistenceError;

/// Loads a document with its full history.
///
/// # Errors
///
/// Returns `NotFound` if no such document exists.
pub fn load_document(
    conn: &mut SqliteConnection,
    document_id: DocumentId,
) -> Result<Document, PersistenceError> {
    debug!(document_id = document_id.value(), "Loading document");

    let row: Option<DocumentRow> = documents::table
        .filter(documents::document_id.eq(document_id.value()))
        .select(DocumentRow::as_select())
        .first(conn)
        .optional()?;
    let row: DocumentRow =
        row.ok_or_else(|| PersistenceError::not_found("document", document_id.value()))?;

    let history_rows: Vec<DocumentHistoryRow> = document_history::table
        .filter(document_history::document_id.eq(document_id.value()))
        .order(document_history::position.asc())
        .select(DocumentHistoryRow::as_select())
        .load(conn)?;
    let history: Vec<HistoryEntry> = history_rows
        .into_iter()
        .map(DocumentHistoryRow::into_domain)
        .collect::<Result<_, _>>()?;

    row.into_domain(history)
}

/// Returns the next sequence number for a document type.
///
/// Must run inside the transaction that inserts the document.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn next_sequence_number(
    conn: &mut SqliteConnection,
    document_type: DocumentType,
) -> Result<i64, PersistenceError> {
    let current: Option<i64> = documents::table
        .filter(documents::document_type.eq(document_type.as_str()))
        .select(diesel::dsl::max(documents::sequence_number))
        .first(conn)?;

    Ok(current.unwrap_or(0) + 1)
}

/// Counts the stored history entries of a document.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_history(
    conn: &mut SqliteConnection,
    document_id: DocumentId,
) -> Result<usize, PersistenceError> {
    let count: i64 = document_history::table
        .filter(document_history::document_id.eq(document_id.value()))
        .count()
        .get_result(conn)?;

    count.to_usize().ok_or_else(|| {
        PersistenceError::corrupt("document", document_id.value(), "negative history count")
    })
}
