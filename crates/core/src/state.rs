// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use quarters_audit::AuditEntry;
use quarters_domain::{Document, Unit, User};
use time::OffsetDateTime;

/// Records loaded for a document creation.
#[derive(Debug, Clone, Copy)]
pub struct CreateContext<'a> {
    /// The acting user, as stored.
    pub actor: &'a User,
    /// The titular named in the payload.
    pub titular: &'a User,
    /// The unit named in the payload, if any.
    pub unit: Option<&'a Unit>,
    /// The source document named in the payload, if any.
    pub source: Option<&'a Document>,
    /// Clock reading for history and audit timestamps.
    pub now: OffsetDateTime,
}

/// Records loaded for a transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    /// The acting user, as stored.
    pub actor: &'a User,
    /// The document, as stored.
    pub document: &'a Document,
    /// The document's titular.
    pub titular: &'a User,
    /// The document's unit, if any.
    pub unit: Option<&'a Unit>,
    /// The unit's current occupant, when it is someone other than the
    /// titular.
    pub current_occupant: Option<&'a User>,
    /// Clock reading for history, audit timestamps and default dates.
    pub now: OffsetDateTime,
}

/// The complete, verified outcome of a create or a transition.
///
/// Nothing has been written yet. The caller persists every record here in
/// one atomic unit, or none of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The document after the change.
    pub document: Document,
    /// Units whose occupancy changed.
    pub units: Vec<Unit>,
    /// Users whose tenure changed.
    pub users: Vec<User>,
    /// Audit entries, one per transition applied.
    pub audit_entries: Vec<AuditEntry>,
}

/// The outcome of a unit-only change (reminder flag, operational state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitChangeResult {
    /// The unit after the change.
    pub unit: Unit,
    /// The audit entry describing it.
    pub audit_entry: AuditEntry,
}
