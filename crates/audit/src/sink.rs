// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit sinks.
//!
//! A sink receives every audit entry immediately before the transaction
//! that produced it commits. A sink error aborts that transaction.

use crate::AuditEntry;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Errors reported by an audit sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditSinkError {
    /// The sink could not accept the entry.
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
    /// The sink's internal state is unusable.
    #[error("Audit sink state corrupted: {0}")]
    Poisoned(String),
}

/// Receives an immutable record of every state change.
pub trait AuditSink: Send + Sync {
    /// Records one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be recorded. The caller must
    /// roll back the change the entry describes.
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError>;
}

impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        (**self).record(entry)
    }
}

/// Emits each entry as a structured tracing event on `quarters::audit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        info!(
            target: "quarters::audit",
            actor_id = entry.actor.user_id.value(),
            actor_role = %entry.actor.role,
            cause = %entry.cause.id,
            action = %entry.action.name,
            details = entry.action.details.as_deref().unwrap_or(""),
            resource_type = %entry.resource_type,
            resource_id = entry.resource_id,
            recorded_at = %entry.recorded_at,
            "audit"
        );
        Ok(())
    }
}

/// Keeps entries in memory. Used by tests and by short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AuditSinkError::Poisoned` if a writer panicked.
    pub fn entries(&self) -> Result<Vec<AuditEntry>, AuditSinkError> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|e| AuditSinkError::Poisoned(e.to_string()))
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        self.entries
            .lock()
            .map_err(|e| AuditSinkError::Poisoned(e.to_string()))?
            .push(entry.clone());
        Ok(())
    }
}
