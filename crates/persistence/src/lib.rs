// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the quarters housing workflow.
//!
//! This crate stores users, units, occupancy history, workflow documents
//! and the audit trail in `SQLite` through Diesel, with embedded
//! migrations.
//!
//! ## Consistency Contract
//!
//! - Every change planned by the core is written inside one
//!   `BEGIN IMMEDIATE` transaction opened by [`Persistence::atomically`].
//!   The writer lock is taken at `BEGIN`, so concurrent writers serialize
//!   on the database rather than on anything in this process.
//! - Every write of an existing user, unit or document is conditional on
//!   the version it was loaded with, and bumps it. A write that matches no
//!   row fails with [`PersistenceError::VersionConflict`] and the whole
//!   transaction rolls back.
//! - The schema backs the occupancy invariants independently: a unit is
//!   `occupied` exactly when it names an occupant, a user's unit reference
//!   is set exactly when their tenure is not `none`, and a partial unique
//!   index allows each user at most one unit of each kind.
//! - Occupancy history, document history and audit entries are
//!   append-only; triggers reject updates and deletes.
//!
//! ## Testing
//!
//! Tests run against a fresh shared-cache in-memory database per call to
//! [`Persistence::new_in_memory`]. Concurrency tests use a file database
//! with WAL enabled.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use quarters::{TransitionResult, UnitChangeResult};
use quarters_audit::{AuditEntry, ResourceType};
use quarters_domain::{
    District, Document, DocumentId, Role, Unit, UnitId, UnitKind, User, UserId,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::Date;

pub mod backend;
mod data_models;
mod diesel_schema;
mod error;
pub mod mutations;
pub mod queries;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;

/// Busy timeout used by in-memory databases.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}

/// Errors crossing a transaction boundary: the caller's own error, or a
/// failure of `BEGIN`/`COMMIT`/`ROLLBACK` itself.
enum TxError<E> {
    Caller(E),
    Database(diesel::result::Error),
}

impl<E> From<diesel::result::Error> for TxError<E> {
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(err)
    }
}

/// A handle to an open immediate transaction.
///
/// Obtained only through [`Persistence::atomically`]. Reads see the
/// transaction's own writes; nothing is visible to other connections until
/// the closure returns `Ok`.
pub struct Transaction<'a> {
    conn: &'a mut SqliteConnection,
}

impl Transaction<'_> {
    /// Loads a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such user exists.
    pub fn load_user(&mut self, user_id: UserId) -> Result<User, PersistenceError> {
        queries::users::load_user(self.conn, user_id)
    }

    /// Loads a unit with its occupancy history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such unit exists.
    pub fn load_unit(&mut self, unit_id: UnitId) -> Result<Unit, PersistenceError> {
        queries::units::load_unit(self.conn, unit_id)
    }

    /// Loads a document with its history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such document exists.
    pub fn load_document(&mut self, document_id: DocumentId) -> Result<Document, PersistenceError> {
        queries::documents::load_document(self.conn, document_id)
    }

    /// Writes a planned create or transition.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; the transaction must be abandoned.
    pub fn write_transition(
        &mut self,
        result: &TransitionResult,
    ) -> Result<TransitionResult, PersistenceError> {
        mutations::transition::write_transition(self.conn, result)
    }

    /// Writes a unit-only change.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; the transaction must be abandoned.
    pub fn write_unit_change(
        &mut self,
        change: &UnitChangeResult,
    ) -> Result<UnitChangeResult, PersistenceError> {
        mutations::transition::write_unit_change(self.conn, change)
    }
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique shared in-memory database via an atomic
    /// counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection =
            backend::sqlite::initialize_database(&shared_memory_url, DEFAULT_BUSY_TIMEOUT_MS)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    /// * `busy_timeout_ms` - How long a writer waits for the lock
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(
        path: P,
        busy_timeout_ms: u32,
    ) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection =
            backend::sqlite::initialize_database(path_str, busy_timeout_ms)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Runs `f` inside one immediate transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise,
    /// discarding every write `f` made. Errors from `BEGIN`, `COMMIT` or
    /// `ROLLBACK` are converted through `PersistenceError`.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or a persistence error if the transaction
    /// could not be opened or committed.
    pub fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let outcome: Result<T, TxError<E>> = self.conn.immediate_transaction(|conn| {
            let mut tx = Transaction { conn };
            f(&mut tx).map_err(TxError::Caller)
        });
        outcome.map_err(|err| match err {
            TxError::Caller(e) => e,
            TxError::Database(e) => E::from(PersistenceError::from(e)),
        })
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers a new user with no tenure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRegistration` for a blank name or a missing district
    /// on a district-scoped role.
    pub fn register_user(
        &mut self,
        display_name: &str,
        role: Role,
        district: Option<&District>,
    ) -> Result<User, PersistenceError> {
        self.atomically(|tx| {
            mutations::registration::register_user(tx.conn, display_name, role, district)
        })
    }

    /// Registers a new, available unit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRegistration` for a blank code or district and
    /// `UniqueViolation` for a duplicate code within the kind.
    pub fn register_unit(
        &mut self,
        kind: UnitKind,
        code: &str,
        district: &District,
        description: &str,
    ) -> Result<Unit, PersistenceError> {
        self.atomically(|tx| {
            mutations::registration::register_unit(tx.conn, kind, code, district, description)
        })
    }

    /// Registers the first user of an empty store. The emptiness check and
    /// the insert share one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationConflict` if any user exists, and
    /// `InvalidRegistration` as for [`Self::register_user`].
    pub fn bootstrap_first_user(
        &mut self,
        display_name: &str,
        role: Role,
        district: Option<&District>,
    ) -> Result<User, PersistenceError> {
        self.atomically(|tx| {
            mutations::registration::bootstrap_first_user(tx.conn, display_name, role, district)
        })
    }

    /// Deactivates a user. Returns `Ok(None)` if already inactive.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user and `RegistrationConflict`
    /// while the user holds a tenure.
    pub fn deactivate_user(&mut self, user_id: UserId) -> Result<Option<User>, PersistenceError> {
        self.atomically(|tx| mutations::registration::deactivate_user(tx.conn, user_id))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Loads a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such user exists.
    pub fn get_user(&mut self, user_id: UserId) -> Result<User, PersistenceError> {
        queries::users::load_user(&mut self.conn, user_id)
    }

    /// Loads a unit with its occupancy history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such unit exists.
    pub fn get_unit(&mut self, unit_id: UnitId) -> Result<Unit, PersistenceError> {
        queries::units::load_unit(&mut self.conn, unit_id)
    }

    /// Looks up a unit by kind and code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_unit_by_code(
        &mut self,
        kind: UnitKind,
        code: &str,
    ) -> Result<Option<Unit>, PersistenceError> {
        queries::units::find_unit_by_code(&mut self.conn, kind, code)
    }

    /// Loads a document with its history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such document exists.
    pub fn get_document(&mut self, document_id: DocumentId) -> Result<Document, PersistenceError> {
        queries::documents::load_document(&mut self.conn, document_id)
    }

    /// Loads every user and every unit from one consistent read.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a row cannot be decoded.
    pub fn snapshot(&mut self) -> Result<(Vec<User>, Vec<Unit>), PersistenceError> {
        self.atomically(|tx| {
            let users: Vec<User> = queries::users::list_users(tx.conn)?;
            let units: Vec<Unit> = queries::units::list_units(tx.conn)?;
            Ok((users, units))
        })
    }

    /// Lists occupied units due a vacate reminder.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn units_due_for_reminder(
        &mut self,
        today: Date,
        window_days: u32,
    ) -> Result<Vec<Unit>, PersistenceError> {
        queries::units::units_due_for_reminder(&mut self.conn, today, window_days)
    }

    /// Lists every audit entry in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_audit_entries(&mut self) -> Result<Vec<AuditEntry>, PersistenceError> {
        queries::audit::list_audit_entries(&mut self.conn)
    }

    /// Lists the audit entries recorded against one resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn audit_entries_for(
        &mut self,
        resource_type: ResourceType,
        resource_id: i64,
    ) -> Result<Vec<AuditEntry>, PersistenceError> {
        queries::audit::audit_entries_for(&mut self.conn, resource_type, resource_id)
    }
}
