// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::actor::AuthenticatedActor;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::consistency::{self, ConsistencyReport};
use crate::error::EngineError;
use quarters::{
    AccessScope, Capability, CapabilityAuthorizer, CreateContext, TransitionContext, TransitionResult,
    UnitChangeResult, apply_create, apply_mark_reminder, apply_transition, apply_unit_state,
    translate_domain_error,
};
use quarters_audit::{AuditEntry, AuditSink};
use quarters_domain::{
    CreatePayload, District, Document, DocumentId, DocumentType, OperationalState, Role, Unit,
    UnitId, UnitKind, User, UserId,
};
use quarters_persistence::{Persistence, PersistenceError, Transaction};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use time::{Date, OffsetDateTime};
use tracing::{debug, error, info, info_span, warn};

/// The transition engine.
///
/// Every mutating call loads, plans, writes and audits inside one immediate
/// transaction. Either all of it commits or none of it does.
pub struct Engine {
    persistence: Mutex<Persistence>,
    authorizer: CapabilityAuthorizer,
    sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What a successful attempt produced, and the stored audit entries to hand
/// to the sink before commit.
type Staged<T> = (T, Vec<AuditEntry>);

impl Engine {
    /// Creates an engine over `persistence` using the system clock.
    #[must_use]
    pub fn new(
        persistence: Persistence,
        authorizer: CapabilityAuthorizer,
        sink: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            persistence: Mutex::new(persistence),
            authorizer,
            sink,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the configuration in force.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Locks the underlying store.
    pub(crate) fn persistence(&self) -> Result<MutexGuard<'_, Persistence>, EngineError> {
        self.persistence.lock().map_err(|e| EngineError::Persistence {
            message: format!("persistence lock poisoned: {e}"),
            retryable: false,
        })
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Creates a document of `document_type`.
    ///
    /// Assignment and lodging-assignment acts are issued in the same
    /// transaction and come back in `pending-holder-signature`.
    ///
    /// # Errors
    ///
    /// * `Authorization` if the claimed role may not initiate the type, the
    ///   claim does not match the stored role, or the unit is out of scope.
    /// * `Validation` for a malformed payload.
    /// * `NotFound` for an unresolved titular, unit or source document.
    /// * `StateConflict` if the unit or source document does not qualify.
    /// * `Persistence` if storage, the audit sink or the deadline failed.
    pub fn create(
        &self,
        document_type: DocumentType,
        actor: &AuthenticatedActor,
        payload: &Value,
    ) -> Result<Document, EngineError> {
        let span = info_span!(
            "create",
            document_type = %document_type,
            actor_id = actor.user_id.value()
        );
        let _guard = span.enter();

        if !self
            .authorizer
            .authorize(actor.role, Capability::Initiate(document_type))
        {
            warn!(role = %actor.role, "Creation denied by capability table");
            return Err(EngineError::unauthorized(
                format!("create {document_type}"),
                format!("role '{}' may not initiate {document_type}", actor.role),
            ));
        }
        let parsed: CreatePayload = CreatePayload::parse(document_type, payload)
            .map_err(|e| EngineError::from(translate_domain_error(e)))?;

        let document: Document = self.execute(|tx, now| {
            let actor_record: User = load_actor(tx, actor)?;
            let titular: User = tx.load_user(parsed.titular)?;
            let unit: Option<Unit> = parsed.unit.map(|id| tx.load_unit(id)).transpose()?;
            let source: Option<Document> = parsed
                .source_document
                .map(|id| tx.load_document(id))
                .transpose()?;
            debug!("Loaded creation context");

            let plan: TransitionResult = apply_create(
                &self.authorizer,
                document_type,
                &parsed,
                &CreateContext {
                    actor: &actor_record,
                    titular: &titular,
                    unit: unit.as_ref(),
                    source: source.as_ref(),
                    now,
                },
            )?;
            let stored: TransitionResult = tx.write_transition(&plan)?;
            Ok((stored.document, stored.audit_entries))
        })?;

        info!(
            document_id = ?document.id,
            sequence_number = ?document.sequence_number,
            state = %document.state,
            "Document created"
        );
        Ok(document)
    }

    /// Fires `transition_name` on a document.
    ///
    /// # Errors
    ///
    /// * `StateConflict` if the transition is not declared from the current
    ///   state, the document is terminal, a guard fails, or another writer
    ///   changed a record first.
    /// * `Authorization` if the actor's role is not on the edge or the actor
    ///   is not the required party.
    /// * `Validation` for a malformed payload.
    /// * `NotFound` for an unknown document.
    /// * `ConsistencyViolation` if stored records are inconsistent.
    /// * `Persistence` if storage, the audit sink or the deadline failed.
    pub fn fire(
        &self,
        document_id: DocumentId,
        transition_name: &str,
        actor: &AuthenticatedActor,
        payload: &Value,
    ) -> Result<Document, EngineError> {
        let span = info_span!(
            "fire",
            document_id = document_id.value(),
            transition = transition_name,
            actor_id = actor.user_id.value()
        );
        let _guard = span.enter();

        let document: Document = self.execute(|tx, now| {
            let document: Document = tx.load_document(document_id)?;
            let actor_record: User = load_actor(tx, actor)?;
            let titular: User = tx.load_user(document.titular)?;
            let unit: Option<Unit> = document.unit.map(|id| tx.load_unit(id)).transpose()?;
            let current_occupant: Option<User> = match unit
                .as_ref()
                .and_then(|u| u.occupancy.occupant())
            {
                Some(occupant) if occupant != titular.id => Some(tx.load_user(occupant)?),
                _ => None,
            };
            debug!(state = %document.state, "Loaded transition context");

            let plan: TransitionResult = apply_transition(
                &self.authorizer,
                transition_name,
                payload,
                &TransitionContext {
                    actor: &actor_record,
                    document: &document,
                    titular: &titular,
                    unit: unit.as_ref(),
                    current_occupant: current_occupant.as_ref(),
                    now,
                },
            )?;
            let stored: TransitionResult = tx.write_transition(&plan)?;
            Ok((stored.document, stored.audit_entries))
        })?;

        info!(state = %document.state, "Transition committed");
        Ok(document)
    }

    /// Sets the vacate-reminder flag on a unit's current occupancy.
    ///
    /// Idempotent: a unit already flagged is returned unchanged and nothing
    /// is written or audited.
    ///
    /// # Errors
    ///
    /// * `Authorization` without global access to the unit's kind.
    /// * `StateConflict` if the unit is vacant or changed concurrently.
    /// * `NotFound` for an unknown unit.
    /// * `Persistence` if storage, the audit sink or the deadline failed.
    pub fn mark_reminder_sent(
        &self,
        unit_id: UnitId,
        actor: &AuthenticatedActor,
    ) -> Result<Unit, EngineError> {
        let span = info_span!(
            "mark_reminder_sent",
            unit_id = unit_id.value(),
            actor_id = actor.user_id.value()
        );
        let _guard = span.enter();

        self.execute(|tx, now| {
            let actor_record: User = load_actor(tx, actor)?;
            let unit: Unit = tx.load_unit(unit_id)?;
            let change: Option<UnitChangeResult> =
                apply_mark_reminder(&self.authorizer, &actor_record, &unit, now)?;
            write_unit_change(tx, unit, change.as_ref())
        })
    }

    /// Changes a unit's operational state administratively.
    ///
    /// Setting the state a unit is already in is a no-op.
    ///
    /// # Errors
    ///
    /// * `Authorization` without global access to the unit's kind.
    /// * `StateConflict` if the change would break the occupancy invariant
    ///   or the unit changed concurrently.
    /// * `NotFound` for an unknown unit.
    /// * `Persistence` if storage, the audit sink or the deadline failed.
    pub fn set_unit_state(
        &self,
        unit_id: UnitId,
        state: OperationalState,
        actor: &AuthenticatedActor,
    ) -> Result<Unit, EngineError> {
        let span = info_span!(
            "set_unit_state",
            unit_id = unit_id.value(),
            state = %state,
            actor_id = actor.user_id.value()
        );
        let _guard = span.enter();

        self.execute(|tx, now| {
            let actor_record: User = load_actor(tx, actor)?;
            let unit: Unit = tx.load_unit(unit_id)?;
            let change: Option<UnitChangeResult> =
                apply_unit_state(&self.authorizer, &actor_record, &unit, state, now)?;
            write_unit_change(tx, unit, change.as_ref())
        })
    }

    // ========================================================================
    // User administration
    // ========================================================================

    /// Registers a user with no tenure.
    ///
    /// # Errors
    ///
    /// * `Authorization` unless the actor's role may manage users.
    /// * `Validation` for a blank name or a district-scoped role without a
    ///   district.
    pub fn register_user(
        &self,
        actor: &AuthenticatedActor,
        display_name: &str,
        role: Role,
        district: Option<&District>,
    ) -> Result<User, EngineError> {
        let user: User = self
            .authorize_user_management(actor)?
            .register_user(display_name, role, district)?;
        info!(
            user_id = user.id.value(),
            role = %user.role,
            actor_id = actor.user_id.value(),
            "User registered"
        );
        Ok(user)
    }

    /// Deactivates a user. Returns `Ok(None)` if already inactive.
    ///
    /// # Errors
    ///
    /// * `Authorization` unless the actor's role may manage users.
    /// * `NotFound` for an unknown user.
    pub fn deactivate_user(
        &self,
        actor: &AuthenticatedActor,
        user_id: UserId,
    ) -> Result<Option<User>, EngineError> {
        let user: Option<User> = self
            .authorize_user_management(actor)?
            .deactivate_user(user_id)?;
        info!(
            user_id = user_id.value(),
            changed = user.is_some(),
            actor_id = actor.user_id.value(),
            "User deactivation processed"
        );
        Ok(user)
    }

    /// Registers the first user of an empty store, which has nobody yet who
    /// could authorize it. The emptiness check and the insert share one
    /// transaction.
    ///
    /// # Errors
    ///
    /// * `StateConflict` if any user is already registered.
    /// * `Validation` for a blank name or a district-scoped role without a
    ///   district.
    pub fn bootstrap_first_user(
        &self,
        display_name: &str,
        role: Role,
        district: Option<&District>,
    ) -> Result<User, EngineError> {
        let user: User = self
            .persistence()?
            .bootstrap_first_user(display_name, role, district)?;
        warn!(user_id = user.id.value(), role = %user.role, "Bootstrapped first user");
        Ok(user)
    }

    /// Registers an available unit. Needs global access to units of `kind`.
    ///
    /// # Errors
    ///
    /// * `Authorization` without global access to units of `kind`.
    /// * `StateConflict` if the code is taken within the kind.
    /// * `Validation` for a blank code or district.
    pub fn register_unit(
        &self,
        actor: &AuthenticatedActor,
        kind: UnitKind,
        code: &str,
        district: &District,
        description: &str,
    ) -> Result<Unit, EngineError> {
        let mut persistence = self.persistence()?;
        verify_actor(actor, persistence.get_user(actor.user_id))?;
        if self.authorizer.access_for(actor.role, kind) != AccessScope::Global {
            warn!(role = %actor.role, kind = %kind, "Unit registration denied");
            return Err(EngineError::unauthorized(
                format!("register {kind} unit"),
                format!("role '{}' lacks global access to {kind} units", actor.role),
            ));
        }
        let unit: Unit = persistence.register_unit(kind, code, district, description)?;
        drop(persistence);
        info!(
            unit_id = unit.id.value(),
            code = %unit.code,
            actor_id = actor.user_id.value(),
            "Unit registered"
        );
        Ok(unit)
    }

    fn authorize_user_management(
        &self,
        actor: &AuthenticatedActor,
    ) -> Result<MutexGuard<'_, Persistence>, EngineError> {
        let mut persistence = self.persistence()?;
        verify_actor(actor, persistence.get_user(actor.user_id))?;
        if self.authorizer.authorize(actor.role, Capability::ManageUsers) {
            Ok(persistence)
        } else {
            warn!(role = %actor.role, "User management denied by capability table");
            Err(EngineError::unauthorized(
                "manage users",
                format!("role '{}' may not manage users", actor.role),
            ))
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Reads a document on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// * `NotFound` for an unknown document.
    /// * `Authorization` if the actor may not see it or the claimed role does
    ///   not match.
    pub fn get(
        &self,
        document_id: DocumentId,
        actor: &AuthenticatedActor,
    ) -> Result<Document, EngineError> {
        let mut persistence = self.persistence()?;
        let document: Document = persistence.get_document(document_id)?;
        let actor_record: User = verify_actor(actor, persistence.get_user(actor.user_id))?;
        let unit: Option<Unit> = document
            .unit
            .map(|id| persistence.get_unit(id))
            .transpose()?;
        drop(persistence);

        if self
            .authorizer
            .can_view_document(&actor_record, &document, unit.as_ref())
        {
            Ok(document)
        } else {
            warn!(
                document_id = document_id.value(),
                actor_id = actor.user_id.value(),
                "Document read denied"
            );
            Err(EngineError::unauthorized(
                format!("view {}", document.document_type),
                "the document is outside the actor's view scope",
            ))
        }
    }

    /// Lists occupied units whose expected vacate date falls within the
    /// configured window of `today` and that have not been reminded yet.
    /// Overdue units are included.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the query fails.
    pub fn units_due_for_reminder(&self, today: Date) -> Result<Vec<Unit>, EngineError> {
        let units: Vec<Unit> = self
            .persistence()?
            .units_due_for_reminder(today, self.config.reminder_window_days)?;
        debug!(today = %today, due = units.len(), "Listed units due for reminder");
        Ok(units)
    }

    /// Loads a user record, e.g. to resolve an operator's stored role.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user.
    pub fn load_user(&self, user_id: UserId) -> Result<User, EngineError> {
        Ok(self.persistence()?.get_user(user_id)?)
    }

    /// Loads a unit record with its occupancy history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown unit.
    pub fn load_unit(&self, unit_id: UnitId) -> Result<Unit, EngineError> {
        Ok(self.persistence()?.get_unit(unit_id)?)
    }

    /// Confirms the store enforces foreign keys.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if enforcement is off or cannot be queried.
    pub fn verify_storage(&self) -> Result<(), EngineError> {
        self.persistence()?.verify_foreign_key_enforcement()?;
        Ok(())
    }

    /// Scans every user and unit for occupancy invariant violations.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the records cannot be loaded, or
    /// `ConsistencyViolation` if a stored row cannot be decoded.
    pub fn verify_consistency(&self) -> Result<ConsistencyReport, EngineError> {
        let (users, units) = self.persistence()?.snapshot()?;
        let report: ConsistencyReport = consistency::scan(&users, &units);
        for violation in &report.violations {
            error!(
                invariant = %violation.invariant,
                detail = %violation.detail,
                "Consistency violation found"
            );
        }
        info!(
            users = report.users_checked,
            units = report.units_checked,
            violations = report.violations.len(),
            "Consistency scan complete"
        );
        Ok(report)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Runs `attempt` inside one immediate transaction, then records its
    /// audit entries with the sink and checks the deadline before commit.
    ///
    /// A retryable failure is retried once from a fresh load when enabled
    /// and the deadline has not passed.
    fn execute<T, F>(&self, mut attempt: F) -> Result<T, EngineError>
    where
        F: FnMut(&mut Transaction<'_>, OffsetDateTime) -> Result<Staged<T>, EngineError>,
    {
        let started: Instant = Instant::now();
        let mut retried: bool = false;

        loop {
            let now: OffsetDateTime = self.clock.now();
            let outcome: Result<T, EngineError> = self.persistence().and_then(|mut persistence| {
                persistence.atomically(|tx| {
                    let (value, entries) = attempt(tx, now)?;
                    for entry in &entries {
                        self.sink.record(entry)?;
                    }
                    self.check_deadline(started)?;
                    Ok(value)
                })
            });

            match outcome {
                Ok(value) => return Ok(value),
                Err(err)
                    if err.is_retryable()
                        && self.config.retry_persistence_once
                        && !retried
                        && started.elapsed() < self.config.fire_timeout() =>
                {
                    warn!(error = %err, "Retrying after rolled back attempt");
                    retried = true;
                }
                Err(err) => {
                    if let EngineError::ConsistencyViolation { invariant, detail } = &err {
                        error!(
                            invariant = %invariant,
                            detail = %detail,
                            "Consistency violation; operation halted"
                        );
                    } else {
                        debug!(error = %err, "Operation rolled back");
                    }
                    return Err(err);
                }
            }
        }
    }

    fn check_deadline(&self, started: Instant) -> Result<(), EngineError> {
        let elapsed = started.elapsed();
        if elapsed > self.config.fire_timeout() {
            Err(EngineError::Persistence {
                message: format!(
                    "operation exceeded its {} ms deadline ({} ms elapsed)",
                    self.config.fire_timeout_ms,
                    elapsed.as_millis()
                ),
                retryable: true,
            })
        } else {
            Ok(())
        }
    }
}

fn verify_actor(
    actor: &AuthenticatedActor,
    stored: Result<User, PersistenceError>,
) -> Result<User, EngineError> {
    match stored {
        Ok(user) => actor.verify(user),
        Err(PersistenceError::NotFound { .. }) => Err(EngineError::unauthorized(
            "authenticate",
            format!("user {} does not exist", actor.user_id),
        )),
        Err(other) => Err(other.into()),
    }
}

fn load_actor(tx: &mut Transaction<'_>, actor: &AuthenticatedActor) -> Result<User, EngineError> {
    verify_actor(actor, tx.load_user(actor.user_id))
}

fn write_unit_change(
    tx: &mut Transaction<'_>,
    unit: Unit,
    change: Option<&UnitChangeResult>,
) -> Result<Staged<Unit>, EngineError> {
    match change {
        Some(change) => {
            let stored: UnitChangeResult = tx.write_unit_change(change)?;
            info!(unit = %stored.unit.code, action = %stored.audit_entry.action.name, "Unit updated");
            Ok((stored.unit, vec![stored.audit_entry]))
        }
        None => Ok((unit, Vec::new())),
    }
}
