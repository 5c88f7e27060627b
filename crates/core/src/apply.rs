// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pure planning of document changes.
//!
//! Every function here takes the records as loaded and returns either a
//! complete, verified set of new records plus audit entries, or an error.
//! Nothing is written; a returned error means nothing changed.

use crate::capabilities::{AccessScope, Capability, CapabilityAuthorizer};
use crate::error::CoreError;
use crate::ledger::{self, AssignRequest, LedgerChange};
use crate::machines::{Edge, Effect, Guard, PartyRule, StateMachine, Transition};
use crate::state::{CreateContext, TransitionContext, TransitionResult, UnitChangeResult};
use quarters_audit::{Action, Actor, AuditEntry, Cause, ResourceType};
use quarters_domain::{
    CreatePayload, Document, DocumentState, DocumentType, HistoryEntry, OperationalState,
    TransitionPayload, Unit, UnitKind, User,
};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

/// Default reason recorded when an occupancy is closed by a vacating act.
pub const VACATED_REASON: &str = "vacated";

/// Checks that `actor` may create documents of `document_type`.
///
/// # Errors
///
/// Returns `CoreError::Unauthorized` if the actor is deactivated or their
/// role lacks the initiation capability.
pub fn authorize_create(
    authorizer: &CapabilityAuthorizer,
    actor: &User,
    document_type: DocumentType,
) -> Result<(), CoreError> {
    require_active_actor(actor)?;
    authorizer.require(actor.role, Capability::Initiate(document_type))
}

fn require_active_actor(actor: &User) -> Result<(), CoreError> {
    if actor.is_active {
        Ok(())
    } else {
        Err(CoreError::unauthorized(
            "act",
            format!("user {} is deactivated", actor.id),
        ))
    }
}

const fn unit_resource(kind: UnitKind) -> ResourceType {
    match kind {
        UnitKind::Housing => ResourceType::HousingUnit,
        UnitKind::Lodging => ResourceType::LodgingUnit,
    }
}

fn document_cause(document: &Document, action: &str) -> Cause {
    let id: String = document
        .id
        .map_or_else(|| String::from("new"), |id| id.to_string());
    Cause::new(
        format!("document:{id}"),
        format!("{action} {}", document.document_type),
    )
}

fn document_audit(
    actor: &User,
    document: &Document,
    action: &str,
    details: String,
    now: OffsetDateTime,
) -> AuditEntry {
    AuditEntry::new(
        Actor::new(actor.id, actor.role),
        document_cause(document, action),
        Action::new(action.to_string(), Some(details)),
        ResourceType::Document,
        document.id.map(|id| id.value()),
        now,
    )
}

fn history_entry(
    actor: &User,
    action: &str,
    note: Option<String>,
    now: OffsetDateTime,
) -> HistoryEntry {
    HistoryEntry {
        recorded_at: now,
        actor_id: actor.id,
        actor_role: actor.role,
        action: action.to_string(),
        note,
    }
}

/// Moves `document` along `edge` and returns the audit entry for it.
fn advance(
    document: &mut Document,
    edge: &Edge,
    actor: &User,
    note: Option<String>,
    effects: &[String],
    now: OffsetDateTime,
) -> AuditEntry {
    let from: DocumentState = document.state;
    document.state = edge.to;
    document.record(history_entry(actor, edge.transition.as_str(), note, now));

    let mut details: String = format!("{from} -> {}", edge.to);
    for effect in effects {
        details.push_str("; ");
        details.push_str(effect);
    }
    document_audit(actor, document, edge.transition.as_str(), details, now)
}

fn require_unit(unit: Option<&Unit>, document_type: DocumentType) -> Result<&Unit, CoreError> {
    unit.ok_or_else(|| CoreError::Validation {
        field: String::from("unit_id"),
        message: format!("is required for {document_type}"),
    })
}

fn check_source(
    document_type: DocumentType,
    payload: &CreatePayload,
    source: Option<&Document>,
) -> Result<(), CoreError> {
    let Some(source) = source else {
        return Ok(());
    };

    let expected: Option<(DocumentType, DocumentState)> = match document_type {
        DocumentType::AssignmentAct | DocumentType::LodgingAssignmentAct => {
            Some((DocumentType::Application, DocumentState::Approved))
        }
        DocumentType::ReceiptAct => Some((DocumentType::AssignmentAct, DocumentState::Closed)),
        _ => None,
    };
    let Some((source_type, source_state)) = expected else {
        return Ok(());
    };

    if source.document_type != source_type {
        return Err(CoreError::Validation {
            field: String::from("source_document_id"),
            message: format!("{document_type} must reference a {source_type}"),
        });
    }
    if source.state != source_state {
        return Err(CoreError::conflict(format!(
            "source {source_type} is '{}', expected '{source_state}'",
            source.state
        )));
    }
    if source.titular != payload.titular {
        return Err(CoreError::conflict(
            "source document names a different titular",
        ));
    }
    if document_type == DocumentType::ReceiptAct && source.unit != payload.unit {
        return Err(CoreError::conflict("source document names a different unit"));
    }
    Ok(())
}

fn check_create_unit(
    authorizer: &CapabilityAuthorizer,
    document_type: DocumentType,
    ctx: &CreateContext<'_>,
) -> Result<(), CoreError> {
    if !document_type.requires_unit() {
        return Ok(());
    }
    let unit: &Unit = require_unit(ctx.unit, document_type)?;

    if let Some(kind) = document_type.required_unit_kind()
        && unit.kind != kind
    {
        return Err(CoreError::Validation {
            field: String::from("unit_id"),
            message: format!("{document_type} requires a {kind} unit, got {}", unit.kind),
        });
    }
    if !authorizer.can_access_unit(ctx.actor, unit) {
        return Err(CoreError::unauthorized(
            format!("create {document_type}"),
            format!("unit {} is outside the actor's access scope", unit.code),
        ));
    }

    match document_type {
        DocumentType::AssignmentAct | DocumentType::LodgingAssignmentAct => {
            if !unit.operational_state.accepts_assignment() {
                return Err(CoreError::conflict(format!(
                    "unit {} cannot be assigned while {}",
                    unit.code, unit.operational_state
                )));
            }
        }
        DocumentType::ReceiptAct | DocumentType::VacatingAct => {
            if !unit.is_occupied_by(ctx.titular.id) {
                return Err(CoreError::conflict(format!(
                    "user {} does not occupy unit {}",
                    ctx.titular.id, unit.code
                )));
            }
        }
        DocumentType::WorkOrderRequest => {
            if ctx.titular.assigned_unit(UnitKind::Housing) != Some(unit.id) {
                return Err(CoreError::conflict(format!(
                    "unit {} is not assigned to user {}",
                    unit.code, ctx.titular.id
                )));
            }
            let global: bool =
                authorizer.access_for(ctx.actor.role, UnitKind::Housing) == AccessScope::Global;
            if !global && ctx.actor.id != ctx.titular.id {
                return Err(CoreError::unauthorized(
                    "create work_order_request",
                    "work orders are filed by the unit holder",
                ));
            }
        }
        DocumentType::Application => {}
    }
    Ok(())
}

/// Plans the creation of a document.
///
/// Assignment and lodging-assignment acts are issued in the same plan, so
/// the returned document is in `pending-holder-signature` with `create`
/// then `issue` in its history.
///
/// # Errors
///
/// * `Unauthorized` if the actor may not initiate the type, or the unit is
///   outside their access scope.
/// * `Validation` for a wrong unit kind or mistyped source document.
/// * `StateConflict` if the titular is deactivated, the unit is not in a
///   suitable state, or the source document does not qualify.
pub fn apply_create(
    authorizer: &CapabilityAuthorizer,
    document_type: DocumentType,
    payload: &CreatePayload,
    ctx: &CreateContext<'_>,
) -> Result<TransitionResult, CoreError> {
    authorize_create(authorizer, ctx.actor, document_type)?;

    if !ctx.titular.is_active {
        return Err(CoreError::conflict(format!(
            "user {} is deactivated",
            ctx.titular.id
        )));
    }
    if document_type == DocumentType::Application
        && ctx.actor.role.is_occupant_class()
        && ctx.actor.id != ctx.titular.id
    {
        return Err(CoreError::unauthorized(
            "create application",
            "applicants may only apply for themselves",
        ));
    }
    check_create_unit(authorizer, document_type, ctx)?;
    check_source(document_type, payload, ctx.source)?;

    let machine: &StateMachine = StateMachine::for_type(document_type);
    let mut document = Document {
        id: None,
        document_type,
        sequence_number: None,
        state: machine.initial,
        titular: payload.titular,
        unit: payload.unit,
        source_document: payload.source_document,
        created_by: ctx.actor.id,
        payload: Value::Object(payload.details.clone()),
        history: Vec::new(),
        created_at: ctx.now,
        updated_at: ctx.now,
        version: 0,
    };
    document.record(history_entry(ctx.actor, "create", None, ctx.now));

    let mut audit_entries: Vec<AuditEntry> = vec![document_audit(
        ctx.actor,
        &document,
        "create",
        format!("created {document_type} in '{}'", machine.initial),
        ctx.now,
    )];

    if machine.initial == DocumentState::Draft {
        let edge: &Edge = machine.edge(DocumentState::Draft, Transition::Issue)?;
        if edge.party_for(ctx.actor.role).is_none() {
            return Err(CoreError::unauthorized(
                format!("issue {document_type}"),
                format!("role '{}' may not issue", ctx.actor.role),
            ));
        }
        audit_entries.push(advance(&mut document, edge, ctx.actor, None, &[], ctx.now));
    }

    debug!(
        document_type = %document_type,
        state = %document.state,
        "Planned document creation"
    );

    Ok(TransitionResult {
        document,
        units: Vec::new(),
        users: Vec::new(),
        audit_entries,
    })
}

fn check_party(
    authorizer: &CapabilityAuthorizer,
    edge: &Edge,
    ctx: &TransitionContext<'_>,
) -> Result<(), CoreError> {
    let action: String = format!("{} {}", edge.transition, ctx.document.document_type);
    let Some(party) = edge.party_for(ctx.actor.role) else {
        return Err(CoreError::unauthorized(
            action,
            format!("role '{}' is not permitted on this transition", ctx.actor.role),
        ));
    };

    let permitted: bool = match party {
        PartyRule::Titular => ctx.actor.id == ctx.document.titular,
        PartyRule::Creator => ctx.actor.id == ctx.document.created_by,
        PartyRule::Any => ctx.unit.map_or_else(
            || authorizer.access_for(ctx.actor.role, UnitKind::Housing) == AccessScope::Global,
            |unit| authorizer.can_access_unit(ctx.actor, unit),
        ),
    };
    if permitted {
        Ok(())
    } else {
        let reason: &str = match party {
            PartyRule::Titular => "only the titular may perform this transition",
            PartyRule::Creator => "only the document's creator may perform this transition",
            PartyRule::Any => "the document is outside the actor's access scope",
        };
        Err(CoreError::unauthorized(action, reason))
    }
}

fn apply_effect(
    edge: &Edge,
    payload: &TransitionPayload,
    ctx: &TransitionContext<'_>,
) -> Result<Option<LedgerChange>, CoreError> {
    if edge.effect == Effect::None && edge.guard == Guard::None {
        return Ok(None);
    }
    let unit: &Unit = ctx.unit.ok_or_else(|| CoreError::ConsistencyViolation {
        invariant: String::from("document-unit-reference"),
        detail: format!(
            "{} requires a unit but none is referenced",
            ctx.document.document_type
        ),
    })?;
    let today = ctx.now.date();

    if edge.guard == Guard::TitularOccupiesUnit && !unit.is_occupied_by(ctx.titular.id) {
        return Err(CoreError::conflict(format!(
            "user {} no longer occupies unit {}",
            ctx.titular.id, unit.code
        )));
    }

    match edge.effect {
        Effect::None => Ok(None),
        Effect::Assign(kind) => {
            if unit.kind != kind {
                return Err(CoreError::ConsistencyViolation {
                    invariant: String::from("document-unit-kind"),
                    detail: format!(
                        "{} references {} unit {}",
                        ctx.document.document_type, unit.kind, unit.code
                    ),
                });
            }
            let request = AssignRequest {
                effective_date: payload.effective_date.unwrap_or(today),
                expected_vacate_date: payload.expected_vacate_date,
                reason: payload
                    .reason
                    .clone()
                    .or_else(|| Some(ctx.document.document_type.to_string())),
                displace: payload.displace,
            };
            ledger::assign(unit, ctx.titular, ctx.current_occupant, &request).map(Some)
        }
        Effect::Vacate => ledger::vacate(
            unit,
            ctx.titular,
            payload.effective_date.unwrap_or(today),
            payload.reason.as_deref().unwrap_or(VACATED_REASON),
        )
        .map(Some),
    }
}

fn describe_change(change: &LedgerChange, effect: Effect) -> Vec<String> {
    let mut effects: Vec<String> = Vec::new();
    if let Some(displaced) = &change.displaced {
        effects.push(format!(
            "displaced user {} from {} unit {}",
            displaced.id, change.unit.kind, change.unit.code
        ));
    }
    match effect {
        Effect::Assign(kind) => effects.push(format!(
            "assigned {kind} unit {} to user {}",
            change.unit.code, change.occupant.id
        )),
        Effect::Vacate => effects.push(format!(
            "vacated user {} from {} unit {}",
            change.occupant.id, change.unit.kind, change.unit.code
        )),
        Effect::None => {}
    }
    effects
}

/// Plans firing `transition_name` on a document.
///
/// # Errors
///
/// * `StateConflict` if the name is unknown, the document is terminal, the
///   transition is not declared from its state, or a guard fails.
/// * `Unauthorized` if the actor's role is not listed on the edge, or the
///   actor is not the required party or lacks access to the unit.
/// * `Validation` for a malformed payload.
/// * `ConsistencyViolation` if the stored records are inconsistent.
pub fn apply_transition(
    authorizer: &CapabilityAuthorizer,
    transition_name: &str,
    payload: &Value,
    ctx: &TransitionContext<'_>,
) -> Result<TransitionResult, CoreError> {
    let machine: &StateMachine = StateMachine::for_type(ctx.document.document_type);
    if !machine.declares(ctx.document.state) {
        return Err(CoreError::ConsistencyViolation {
            invariant: String::from("document-state-in-machine"),
            detail: format!(
                "{} holds undeclared state '{}'",
                ctx.document.document_type, ctx.document.state
            ),
        });
    }

    let transition: Transition = transition_name.parse()?;
    let edge: &Edge = machine.edge(ctx.document.state, transition)?;

    require_active_actor(ctx.actor)?;
    check_party(authorizer, edge, ctx)?;

    let payload: TransitionPayload = TransitionPayload::parse(payload)?;
    let change: Option<LedgerChange> = apply_effect(edge, &payload, ctx)?;

    let mut document: Document = ctx.document.clone();
    let effects: Vec<String> = change
        .as_ref()
        .map(|c| describe_change(c, edge.effect))
        .unwrap_or_default();
    let audit_entry: AuditEntry = advance(
        &mut document,
        edge,
        ctx.actor,
        payload.note,
        &effects,
        ctx.now,
    );

    let (units, users): (Vec<Unit>, Vec<User>) = match change {
        Some(change) => {
            let mut users: Vec<User> = vec![change.occupant];
            users.extend(change.displaced);
            (vec![change.unit], users)
        }
        None => (Vec::new(), Vec::new()),
    };

    debug!(
        transition = %transition,
        to = %document.state,
        units = units.len(),
        users = users.len(),
        "Planned transition"
    );

    Ok(TransitionResult {
        document,
        units,
        users,
        audit_entries: vec![audit_entry],
    })
}

fn require_global(
    authorizer: &CapabilityAuthorizer,
    actor: &User,
    unit: &Unit,
    action: &str,
) -> Result<(), CoreError> {
    require_active_actor(actor)?;
    if authorizer.access_for(actor.role, unit.kind) == AccessScope::Global {
        Ok(())
    } else {
        Err(CoreError::unauthorized(
            action,
            format!("role '{}' lacks global {} access", actor.role, unit.kind),
        ))
    }
}

fn unit_audit(
    actor: &User,
    unit: &Unit,
    action: &str,
    details: String,
    now: OffsetDateTime,
) -> AuditEntry {
    AuditEntry::new(
        Actor::new(actor.id, actor.role),
        Cause::new(format!("unit:{}", unit.id), format!("{action} {}", unit.code)),
        Action::new(action.to_string(), Some(details)),
        unit_resource(unit.kind),
        Some(unit.id.value()),
        now,
    )
}

/// Plans setting the vacate-reminder flag on a unit's current occupancy.
///
/// Returns `Ok(None)` if the flag was already set.
///
/// # Errors
///
/// Returns `Unauthorized` without global access to the unit's kind, and
/// `StateConflict` if the unit has no occupant.
pub fn apply_mark_reminder(
    authorizer: &CapabilityAuthorizer,
    actor: &User,
    unit: &Unit,
    now: OffsetDateTime,
) -> Result<Option<UnitChangeResult>, CoreError> {
    require_global(authorizer, actor, unit, "mark-reminder-sent")?;
    let Some(new_unit) = ledger::mark_reminder_sent(unit)? else {
        return Ok(None);
    };
    let audit_entry: AuditEntry = unit_audit(
        actor,
        &new_unit,
        "mark-reminder-sent",
        format!("vacate reminder sent for unit {}", new_unit.code),
        now,
    );
    Ok(Some(UnitChangeResult {
        unit: new_unit,
        audit_entry,
    }))
}

/// Plans an administrative operational-state change.
///
/// Returns `Ok(None)` if the unit is already in `state`.
///
/// # Errors
///
/// Returns `Unauthorized` without global access to the unit's kind, and
/// `StateConflict` for changes that would break the occupancy invariant.
pub fn apply_unit_state(
    authorizer: &CapabilityAuthorizer,
    actor: &User,
    unit: &Unit,
    state: OperationalState,
    now: OffsetDateTime,
) -> Result<Option<UnitChangeResult>, CoreError> {
    require_global(authorizer, actor, unit, "set-unit-state")?;
    let Some(new_unit) = ledger::set_operational_state(unit, state)? else {
        return Ok(None);
    };
    let audit_entry: AuditEntry = unit_audit(
        actor,
        &new_unit,
        "set-unit-state",
        format!("{} -> {state}", unit.operational_state),
        now,
    );
    Ok(Some(UnitChangeResult {
        unit: new_unit,
        audit_entry,
    }))
}
