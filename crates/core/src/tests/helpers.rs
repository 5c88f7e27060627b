// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{CapabilityAuthorizer, CreateContext, TransitionContext, TransitionResult, apply_create};
use quarters_domain::{
    CreatePayload, District, Document, DocumentId, DocumentType, Occupancy, OccupancyRecord,
    OperationalState, Role, TenureStatus, Unit, UnitId, UnitKind, User, UserId,
};
use serde_json::json;
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub const NOW: OffsetDateTime = datetime!(2026-03-02 09:30 UTC);

pub fn create_test_user(id: i64, role: Role) -> User {
    User {
        id: UserId::new(id),
        display_name: format!("User {id}"),
        role,
        district: role.requires_district().then(|| District::new("Norte")),
        housing_status: TenureStatus::None,
        lodging_status: TenureStatus::None,
        assigned_housing_unit: None,
        assigned_lodging_unit: None,
        is_active: true,
        version: 1,
    }
}

pub fn create_test_unit(id: i64, kind: UnitKind, code: &str) -> Unit {
    Unit {
        id: UnitId::new(id),
        kind,
        code: code.to_string(),
        district: District::new("Norte"),
        description: String::from("Test unit"),
        operational_state: OperationalState::Available,
        occupancy: OccupancyRecord::vacant(),
        version: 1,
    }
}

/// Puts `user` into `unit` the way a completed closure would have.
pub fn occupy(unit: &mut Unit, user: &mut User) {
    unit.occupancy
        .open(
            unit.id,
            Occupancy::new(user.id, date!(2025 - 06 - 01), Some(date!(2026 - 05 - 01)), None),
        )
        .unwrap();
    unit.operational_state = OperationalState::Occupied;
    user.begin_tenure(unit.kind, unit.id);
}

pub fn admin() -> User {
    create_test_user(1, Role::Admin)
}

pub fn admin_general() -> User {
    create_test_user(2, Role::AdminGeneral)
}

pub fn persisted(mut document: Document, id: i64) -> Document {
    document.id = Some(DocumentId::new(id));
    document.sequence_number = Some(id);
    document.version = 1;
    document
}

/// Creates an assignment act for `titular` on `unit` as `actor` and
/// returns it as if stored with id 100.
pub fn issued_assignment(actor: &User, titular: &User, unit: &Unit) -> Document {
    let document_type = match unit.kind {
        UnitKind::Housing => DocumentType::AssignmentAct,
        UnitKind::Lodging => DocumentType::LodgingAssignmentAct,
    };
    let payload = CreatePayload::parse(
        document_type,
        &json!({ "titular_id": titular.id.value(), "unit_id": unit.id.value() }),
    )
    .unwrap();
    let result: TransitionResult = apply_create(
        &CapabilityAuthorizer::builtin(),
        document_type,
        &payload,
        &CreateContext {
            actor,
            titular,
            unit: Some(unit),
            source: None,
            now: NOW,
        },
    )
    .unwrap();
    persisted(result.document, 100)
}

pub fn transition_context<'a>(
    actor: &'a User,
    document: &'a Document,
    titular: &'a User,
    unit: Option<&'a Unit>,
) -> TransitionContext<'a> {
    TransitionContext {
        actor,
        document,
        titular,
        unit,
        current_occupant: None,
        now: NOW,
    }
}
