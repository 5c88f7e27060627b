// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    as_actor, assignment_payload, close, current_actor, doc_id, fixture, load_unit, load_user,
    signed_assignment,
};
use crate::EngineError;
use quarters::DISPLACED_REASON;
use quarters_audit::ResourceType;
use quarters_domain::{
    DocumentState, DocumentType, HousingStatus, OperationalState, Role, TenureStatus,
};
use serde_json::json;
use time::macros::date;

#[test]
fn test_assignment_act_closes_into_occupancy() {
    let f = fixture();

    let created = f
        .engine
        .create(
            DocumentType::AssignmentAct,
            &as_actor(&f.admin),
            &assignment_payload(&f.u1, &f.k01),
        )
        .unwrap();
    assert_eq!(created.state, DocumentState::PendingHolderSignature);
    assert_eq!(created.sequence_number, Some(1));
    let actions: Vec<&str> = created.history.iter().map(|h| h.action.as_str()).collect();
    assert_eq!(actions, ["create", "issue"]);

    let signed = f
        .engine
        .fire(doc_id(&created), "sign", &as_actor(&f.u1), &json!({}))
        .unwrap();
    assert_eq!(signed.state, DocumentState::PendingAdminClosure);

    let closed = close(
        &f.engine,
        &f.admin_general,
        &signed,
        &json!({ "expected_vacate_date": "2028-03-01" }),
    );
    assert_eq!(closed.state, DocumentState::Closed);
    assert_eq!(closed.history.len(), 4);

    let k01 = load_unit(&f.engine, &f.k01);
    assert_eq!(k01.operational_state, OperationalState::Occupied);
    assert_eq!(k01.occupancy.occupant(), Some(f.u1.id));
    let occupancy = k01.occupancy.current().unwrap();
    assert_eq!(occupancy.assigned_on, date!(2026 - 03 - 02));
    assert_eq!(occupancy.expected_vacate_on, Some(date!(2028 - 03 - 01)));

    let u1 = load_user(&f.engine, &f.u1);
    assert_eq!(u1.assigned_housing_unit, Some(f.k01.id));
    assert_eq!(u1.housing_status, TenureStatus::Active);
    assert_eq!(u1.summary_status(), HousingStatus::UnitHolderActive);
    assert_eq!(u1.role, Role::UnitHolder);

    assert!(f.engine.verify_consistency().unwrap().is_consistent());
}

#[test]
fn test_every_step_is_audited_against_the_document() {
    let f = fixture();
    let signed = signed_assignment(&f.engine, &f.admin, &f.u1, &f.k01);
    close(&f.engine, &f.admin_general, &signed, &json!({}));

    let stored = f
        .engine
        .persistence()
        .unwrap()
        .audit_entries_for(ResourceType::Document, doc_id(&signed).value())
        .unwrap();
    let actions: Vec<&str> = stored.iter().map(|e| e.action.name.as_str()).collect();
    assert_eq!(actions, ["create", "issue", "sign", "close"]);
    assert!(stored.iter().all(|e| e.id.is_some()));

    // The sink saw exactly what was committed.
    let accepted = f.sink.accepted();
    assert_eq!(accepted, stored);
}

#[test]
fn test_second_assignment_without_displace_conflicts() {
    let f = fixture();
    let first = signed_assignment(&f.engine, &f.admin, &f.u1, &f.k01);
    close(&f.engine, &f.admin_general, &first, &json!({}));

    let second = signed_assignment(&f.engine, &f.admin, &f.u2, &f.k01);
    let before = f
        .engine
        .get(doc_id(&second), &as_actor(&f.admin))
        .unwrap();
    let result = f
        .engine
        .fire(doc_id(&second), "close", &as_actor(&f.admin_general), &json!({}));

    assert!(matches!(result, Err(EngineError::StateConflict { .. })));
    let k01 = load_unit(&f.engine, &f.k01);
    assert_eq!(k01.occupancy.occupant(), Some(f.u1.id));
    let after = f
        .engine
        .get(doc_id(&second), &as_actor(&f.admin))
        .unwrap();
    assert_eq!(after, before);
    assert_eq!(load_user(&f.engine, &f.u2).housing_status, TenureStatus::None);
}

#[test]
fn test_displacement_moves_the_unit_to_the_new_titular() {
    let f = fixture();
    let first = signed_assignment(&f.engine, &f.admin, &f.u1, &f.k01);
    close(&f.engine, &f.admin_general, &first, &json!({}));
    let second = signed_assignment(&f.engine, &f.admin, &f.u2, &f.k01);

    let closed = close(
        &f.engine,
        &f.admin_general,
        &second,
        &json!({ "displace": true, "effective_date": "2026-03-10" }),
    );

    assert_eq!(closed.state, DocumentState::Closed);
    let k01 = load_unit(&f.engine, &f.k01);
    assert_eq!(k01.occupancy.occupant(), Some(f.u2.id));
    let history = k01.occupancy.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].occupant, f.u1.id);
    assert_eq!(history[0].reason, DISPLACED_REASON);
    assert_eq!(history[0].exited_on, date!(2026 - 03 - 10));

    let u1 = load_user(&f.engine, &f.u1);
    assert_eq!(u1.assigned_housing_unit, None);
    assert_eq!(u1.housing_status, TenureStatus::None);
    assert_eq!(u1.role, Role::Applicant);
    let u2 = load_user(&f.engine, &f.u2);
    assert_eq!(u2.assigned_housing_unit, Some(f.k01.id));
    assert_eq!(u2.role, Role::UnitHolder);

    assert!(f.engine.verify_consistency().unwrap().is_consistent());
}

#[test]
fn test_vacating_act_frees_the_unit() {
    let f = fixture();
    let assignment = signed_assignment(&f.engine, &f.admin, &f.u1, &f.k01);
    close(&f.engine, &f.admin_general, &assignment, &json!({}));

    let vacating = f
        .engine
        .create(
            DocumentType::VacatingAct,
            &as_actor(&f.admin),
            &assignment_payload(&f.u1, &f.k01),
        )
        .unwrap();
    assert_eq!(vacating.state, DocumentState::PendingHolderSignature);
    let signed = f
        .engine
        .fire(
            doc_id(&vacating),
            "sign",
            &current_actor(&f.engine, f.u1.id),
            &json!({}),
        )
        .unwrap();
    let closed = close(
        &f.engine,
        &f.admin_general,
        &signed,
        &json!({ "effective_date": "2026-04-30", "reason": "transfer" }),
    );

    assert_eq!(closed.state, DocumentState::Closed);
    let k01 = load_unit(&f.engine, &f.k01);
    assert_eq!(k01.operational_state, OperationalState::Available);
    assert!(!k01.occupancy.is_occupied());
    assert_eq!(k01.occupancy.history()[0].reason, "transfer");
    assert_eq!(
        k01.occupancy.history()[0].exited_on,
        date!(2026 - 04 - 30)
    );

    let u1 = load_user(&f.engine, &f.u1);
    assert_eq!(u1.assigned_housing_unit, None);
    assert_eq!(u1.summary_status(), HousingStatus::NoUnit);
    assert_eq!(u1.role, Role::Applicant);
}

#[test]
fn test_sequence_numbers_are_per_document_type() {
    let f = fixture();
    let first = signed_assignment(&f.engine, &f.admin, &f.u1, &f.k01);
    let second = signed_assignment(&f.engine, &f.admin, &f.u2, &f.k01);
    let application = f
        .engine
        .create(
            DocumentType::Application,
            &as_actor(&f.u1),
            &json!({
                "titular_id": f.u1.id.value(),
                "details": { "personal_data": { "rank": "cabo" } }
            }),
        )
        .unwrap();

    assert_eq!(first.sequence_number, Some(1));
    assert_eq!(second.sequence_number, Some(2));
    assert_eq!(application.sequence_number, Some(1));
    assert_eq!(application.state, DocumentState::UnderReview);
}
