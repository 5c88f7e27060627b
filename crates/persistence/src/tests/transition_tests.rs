// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{NOW, fixture, plan_assignment};
use crate::PersistenceError;
use crate::mutations::registration::register_user;
use quarters::{CapabilityAuthorizer, TransitionContext, TransitionResult, apply_transition};
use quarters_audit::ResourceType;
use quarters_domain::{DocumentState, Role, UserId};
use serde_json::json;

#[test]
fn test_new_document_gets_id_sequence_and_bound_audit_entries() {
    let mut f = fixture();
    let plan = plan_assignment(&f.admin, &f.applicant, &f.unit);

    let stored: TransitionResult = f.db.atomically(|tx| tx.write_transition(&plan)).unwrap();

    let id = stored.document.id.unwrap();
    assert_eq!(stored.document.sequence_number, Some(1));
    assert_eq!(stored.document.version, 1);
    assert_eq!(stored.document.state, DocumentState::PendingHolderSignature);
    assert_eq!(stored.audit_entries.len(), 2);
    for entry in &stored.audit_entries {
        assert!(entry.id.is_some());
        assert_eq!(entry.resource_type, ResourceType::Document);
        assert_eq!(entry.resource_id, Some(id.value()));
        assert_eq!(entry.cause.id, format!("document:{id}"));
    }

    assert_eq!(f.db.get_document(id).unwrap(), stored.document);
    assert_eq!(f.db.list_audit_entries().unwrap(), stored.audit_entries);
    assert_eq!(
        f.db.audit_entries_for(ResourceType::Document, id.value())
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_sequence_numbers_are_per_type() {
    let mut f = fixture();
    let first = plan_assignment(&f.admin, &f.applicant, &f.unit);
    let second = plan_assignment(&f.admin_general, &f.applicant, &f.unit);

    let a = f.db.atomically(|tx| tx.write_transition(&first)).unwrap();
    let b = f.db.atomically(|tx| tx.write_transition(&second)).unwrap();

    assert_eq!(a.document.sequence_number, Some(1));
    assert_eq!(b.document.sequence_number, Some(2));
}

#[test]
fn test_transition_appends_history_and_bumps_version() {
    let mut f = fixture();
    let plan = plan_assignment(&f.admin, &f.applicant, &f.unit);
    let stored = f.db.atomically(|tx| tx.write_transition(&plan)).unwrap();

    let signed = apply_transition(
        &CapabilityAuthorizer::builtin(),
        "sign",
        &json!({ "note": "read and agreed" }),
        &TransitionContext {
            actor: &f.applicant,
            document: &stored.document,
            titular: &f.applicant,
            unit: Some(&f.unit),
            current_occupant: None,
            now: NOW,
        },
    )
    .unwrap();
    let written = f.db.atomically(|tx| tx.write_transition(&signed)).unwrap();

    assert_eq!(written.document.version, 2);
    let reloaded = f.db.get_document(written.document.id.unwrap()).unwrap();
    assert_eq!(reloaded, written.document);
    assert_eq!(reloaded.state, DocumentState::PendingAdminClosure);
    let actions: Vec<&str> = reloaded.history.iter().map(|h| h.action.as_str()).collect();
    assert_eq!(actions, ["create", "issue", "sign"]);
    assert_eq!(reloaded.history[2].note.as_deref(), Some("read and agreed"));
}

#[test]
fn test_stale_document_write_conflicts() {
    let mut f = fixture();
    let plan = plan_assignment(&f.admin, &f.applicant, &f.unit);
    let stored = f.db.atomically(|tx| tx.write_transition(&plan)).unwrap();
    let ctx = TransitionContext {
        actor: &f.applicant,
        document: &stored.document,
        titular: &f.applicant,
        unit: Some(&f.unit),
        current_occupant: None,
        now: NOW,
    };
    let signed = apply_transition(&CapabilityAuthorizer::builtin(), "sign", &json!({}), &ctx)
        .unwrap();
    f.db.atomically(|tx| tx.write_transition(&signed)).unwrap();

    // Same plan again, still carrying the version it was loaded with.
    let again = f.db.atomically(|tx| tx.write_transition(&signed));

    assert!(matches!(
        again,
        Err(PersistenceError::VersionConflict { expected_version: 1, .. })
    ));
    let entries = f.db.list_audit_entries().unwrap();
    assert_eq!(entries.len(), 3);
}

#[test]
fn test_failed_closure_rolls_back_every_write() {
    let mut f = fixture();
    let plan = plan_assignment(&f.admin, &f.applicant, &f.unit);

    let result: Result<(), PersistenceError> = f.db.atomically(|tx| {
        tx.write_transition(&plan)?;
        register_user(tx.conn, "Ghost", Role::Applicant, None)?;
        Err(PersistenceError::QueryFailed(String::from("injected")))
    });

    assert!(matches!(result, Err(PersistenceError::QueryFailed(_))));
    assert!(f.db.list_audit_entries().unwrap().is_empty());
    let (users, _) = f.db.snapshot().unwrap();
    assert_eq!(users.len(), 3);
    assert!(matches!(
        f.db.get_user(UserId::new(4)),
        Err(PersistenceError::NotFound { .. })
    ));
}
