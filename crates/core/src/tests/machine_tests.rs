// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{CoreError, Effect, PartyRule, StateMachine, Transition};
use quarters_domain::{DocumentState, DocumentType, Role, UnitKind};

#[test]
fn test_terminal_states_have_no_outgoing_edges() {
    for document_type in DocumentType::ALL {
        let machine = StateMachine::for_type(document_type);
        for terminal in machine.terminal {
            assert_eq!(
                machine.outgoing(*terminal).count(),
                0,
                "{document_type} terminal state {terminal} has outgoing edges"
            );
        }
        assert!(!machine.is_terminal(machine.initial));
    }
}

#[test]
fn test_every_non_terminal_state_can_progress() {
    for document_type in DocumentType::ALL {
        let machine = StateMachine::for_type(document_type);
        for state in machine.states() {
            if !machine.is_terminal(state) {
                assert!(
                    machine.outgoing(state).count() > 0,
                    "{document_type} state {state} is a dead end"
                );
            }
        }
    }
}

#[test]
fn test_edge_names_are_unique_per_state() {
    for document_type in DocumentType::ALL {
        let machine = StateMachine::for_type(document_type);
        for state in machine.states() {
            let names: Vec<Transition> = machine.outgoing(state).map(|e| e.transition).collect();
            for (i, name) in names.iter().enumerate() {
                assert!(!names[i + 1..].contains(name));
            }
        }
    }
}

#[test]
fn test_assignment_closure_is_admin_general_only_and_assigns() {
    let machine = StateMachine::for_type(DocumentType::AssignmentAct);
    let edge = machine
        .edge(DocumentState::PendingAdminClosure, Transition::Close)
        .unwrap();

    assert_eq!(edge.to, DocumentState::Closed);
    assert_eq!(edge.effect, Effect::Assign(UnitKind::Housing));
    assert_eq!(edge.party_for(Role::AdminGeneral), Some(PartyRule::Any));
    assert_eq!(edge.party_for(Role::Admin), None);

    let lodging = StateMachine::for_type(DocumentType::LodgingAssignmentAct)
        .edge(DocumentState::PendingAdminClosure, Transition::Close)
        .unwrap();
    assert_eq!(lodging.effect, Effect::Assign(UnitKind::Lodging));
}

#[test]
fn test_signature_is_titular_only() {
    let edge = StateMachine::for_type(DocumentType::AssignmentAct)
        .edge(DocumentState::PendingHolderSignature, Transition::Sign)
        .unwrap();

    for role in Role::ALL {
        assert_eq!(edge.party_for(role), Some(PartyRule::Titular));
    }
}

#[test]
fn test_receipt_dispute_loop() {
    let machine = StateMachine::for_type(DocumentType::ReceiptAct);

    let dispute = machine
        .edge(DocumentState::PendingHolderAcknowledgement, Transition::Dispute)
        .unwrap();
    assert_eq!(dispute.to, DocumentState::UnderInspectorReview);

    let resubmit = machine
        .edge(DocumentState::UnderInspectorReview, Transition::Resubmit)
        .unwrap();
    assert_eq!(resubmit.to, DocumentState::PendingHolderAcknowledgement);
    assert_eq!(resubmit.party_for(Role::Inspector), Some(PartyRule::Creator));
}

#[test]
fn test_work_order_path() {
    let machine = StateMachine::for_type(DocumentType::WorkOrderRequest);

    assert_eq!(machine.initial, DocumentState::Open);
    assert!(machine.is_terminal(DocumentState::Rejected));
    assert!(machine.is_terminal(DocumentState::Closed));
    assert!(!machine.is_terminal(DocumentState::Approved));
    assert!(machine
        .edge(DocumentState::Approved, Transition::Close)
        .is_ok());
}

#[test]
fn test_undeclared_transition_is_a_state_conflict() {
    let machine = StateMachine::for_type(DocumentType::Application);

    assert!(matches!(
        machine.edge(DocumentState::UnderReview, Transition::Sign),
        Err(CoreError::StateConflict { .. })
    ));
    assert!(matches!(
        machine.edge(DocumentState::Approved, Transition::Annul),
        Err(CoreError::StateConflict { .. })
    ));
}

#[test]
fn test_transition_names_parse_exactly() {
    assert_eq!("start-review".parse::<Transition>(), Ok(Transition::StartReview));
    assert!(matches!(
        "start_review".parse::<Transition>(),
        Err(CoreError::StateConflict { .. })
    ));
}

#[test]
fn test_states_are_scoped_to_their_machine() {
    let application = StateMachine::for_type(DocumentType::Application);

    assert!(application.declares(DocumentState::UnderReview));
    assert!(!application.declares(DocumentState::Draft));
    assert!(StateMachine::for_type(DocumentType::AssignmentAct).declares(DocumentState::Draft));
}
