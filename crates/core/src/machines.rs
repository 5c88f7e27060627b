// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-document-type state machines.
//!
//! Each machine is static data: an initial state, its terminal states and
//! every legal edge. An edge names the roles that may fire it, an optional
//! party restriction per role, a structural guard and a side effect. A
//! transition not declared on the current state does not exist.

use crate::error::CoreError;
use quarters_domain::{DocumentState, DocumentType, Role, UnitKind};
use std::str::FromStr;
use DocumentState::{
    Annulled, Approved, Closed, Draft, Open, PendingAdminClosure, PendingHolderAcknowledgement,
    PendingHolderSignature, Rejected, UnderInspectorReview, UnderReview,
};

/// Names of document transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Moves a freshly created act into signature.
    Issue,
    /// Signature by the titular.
    Sign,
    /// Administrative closure.
    Close,
    /// Annulment before completion.
    Annul,
    /// Approval.
    Approve,
    /// Rejection.
    Reject,
    /// Holder acknowledges a receipt.
    Acknowledge,
    /// Holder disputes a receipt.
    Dispute,
    /// Inspector resubmits a disputed receipt.
    Resubmit,
    /// Work order enters review.
    StartReview,
}

impl Transition {
    const ALL: [Self; 10] = [
        Self::Issue,
        Self::Sign,
        Self::Close,
        Self::Annul,
        Self::Approve,
        Self::Reject,
        Self::Acknowledge,
        Self::Dispute,
        Self::Resubmit,
        Self::StartReview,
    ];

    /// Returns the transition name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Sign => "sign",
            Self::Close => "close",
            Self::Annul => "annul",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Acknowledge => "acknowledge",
            Self::Dispute => "dispute",
            Self::Resubmit => "resubmit",
            Self::StartReview => "start-review",
        }
    }
}

impl FromStr for Transition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::conflict(format!("no transition named '{s}' exists")))
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who, among holders of a listed role, may fire an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRule {
    /// Any holder of the role, within their access scope.
    Any,
    /// Only the document's titular.
    Titular,
    /// Only the document's creator.
    Creator,
}

/// One role permitted on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRole {
    /// The permitted role.
    pub role: Role,
    /// Party restriction for that role.
    pub party: PartyRule,
}

const fn any(role: Role) -> EdgeRole {
    EdgeRole {
        role,
        party: PartyRule::Any,
    }
}

const fn titular(role: Role) -> EdgeRole {
    EdgeRole {
        role,
        party: PartyRule::Titular,
    }
}

const TITULAR_ANY_ROLE: &[EdgeRole] = &[
    titular(Role::Applicant),
    titular(Role::UnitHolder),
    titular(Role::LodgedOccupant),
    titular(Role::Inspector),
    titular(Role::DistrictChief),
    titular(Role::Admin),
    titular(Role::AdminGeneral),
];
const ADMINS: &[EdgeRole] = &[any(Role::Admin), any(Role::AdminGeneral)];
const ADMIN_GENERAL: &[EdgeRole] = &[any(Role::AdminGeneral)];

/// Structural precondition evaluated against referenced records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// No precondition.
    None,
    /// The unit can take the titular as occupant (displacement aside).
    OccupancyAvailable,
    /// The titular is the unit's current occupant.
    TitularOccupiesUnit,
}

/// Occupancy side effect applied when an edge fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// No side effect.
    None,
    /// Assign the titular to the unit.
    Assign(UnitKind),
    /// Vacate the titular from the unit.
    Vacate,
}

/// A legal edge of a state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Originating state.
    pub from: DocumentState,
    /// Transition name.
    pub transition: Transition,
    /// Destination state.
    pub to: DocumentState,
    /// Roles that may fire the edge.
    pub roles: &'static [EdgeRole],
    /// Precondition.
    pub guard: Guard,
    /// Side effect.
    pub effect: Effect,
}

impl Edge {
    /// The party rule for `role`, or `None` if the role is not listed.
    #[must_use]
    pub fn party_for(&self, role: Role) -> Option<PartyRule> {
        self.roles.iter().find(|r| r.role == role).map(|r| r.party)
    }
}

const fn edge(
    from: DocumentState,
    transition: Transition,
    to: DocumentState,
    roles: &'static [EdgeRole],
) -> Edge {
    Edge {
        from,
        transition,
        to,
        roles,
        guard: Guard::None,
        effect: Effect::None,
    }
}

/// A document type's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMachine {
    /// The type this machine governs.
    pub document_type: DocumentType,
    /// State at creation.
    pub initial: DocumentState,
    /// States with no outgoing edges.
    pub terminal: &'static [DocumentState],
    /// Every legal edge.
    pub edges: &'static [Edge],
}

const APPLICATION: StateMachine = StateMachine {
    document_type: DocumentType::Application,
    initial: UnderReview,
    terminal: &[Approved, Rejected, Annulled],
    edges: &[
        edge(UnderReview, Transition::Approve, Approved, ADMINS),
        edge(UnderReview, Transition::Reject, Rejected, ADMINS),
        edge(
            UnderReview,
            Transition::Annul,
            Annulled,
            &[titular(Role::Applicant), any(Role::AdminGeneral)],
        ),
    ],
};

const ASSIGNMENT_ACT: StateMachine = StateMachine {
    document_type: DocumentType::AssignmentAct,
    initial: Draft,
    terminal: &[Closed, Annulled],
    edges: &[
        edge(Draft, Transition::Issue, PendingHolderSignature, ADMINS),
        edge(
            PendingHolderSignature,
            Transition::Sign,
            PendingAdminClosure,
            TITULAR_ANY_ROLE,
        ),
        Edge {
            guard: Guard::OccupancyAvailable,
            effect: Effect::Assign(UnitKind::Housing),
            ..edge(PendingAdminClosure, Transition::Close, Closed, ADMIN_GENERAL)
        },
        edge(PendingHolderSignature, Transition::Annul, Annulled, ADMIN_GENERAL),
        edge(PendingAdminClosure, Transition::Annul, Annulled, ADMIN_GENERAL),
    ],
};

const LODGING_ASSIGNMENT_ACT: StateMachine = StateMachine {
    document_type: DocumentType::LodgingAssignmentAct,
    initial: Draft,
    terminal: &[Closed, Annulled],
    edges: &[
        edge(Draft, Transition::Issue, PendingHolderSignature, ADMINS),
        edge(
            PendingHolderSignature,
            Transition::Sign,
            PendingAdminClosure,
            TITULAR_ANY_ROLE,
        ),
        Edge {
            guard: Guard::OccupancyAvailable,
            effect: Effect::Assign(UnitKind::Lodging),
            ..edge(PendingAdminClosure, Transition::Close, Closed, ADMIN_GENERAL)
        },
        edge(PendingHolderSignature, Transition::Annul, Annulled, ADMIN_GENERAL),
        edge(PendingAdminClosure, Transition::Annul, Annulled, ADMIN_GENERAL),
    ],
};

const RECEIPT_ACT: StateMachine = StateMachine {
    document_type: DocumentType::ReceiptAct,
    initial: PendingHolderAcknowledgement,
    terminal: &[Closed],
    edges: &[
        edge(
            PendingHolderAcknowledgement,
            Transition::Acknowledge,
            PendingAdminClosure,
            TITULAR_ANY_ROLE,
        ),
        edge(
            PendingHolderAcknowledgement,
            Transition::Dispute,
            UnderInspectorReview,
            TITULAR_ANY_ROLE,
        ),
        edge(
            UnderInspectorReview,
            Transition::Resubmit,
            PendingHolderAcknowledgement,
            &[EdgeRole {
                role: Role::Inspector,
                party: PartyRule::Creator,
            }],
        ),
        edge(PendingAdminClosure, Transition::Close, Closed, ADMINS),
    ],
};

const WORK_ORDER_REQUEST: StateMachine = StateMachine {
    document_type: DocumentType::WorkOrderRequest,
    initial: Open,
    terminal: &[Rejected, Closed],
    edges: &[
        edge(
            Open,
            Transition::StartReview,
            UnderReview,
            &[any(Role::Inspector), any(Role::DistrictChief)],
        ),
        edge(
            UnderReview,
            Transition::Approve,
            Approved,
            &[
                any(Role::DistrictChief),
                any(Role::Admin),
                any(Role::AdminGeneral),
            ],
        ),
        edge(
            UnderReview,
            Transition::Reject,
            Rejected,
            &[
                any(Role::DistrictChief),
                any(Role::Admin),
                any(Role::AdminGeneral),
            ],
        ),
        edge(Approved, Transition::Close, Closed, ADMINS),
    ],
};

const VACATING_ACT: StateMachine = StateMachine {
    document_type: DocumentType::VacatingAct,
    initial: PendingHolderSignature,
    terminal: &[Closed, Annulled],
    edges: &[
        edge(
            PendingHolderSignature,
            Transition::Sign,
            PendingAdminClosure,
            TITULAR_ANY_ROLE,
        ),
        Edge {
            guard: Guard::TitularOccupiesUnit,
            effect: Effect::Vacate,
            ..edge(PendingAdminClosure, Transition::Close, Closed, ADMIN_GENERAL)
        },
        edge(PendingHolderSignature, Transition::Annul, Annulled, ADMIN_GENERAL),
        edge(PendingAdminClosure, Transition::Annul, Annulled, ADMIN_GENERAL),
    ],
};

impl StateMachine {
    /// Returns the machine governing `document_type`.
    #[must_use]
    pub const fn for_type(document_type: DocumentType) -> &'static Self {
        match document_type {
            DocumentType::Application => &APPLICATION,
            DocumentType::AssignmentAct => &ASSIGNMENT_ACT,
            DocumentType::ReceiptAct => &RECEIPT_ACT,
            DocumentType::WorkOrderRequest => &WORK_ORDER_REQUEST,
            DocumentType::VacatingAct => &VACATING_ACT,
            DocumentType::LodgingAssignmentAct => &LODGING_ASSIGNMENT_ACT,
        }
    }

    /// Returns true if `state` is terminal for this machine.
    #[must_use]
    pub fn is_terminal(&self, state: DocumentState) -> bool {
        self.terminal.contains(&state)
    }

    /// Every state the machine can hold, initial first.
    #[must_use]
    pub fn states(&self) -> Vec<DocumentState> {
        let mut states: Vec<DocumentState> = vec![self.initial];
        for e in self.edges {
            for state in [e.from, e.to] {
                if !states.contains(&state) {
                    states.push(state);
                }
            }
        }
        states
    }

    /// Returns true if `state` belongs to this machine.
    #[must_use]
    pub fn declares(&self, state: DocumentState) -> bool {
        self.states().contains(&state)
    }

    /// Edges leaving `state`.
    pub fn outgoing(&self, state: DocumentState) -> impl Iterator<Item = &'static Edge> + use<> {
        let edges: &'static [Edge] = self.edges;
        edges.iter().filter(move |e| e.from == state)
    }

    /// Resolves `transition` from `state`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StateConflict` if the state is terminal or has
    /// no edge with that name.
    pub fn edge(
        &self,
        state: DocumentState,
        transition: Transition,
    ) -> Result<&'static Edge, CoreError> {
        if self.is_terminal(state) {
            return Err(CoreError::conflict(format!(
                "{} is in terminal state '{state}'",
                self.document_type
            )));
        }
        self.outgoing(state)
            .find(|e| e.transition == transition)
            .ok_or_else(|| {
                CoreError::conflict(format!(
                    "transition '{transition}' is not declared from '{state}' for {}",
                    self.document_type
                ))
            })
    }
}
