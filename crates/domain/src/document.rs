// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The workflow document envelope shared by every document type.

use crate::error::DomainError;
use crate::role::Role;
use crate::unit::{UnitId, UnitKind};
use crate::user::UserId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Identifier of a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(i64);

impl DocumentId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of institutional document (Anexo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Application for a unit (Anexo 01).
    Application,
    /// Housing assignment act (Anexo 02).
    AssignmentAct,
    /// Receipt act (Anexo 03).
    ReceiptAct,
    /// Work-order request (Anexo 11).
    WorkOrderRequest,
    /// Vacating act.
    VacatingAct,
    /// Lodging assignment act (Anexo 22).
    LodgingAssignmentAct,
}

impl DocumentType {
    /// Every document type.
    pub const ALL: [Self; 6] = [
        Self::Application,
        Self::AssignmentAct,
        Self::ReceiptAct,
        Self::WorkOrderRequest,
        Self::VacatingAct,
        Self::LodgingAssignmentAct,
    ];

    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::AssignmentAct => "assignment_act",
            Self::ReceiptAct => "receipt_act",
            Self::WorkOrderRequest => "work_order_request",
            Self::VacatingAct => "vacating_act",
            Self::LodgingAssignmentAct => "lodging_assignment_act",
        }
    }

    /// The resource kind a document of this type must reference, if it is
    /// tied to one specific kind.
    #[must_use]
    pub const fn required_unit_kind(&self) -> Option<UnitKind> {
        match self {
            Self::AssignmentAct | Self::ReceiptAct | Self::WorkOrderRequest => {
                Some(UnitKind::Housing)
            }
            Self::LodgingAssignmentAct => Some(UnitKind::Lodging),
            Self::Application | Self::VacatingAct => None,
        }
    }

    /// Returns true if documents of this type must reference a unit.
    #[must_use]
    pub const fn requires_unit(&self) -> bool {
        !matches!(self, Self::Application)
    }
}

impl FromStr for DocumentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::InvalidDocumentType(s.to_string()))
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every state any document machine may occupy.
///
/// Which of these a given document may hold is decided by its type's
/// state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentState {
    /// Application awaiting evaluation.
    UnderReview,
    /// Approved.
    Approved,
    /// Rejected.
    Rejected,
    /// Annulled before completion.
    Annulled,
    /// Created but not yet issued.
    Draft,
    /// Waiting for the titular to sign.
    PendingHolderSignature,
    /// Waiting for the administrative closure.
    PendingAdminClosure,
    /// Closed.
    Closed,
    /// Waiting for the holder to acknowledge a receipt.
    PendingHolderAcknowledgement,
    /// Disputed receipt under inspector review.
    UnderInspectorReview,
    /// Newly opened work order.
    Open,
}

impl DocumentState {
    const ALL: [Self; 11] = [
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Annulled,
        Self::Draft,
        Self::PendingHolderSignature,
        Self::PendingAdminClosure,
        Self::Closed,
        Self::PendingHolderAcknowledgement,
        Self::UnderInspectorReview,
        Self::Open,
    ];

    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnderReview => "under-review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Annulled => "annulled",
            Self::Draft => "draft",
            Self::PendingHolderSignature => "pending-holder-signature",
            Self::PendingAdminClosure => "pending-admin-closure",
            Self::Closed => "closed",
            Self::PendingHolderAcknowledgement => "pending-holder-acknowledgement",
            Self::UnderInspectorReview => "under-inspector-review",
            Self::Open => "open",
        }
    }
}

impl FromStr for DocumentState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| DomainError::InvalidDocumentState(s.to_string()))
    }
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a document's append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the action was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    /// Who performed the action.
    pub actor_id: UserId,
    /// The actor's role at that time.
    pub actor_role: Role,
    /// `create` or a transition name.
    pub action: String,
    /// Optional free-text note.
    pub note: Option<String>,
}

/// A workflow document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier; `None` until first persisted.
    pub id: Option<DocumentId>,
    /// The document type, which selects the state machine.
    pub document_type: DocumentType,
    /// Per-type sequential number; `None` until first persisted.
    pub sequence_number: Option<i64>,
    /// Current state.
    pub state: DocumentState,
    /// The subject of the document.
    pub titular: UserId,
    /// The unit involved, if any.
    pub unit: Option<UnitId>,
    /// The prior document in the same case, if any.
    pub source_document: Option<DocumentId>,
    /// The actor who created the document.
    pub created_by: UserId,
    /// Type-specific payload.
    pub payload: serde_json::Value,
    /// Append-only history.
    pub history: Vec<HistoryEntry>,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last modification timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl Document {
    /// Appends one history entry and bumps `updated_at`.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.updated_at = entry.recorded_at;
        self.history.push(entry);
    }
}
