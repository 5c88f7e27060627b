// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Caller-supplied payloads for document creation and transitions.
//!
//! Payloads arrive as JSON from an outer layer. They are parsed into typed
//! structures here, once, so that nothing downstream inspects raw JSON
//! except the free-form `details` stored on the document.

use crate::dates::iso_date;
use crate::document::{DocumentId, DocumentType};
use crate::error::DomainError;
use crate::unit::UnitId;
use crate::user::UserId;
use serde::Deserialize;
use serde_json::{Map, Value};
use time::Date;

/// Wire shape of a creation payload.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateRequest {
    titular_id: Option<i64>,
    #[serde(default)]
    unit_id: Option<i64>,
    #[serde(default)]
    source_document_id: Option<i64>,
    #[serde(default)]
    details: Option<Map<String, Value>>,
}

/// Parsed payload for `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePayload {
    /// The subject of the new document.
    pub titular: UserId,
    /// The unit involved, if any.
    pub unit: Option<UnitId>,
    /// The prior document in the same case, if any.
    pub source_document: Option<DocumentId>,
    /// Type-specific details, stored verbatim.
    pub details: Map<String, Value>,
}

impl CreatePayload {
    /// Parses and validates a creation payload for `document_type`.
    ///
    /// Recognized envelope keys are `titular_id`, `unit_id`,
    /// `source_document_id` and `details`; any other key is rejected.
    /// Everything under `details` is kept as the document's payload after
    /// per-type required fields are checked.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayload` if the payload does not match
    /// the envelope, an identifier is missing or not positive, or a
    /// required detail is absent.
    pub fn parse(document_type: DocumentType, value: &Value) -> Result<Self, DomainError> {
        let request: CreateRequest = decode(value)?;

        let titular = UserId::new(
            positive_id("titular_id", request.titular_id)?
                .ok_or_else(|| invalid("titular_id", "is required"))?,
        );
        let unit = positive_id("unit_id", request.unit_id)?.map(UnitId::new);
        let source_document =
            positive_id("source_document_id", request.source_document_id)?.map(DocumentId::new);

        if document_type.requires_unit() && unit.is_none() {
            return Err(invalid(
                "unit_id",
                &format!("is required for {document_type}"),
            ));
        }

        let details: Map<String, Value> = request.details.unwrap_or_default();
        validate_details(document_type, &details)?;

        Ok(Self {
            titular,
            unit,
            source_document,
            details,
        })
    }
}

fn validate_details(
    document_type: DocumentType,
    details: &Map<String, Value>,
) -> Result<(), DomainError> {
    match document_type {
        DocumentType::Application => require_object(details, "personal_data"),
        DocumentType::ReceiptAct => require_object(details, "meter_readings"),
        DocumentType::WorkOrderRequest => match details.get("description") {
            Some(Value::String(text)) if !text.trim().is_empty() => Ok(()),
            _ => Err(invalid(
                "details.description",
                "a non-empty description is required",
            )),
        },
        DocumentType::AssignmentAct
        | DocumentType::LodgingAssignmentAct
        | DocumentType::VacatingAct => Ok(()),
    }
}

fn require_object(details: &Map<String, Value>, key: &str) -> Result<(), DomainError> {
    match details.get(key) {
        Some(Value::Object(_)) => Ok(()),
        _ => Err(invalid(&format!("details.{key}"), "must be an object")),
    }
}

/// Parsed payload for `fire`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransitionPayload {
    /// Note recorded in the document history.
    pub note: Option<String>,
    /// Whether a closure may displace the unit's current occupant.
    pub displace: bool,
    /// Date an occupancy change takes effect.
    #[serde(with = "iso_date::option")]
    pub effective_date: Option<Date>,
    /// Expected vacate date for a new occupancy.
    #[serde(with = "iso_date::option")]
    pub expected_vacate_date: Option<Date>,
    /// Reason recorded with an occupancy change.
    pub reason: Option<String>,
}

impl TransitionPayload {
    /// Parses a transition payload. `null` is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayload` for unknown keys, wrongly typed
    /// fields, malformed dates, or an expected vacate date before the
    /// effective date.
    pub fn parse(value: &Value) -> Result<Self, DomainError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let payload: Self = decode(value)?;

        if let (Some(start), Some(end)) = (payload.effective_date, payload.expected_vacate_date)
            && end < start
        {
            return Err(invalid(
                "expected_vacate_date",
                "must not precede effective_date",
            ));
        }

        Ok(payload)
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, DomainError> {
    T::deserialize(value).map_err(|e| invalid("payload", &e.to_string()))
}

fn invalid(field: &str, message: &str) -> DomainError {
    DomainError::InvalidPayload {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn positive_id(field: &str, id: Option<i64>) -> Result<Option<i64>, DomainError> {
    match id {
        Some(id) if id <= 0 => Err(invalid(field, "must be a positive integer")),
        other => Ok(other),
    }
}
