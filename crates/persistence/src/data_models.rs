// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and their conversion to and from domain values.
//!
//! Enumerations are stored as their `as_str` text, dates as `YYYY-MM-DD`
//! and timestamps as RFC 3339. Decoding failures surface as
//! `PersistenceError::CorruptRecord` naming the row.

use diesel::prelude::*;
use quarters_audit::{Action, Actor, AuditEntry, Cause, ResourceType};
use quarters_domain::{
    ClosedOccupancy, District, Document, DocumentId, DocumentState, DocumentType, HistoryEntry,
    Occupancy, OccupancyRecord, OperationalState, Role, TenureStatus, Unit, UnitId, UnitKind, User,
    UserId, format_date, parse_date,
};
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::diesel_schema::{
    audit_entries, document_history, documents, occupancy_history, units, users,
};
use crate::error::PersistenceError;

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns `SerializationError` if the timestamp has no RFC 3339 form.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, PersistenceError> {
    value
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

fn parse_timestamp(resource: &str, id: i64, value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::corrupt(resource, id, format!("timestamp '{value}': {e}")))
}

fn parse_field<T>(resource: &str, id: i64, value: &str) -> Result<T, PersistenceError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| PersistenceError::corrupt(resource, id, e))
}

fn parse_stored_date(resource: &str, id: i64, value: &str) -> Result<time::Date, PersistenceError> {
    parse_date(value).map_err(|e| PersistenceError::corrupt(resource, id, e))
}

/// A `users` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub user_id: i64,
    pub display_name: String,
    pub role: String,
    pub district: Option<String>,
    pub housing_status: String,
    pub lodging_status: String,
    pub assigned_housing_unit_id: Option<i64>,
    pub assigned_lodging_unit_id: Option<i64>,
    pub is_active: i32,
    pub version: i64,
}

impl UserRow {
    /// Decodes the row into a domain user.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` if a stored enumeration is unknown.
    pub fn into_domain(self) -> Result<User, PersistenceError> {
        let id: i64 = self.user_id;
        Ok(User {
            id: UserId::new(id),
            display_name: self.display_name,
            role: parse_field::<Role>("user", id, &self.role)?,
            district: self.district.as_deref().map(District::new),
            housing_status: parse_field::<TenureStatus>("user", id, &self.housing_status)?,
            lodging_status: parse_field::<TenureStatus>("user", id, &self.lodging_status)?,
            assigned_housing_unit: self.assigned_housing_unit_id.map(UnitId::new),
            assigned_lodging_unit: self.assigned_lodging_unit_id.map(UnitId::new),
            is_active: self.is_active != 0,
            version: self.version,
        })
    }
}

/// Column values written when a user's tenure or activation changes.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct UserChanges<'a> {
    pub role: &'a str,
    pub housing_status: &'a str,
    pub lodging_status: &'a str,
    pub assigned_housing_unit_id: Option<i64>,
    pub assigned_lodging_unit_id: Option<i64>,
    pub is_active: i32,
    pub version: i64,
}

impl<'a> UserChanges<'a> {
    /// Builds the changeset for `user`, bumping its version.
    #[must_use]
    pub fn from_user(user: &'a User) -> Self {
        Self {
            role: user.role.as_str(),
            housing_status: user.housing_status.as_str(),
            lodging_status: user.lodging_status.as_str(),
            assigned_housing_unit_id: user.assigned_housing_unit.map(|u| u.value()),
            assigned_lodging_unit_id: user.assigned_lodging_unit.map(|u| u.value()),
            is_active: i32::from(user.is_active),
            version: user.version + 1,
        }
    }
}

/// A new `users` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub display_name: &'a str,
    pub role: &'a str,
    pub district: Option<&'a str>,
}

/// A `units` row. The closed history is loaded separately.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = units)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UnitRow {
    pub unit_id: i64,
    pub kind: String,
    pub code: String,
    pub district: String,
    pub description: String,
    pub operational_state: String,
    pub occupant_user_id: Option<i64>,
    pub assigned_on: Option<String>,
    pub expected_vacate_on: Option<String>,
    pub reminder_sent: i32,
    pub occupancy_reason: Option<String>,
    pub version: i64,
}

impl UnitRow {
    /// Decodes the row, attaching the closed occupancy history.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` if a stored value cannot be decoded or an
    /// occupant is recorded without an assignment date.
    pub fn into_domain(self, history: Vec<ClosedOccupancy>) -> Result<Unit, PersistenceError> {
        let id: i64 = self.unit_id;
        let current: Option<Occupancy> = match (self.occupant_user_id, self.assigned_on) {
            (Some(occupant), Some(assigned_on)) => Some(Occupancy {
                occupant: UserId::new(occupant),
                assigned_on: parse_stored_date("unit", id, &assigned_on)?,
                expected_vacate_on: self
                    .expected_vacate_on
                    .as_deref()
                    .map(|d| parse_stored_date("unit", id, d))
                    .transpose()?,
                reminder_sent: self.reminder_sent != 0,
                reason: self.occupancy_reason,
            }),
            (None, None) => None,
            _ => {
                return Err(PersistenceError::corrupt(
                    "unit",
                    id,
                    "occupant and assignment date must be set together",
                ));
            }
        };

        Ok(Unit {
            id: UnitId::new(id),
            kind: parse_field::<UnitKind>("unit", id, &self.kind)?,
            code: self.code,
            district: District::new(&self.district),
            description: self.description,
            operational_state: parse_field::<OperationalState>(
                "unit",
                id,
                &self.operational_state,
            )?,
            occupancy: OccupancyRecord::from_parts(current, history),
            version: self.version,
        })
    }
}

/// Column values written when a unit's occupancy or operational state
/// changes.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = units)]
#[diesel(treat_none_as_null = true)]
pub struct UnitChanges<'a> {
    pub operational_state: &'a str,
    pub occupant_user_id: Option<i64>,
    pub assigned_on: Option<String>,
    pub expected_vacate_on: Option<String>,
    pub reminder_sent: i32,
    pub occupancy_reason: Option<&'a str>,
    pub version: i64,
}

impl<'a> UnitChanges<'a> {
    /// Builds the changeset for `unit`, bumping its version.
    #[must_use]
    pub fn from_unit(unit: &'a Unit) -> Self {
        let current: Option<&'a Occupancy> = unit.occupancy.current();
        Self {
            operational_state: unit.operational_state.as_str(),
            occupant_user_id: current.map(|c| c.occupant.value()),
            assigned_on: current.map(|c| format_date(c.assigned_on)),
            expected_vacate_on: current.and_then(|c| c.expected_vacate_on).map(format_date),
            reminder_sent: current.map_or(0, |c| i32::from(c.reminder_sent)),
            occupancy_reason: current.and_then(|c| c.reason.as_deref()),
            version: unit.version + 1,
        }
    }
}

/// A new `units` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = units)]
pub struct NewUnitRow<'a> {
    pub kind: &'a str,
    pub code: &'a str,
    pub district: &'a str,
    pub description: &'a str,
}

/// An `occupancy_history` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = occupancy_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OccupancyHistoryRow {
    pub history_id: i64,
    pub unit_id: i64,
    pub occupant_user_id: i64,
    pub entered_on: String,
    pub exited_on: String,
    pub reason: String,
}

impl OccupancyHistoryRow {
    /// Decodes the row into a closed occupancy.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` if a date cannot be decoded.
    pub fn into_domain(self) -> Result<ClosedOccupancy, PersistenceError> {
        Ok(ClosedOccupancy {
            occupant: UserId::new(self.occupant_user_id),
            entered_on: parse_stored_date("unit", self.unit_id, &self.entered_on)?,
            exited_on: parse_stored_date("unit", self.unit_id, &self.exited_on)?,
            reason: self.reason,
        })
    }
}

/// A new `occupancy_history` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = occupancy_history)]
pub struct NewOccupancyHistoryRow<'a> {
    pub unit_id: i64,
    pub occupant_user_id: i64,
    pub entered_on: String,
    pub exited_on: String,
    pub reason: &'a str,
}

/// A `documents` row. The history is loaded separately.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRow {
    pub document_id: i64,
    pub document_type: String,
    pub sequence_number: i64,
    pub state: String,
    pub titular_user_id: i64,
    pub unit_id: Option<i64>,
    pub source_document_id: Option<i64>,
    pub created_by: i64,
    pub payload_json: String,
    pub created_at: String,
    pub updated_at: String,
    pub version: i64,
}

impl DocumentRow {
    /// Decodes the row, attaching its history.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` if a stored value cannot be decoded.
    pub fn into_domain(self, history: Vec<HistoryEntry>) -> Result<Document, PersistenceError> {
        let id: i64 = self.document_id;
        let payload: serde_json::Value = serde_json::from_str(&self.payload_json)
            .map_err(|e| PersistenceError::corrupt("document", id, e))?;
        Ok(Document {
            id: Some(DocumentId::new(id)),
            document_type: parse_field::<DocumentType>("document", id, &self.document_type)?,
            sequence_number: Some(self.sequence_number),
            state: parse_field::<DocumentState>("document", id, &self.state)?,
            titular: UserId::new(self.titular_user_id),
            unit: self.unit_id.map(UnitId::new),
            source_document: self.source_document_id.map(DocumentId::new),
            created_by: UserId::new(self.created_by),
            payload,
            history,
            created_at: parse_timestamp("document", id, &self.created_at)?,
            updated_at: parse_timestamp("document", id, &self.updated_at)?,
            version: self.version,
        })
    }
}

/// Column values written when a document moves.
///
/// Only the state, payload and timestamps change after creation; parties
/// and references are fixed.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = documents)]
pub struct DocumentChanges<'a> {
    pub state: &'a str,
    pub payload_json: String,
    pub updated_at: String,
    pub version: i64,
}

/// A new `documents` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocumentRow<'a> {
    pub document_type: &'a str,
    pub sequence_number: i64,
    pub state: &'a str,
    pub titular_user_id: i64,
    pub unit_id: Option<i64>,
    pub source_document_id: Option<i64>,
    pub created_by: i64,
    pub payload_json: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A `document_history` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = document_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentHistoryRow {
    pub entry_id: i64,
    pub document_id: i64,
    pub position: i64,
    pub recorded_at: String,
    pub actor_user_id: i64,
    pub actor_role: String,
    pub action: String,
    pub note: Option<String>,
}

impl DocumentHistoryRow {
    /// Decodes the row into a history entry.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` if a stored value cannot be decoded.
    pub fn into_domain(self) -> Result<HistoryEntry, PersistenceError> {
        let id: i64 = self.document_id;
        Ok(HistoryEntry {
            recorded_at: parse_timestamp("document", id, &self.recorded_at)?,
            actor_id: UserId::new(self.actor_user_id),
            actor_role: parse_field::<Role>("document", id, &self.actor_role)?,
            action: self.action,
            note: self.note,
        })
    }
}

/// A new `document_history` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = document_history)]
pub struct NewDocumentHistoryRow<'a> {
    pub document_id: i64,
    pub position: i64,
    pub recorded_at: String,
    pub actor_user_id: i64,
    pub actor_role: &'a str,
    pub action: &'a str,
    pub note: Option<&'a str>,
}

/// An `audit_entries` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = audit_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditEntryRow {
    pub audit_id: i64,
    pub actor_user_id: i64,
    pub actor_role: String,
    pub cause_id: String,
    pub cause_description: String,
    pub action_name: String,
    pub action_details: Option<String>,
    pub resource_type: String,
    pub resource_id: Option<i64>,
    pub recorded_at: String,
}

impl AuditEntryRow {
    /// Decodes the row into an audit entry.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` if a stored value cannot be decoded.
    pub fn into_domain(self) -> Result<AuditEntry, PersistenceError> {
        let id: i64 = self.audit_id;
        let mut entry: AuditEntry = AuditEntry::new(
            Actor::new(
                UserId::new(self.actor_user_id),
                parse_field::<Role>("audit entry", id, &self.actor_role)?,
            ),
            Cause::new(self.cause_id, self.cause_description),
            Action::new(self.action_name, self.action_details),
            parse_field::<ResourceType>("audit entry", id, &self.resource_type)?,
            self.resource_id,
            parse_timestamp("audit entry", id, &self.recorded_at)?,
        );
        entry.id = Some(id);
        Ok(entry)
    }
}

/// A new `audit_entries` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = audit_entries)]
pub struct NewAuditEntryRow<'a> {
    pub actor_user_id: i64,
    pub actor_role: &'a str,
    pub cause_id: &'a str,
    pub cause_description: &'a str,
    pub action_name: &'a str,
    pub action_details: Option<&'a str>,
    pub resource_type: &'a str,
    pub resource_id: Option<i64>,
    pub recorded_at: String,
}

impl<'a> NewAuditEntryRow<'a> {
    /// Builds the row for `entry`.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the timestamp cannot be formatted.
    pub fn from_entry(entry: &'a AuditEntry) -> Result<Self, PersistenceError> {
        Ok(Self {
            actor_user_id: entry.actor.user_id.value(),
            actor_role: entry.actor.role.as_str(),
            cause_id: &entry.cause.id,
            cause_description: &entry.cause.description,
            action_name: &entry.action.name,
            action_details: entry.action.details.as_deref(),
            resource_type: entry.resource_type.as_str(),
            resource_id: entry.resource_id,
            recorded_at: format_timestamp(entry.recorded_at)?,
        })
    }
}
