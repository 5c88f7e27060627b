// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod sink;

#[cfg(test)]
mod tests;

pub use sink::{AuditSink, AuditSinkError, MemoryAuditSink, TracingAuditSink};

use quarters_domain::{Role, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Represents the user performing an action, with their role at that time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user.
    pub user_id: UserId,
    /// The role the user held when acting.
    pub role: Role,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The acting user
    /// * `role` - The user's role at the time of the action
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Represents the reason or trigger for an action.
///
/// For workflow changes the cause identifies the document and transition;
/// for administrative changes it names the operator command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// A unique identifier for this cause (e.g. `document:12`).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The identifier of the triggering request or document
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The name of the action (e.g. "`create`", "`close`").
    pub name: String,
    /// Free-text detail about the action and its side effects.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// The kind of record an audit entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// A workflow document.
    Document,
    /// A housing unit.
    HousingUnit,
    /// A lodging unit.
    LodgingUnit,
    /// A user.
    User,
}

impl ResourceType {
    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::HousingUnit => "housing_unit",
            Self::LodgingUnit => "lodging_unit",
            Self::User => "user",
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "housing_unit" => Ok(Self::HousingUnit),
            "lodging_unit" => Ok(Self::LodgingUnit),
            "user" => Ok(Self::User),
            _ => Err(format!("Invalid resource type: {s}")),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable audit entry.
///
/// Every successful state change produces exactly one audit entry. Entries
/// are append-only and never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Persisted identifier; `None` until stored.
    pub id: Option<i64>,
    /// Who acted, and in which role.
    pub actor: Actor,
    /// Why the action happened.
    pub cause: Cause,
    /// What was done.
    pub action: Action,
    /// The kind of the affected record.
    pub resource_type: ResourceType,
    /// The affected record's identifier, if it has one yet.
    pub resource_id: Option<i64>,
    /// When the change was made.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl AuditEntry {
    /// Creates a new, not yet persisted, `AuditEntry`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    /// * `action` - The action that was performed
    /// * `resource_type` - The kind of affected record
    /// * `resource_id` - The affected record, if already identified
    /// * `recorded_at` - When the change was made
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        resource_type: ResourceType,
        resource_id: Option<i64>,
        recorded_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: None,
            actor,
            cause,
            action,
            resource_type,
            resource_id,
            recorded_at,
        }
    }

    /// Returns a copy bound to a resource id assigned at persistence time.
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: i64) -> Self {
        self.resource_id = Some(resource_id);
        self
    }
}
