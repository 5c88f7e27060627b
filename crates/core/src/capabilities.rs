// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Role capability table and the authorizer that consults it.
//!
//! The table is data. It is built once (either the built-in table or one
//! loaded from JSON at process start) and then shared read-only. A role
//! with no entry is denied everything.

use crate::error::CoreError;
use quarters_domain::{Document, DocumentType, Role, Unit, UnitKind, User};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

/// A view capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewScope {
    /// Sentinel granting every view scope.
    All,
    /// Applications.
    Applications,
    /// Housing assignment acts.
    AssignmentActs,
    /// Receipt acts.
    ReceiptActs,
    /// Work-order requests.
    WorkOrders,
    /// Vacating acts.
    VacatingActs,
    /// Lodging assignment acts.
    LodgingAssignments,
    /// Housing unit records.
    HousingUnits,
    /// Lodging unit records.
    LodgingUnits,
    /// User records.
    Users,
    /// The audit trail.
    Audit,
}

impl ViewScope {
    /// The view scope that covers documents of `document_type`.
    #[must_use]
    pub const fn for_document(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::Application => Self::Applications,
            DocumentType::AssignmentAct => Self::AssignmentActs,
            DocumentType::ReceiptAct => Self::ReceiptActs,
            DocumentType::WorkOrderRequest => Self::WorkOrders,
            DocumentType::VacatingAct => Self::VacatingActs,
            DocumentType::LodgingAssignmentAct => Self::LodgingAssignments,
        }
    }
}

/// Coarse access to units of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessScope {
    /// No access.
    None,
    /// Only the unit the user is assigned.
    OwnOnly,
    /// Units in the user's district.
    District,
    /// Every unit.
    Global,
}

/// An atomic permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read access to a class of records.
    View(ViewScope),
    /// The right to create documents of a type.
    Initiate(DocumentType),
    /// User administration.
    ManageUsers,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::View(scope) => write!(f, "view:{scope:?}"),
            Self::Initiate(document_type) => write!(f, "initiate:{document_type}"),
            Self::ManageUsers => write!(f, "manage-users"),
        }
    }
}

/// Capabilities granted to one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCapabilities {
    /// The role this entry describes.
    pub role: Role,
    /// View scopes; `All` grants every scope.
    pub view_scopes: Cow<'static, [ViewScope]>,
    /// Document types the role may create.
    pub can_initiate: Cow<'static, [DocumentType]>,
    /// Access to housing units.
    pub housing_access: AccessScope,
    /// Access to lodging units.
    pub lodging_access: AccessScope,
    /// Whether the role may administer users.
    pub manage_users: bool,
}

impl RoleCapabilities {
    const fn access(&self, kind: UnitKind) -> AccessScope {
        match kind {
            UnitKind::Housing => self.housing_access,
            UnitKind::Lodging => self.lodging_access,
        }
    }

    fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::View(scope) => self
                .view_scopes
                .iter()
                .any(|granted| *granted == ViewScope::All || *granted == scope),
            Capability::Initiate(document_type) => self.can_initiate.contains(&document_type),
            Capability::ManageUsers => self.manage_users,
        }
    }
}

/// The full role capability table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityTable {
    roles: Cow<'static, [RoleCapabilities]>,
}

const BUILTIN_ROLES: &[RoleCapabilities] = &[
    RoleCapabilities {
        role: Role::Applicant,
        view_scopes: Cow::Borrowed(&[ViewScope::Applications]),
        can_initiate: Cow::Borrowed(&[DocumentType::Application]),
        housing_access: AccessScope::None,
        lodging_access: AccessScope::None,
        manage_users: false,
    },
    RoleCapabilities {
        role: Role::UnitHolder,
        view_scopes: Cow::Borrowed(&[
            ViewScope::ReceiptActs,
            ViewScope::WorkOrders,
            ViewScope::HousingUnits,
        ]),
        can_initiate: Cow::Borrowed(&[DocumentType::WorkOrderRequest]),
        housing_access: AccessScope::OwnOnly,
        lodging_access: AccessScope::None,
        manage_users: false,
    },
    RoleCapabilities {
        role: Role::LodgedOccupant,
        view_scopes: Cow::Borrowed(&[ViewScope::LodgingUnits]),
        can_initiate: Cow::Borrowed(&[]),
        housing_access: AccessScope::None,
        lodging_access: AccessScope::OwnOnly,
        manage_users: false,
    },
    RoleCapabilities {
        role: Role::Inspector,
        view_scopes: Cow::Borrowed(&[
            ViewScope::AssignmentActs,
            ViewScope::ReceiptActs,
            ViewScope::WorkOrders,
            ViewScope::VacatingActs,
            ViewScope::HousingUnits,
            ViewScope::LodgingUnits,
        ]),
        can_initiate: Cow::Borrowed(&[DocumentType::ReceiptAct, DocumentType::VacatingAct]),
        housing_access: AccessScope::District,
        lodging_access: AccessScope::District,
        manage_users: false,
    },
    RoleCapabilities {
        role: Role::DistrictChief,
        view_scopes: Cow::Borrowed(&[
            ViewScope::AssignmentActs,
            ViewScope::ReceiptActs,
            ViewScope::WorkOrders,
            ViewScope::VacatingActs,
            ViewScope::LodgingAssignments,
            ViewScope::HousingUnits,
            ViewScope::LodgingUnits,
        ]),
        can_initiate: Cow::Borrowed(&[]),
        housing_access: AccessScope::District,
        lodging_access: AccessScope::District,
        manage_users: false,
    },
    RoleCapabilities {
        role: Role::Admin,
        view_scopes: Cow::Borrowed(&[ViewScope::All]),
        can_initiate: Cow::Borrowed(&[
            DocumentType::AssignmentAct,
            DocumentType::LodgingAssignmentAct,
            DocumentType::VacatingAct,
        ]),
        housing_access: AccessScope::Global,
        lodging_access: AccessScope::Global,
        manage_users: true,
    },
    RoleCapabilities {
        role: Role::AdminGeneral,
        view_scopes: Cow::Borrowed(&[ViewScope::All]),
        can_initiate: Cow::Borrowed(&[
            DocumentType::Application,
            DocumentType::AssignmentAct,
            DocumentType::LodgingAssignmentAct,
            DocumentType::VacatingAct,
        ]),
        housing_access: AccessScope::Global,
        lodging_access: AccessScope::Global,
        manage_users: true,
    },
];

impl CapabilityTable {
    /// The built-in table.
    pub const BUILTIN: Self = Self {
        roles: Cow::Borrowed(BUILTIN_ROLES),
    };

    /// Loads a table from JSON of the form `{"roles": [ ... ]}`.
    ///
    /// Roles absent from the document are denied everything.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the JSON is malformed or lists a
    /// role more than once.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let table: Self = serde_json::from_str(json).map_err(|e| CoreError::Validation {
            field: String::from("permissions"),
            message: e.to_string(),
        })?;

        let mut seen: HashSet<Role> = HashSet::new();
        for entry in table.roles.iter() {
            if !seen.insert(entry.role) {
                return Err(CoreError::Validation {
                    field: String::from("permissions"),
                    message: format!("role '{}' is listed more than once", entry.role),
                });
            }
        }
        Ok(table)
    }

    /// Returns the entry for `role`, if the table has one.
    #[must_use]
    pub fn entry(&self, role: Role) -> Option<&RoleCapabilities> {
        self.roles.iter().find(|entry| entry.role == role)
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::BUILTIN
    }
}

/// Answers authorization questions against an immutable capability table.
#[derive(Debug, Clone)]
pub struct CapabilityAuthorizer {
    table: Arc<CapabilityTable>,
}

impl CapabilityAuthorizer {
    /// Creates an authorizer over `table`.
    #[must_use]
    pub fn new(table: CapabilityTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Creates an authorizer over the built-in table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(CapabilityTable::BUILTIN)
    }

    /// Returns true if `role` holds `capability`.
    #[must_use]
    pub fn authorize(&self, role: Role, capability: Capability) -> bool {
        self.table
            .entry(role)
            .is_some_and(|entry| entry.grants(capability))
    }

    /// Like `authorize`, but produces the error the engine reports.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Unauthorized` if the capability is not held.
    pub fn require(&self, role: Role, capability: Capability) -> Result<(), CoreError> {
        if self.authorize(role, capability) {
            Ok(())
        } else {
            Err(CoreError::unauthorized(
                capability.to_string(),
                format!("role '{role}' lacks this capability"),
            ))
        }
    }

    /// The role's access scope for units of `kind`.
    #[must_use]
    pub fn access_for(&self, role: Role, kind: UnitKind) -> AccessScope {
        self.table
            .entry(role)
            .map_or(AccessScope::None, |entry| entry.access(kind))
    }

    /// Returns true if `actor` may act on `unit` given their access scope.
    #[must_use]
    pub fn can_access_unit(&self, actor: &User, unit: &Unit) -> bool {
        match self.access_for(actor.role, unit.kind) {
            AccessScope::None => false,
            AccessScope::OwnOnly => actor.assigned_unit(unit.kind) == Some(unit.id),
            AccessScope::District => actor.district.as_ref() == Some(&unit.district),
            AccessScope::Global => true,
        }
    }

    /// Returns true if `actor` may read `document`.
    ///
    /// Parties to the document (titular and creator) may always read it.
    /// Anyone else needs the document type's view scope and access to the
    /// referenced unit; documents without a unit need global housing
    /// access.
    #[must_use]
    pub fn can_view_document(&self, actor: &User, document: &Document, unit: Option<&Unit>) -> bool {
        if document.titular == actor.id || document.created_by == actor.id {
            return true;
        }
        if !self.authorize(
            actor.role,
            Capability::View(ViewScope::for_document(document.document_type)),
        ) {
            return false;
        }
        unit.map_or_else(
            || self.access_for(actor.role, UnitKind::Housing) == AccessScope::Global,
            |unit| self.can_access_unit(actor, unit),
        )
    }
}

impl Default for CapabilityAuthorizer {
    fn default() -> Self {
        Self::builtin()
    }
}
