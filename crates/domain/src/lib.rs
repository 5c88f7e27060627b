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

mod consistency;
mod dates;
mod document;
mod error;
mod occupancy;
mod payload;
mod role;
mod status;
mod unit;
mod user;

#[cfg(test)]
mod tests;

pub use consistency::{verify_pair, verify_unit, verify_user};
pub use dates::{DATE_FORMAT, format_date, iso_date, parse_date};
pub use document::{Document, DocumentId, DocumentState, DocumentType, HistoryEntry};
pub use error::DomainError;
pub use occupancy::{ClosedOccupancy, Occupancy, OccupancyRecord};
pub use payload::{CreatePayload, TransitionPayload};
pub use role::Role;
pub use status::{HousingStatus, TenureStatus};
pub use unit::{District, OperationalState, Unit, UnitId, UnitKind};
pub use user::{User, UserId};
