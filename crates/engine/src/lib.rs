// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The transition engine for the quarters housing workflow.
//!
//! The engine is the only entry point that mutates documents, units and
//! users. Callers resolve identity first and hand the engine an
//! [`AuthenticatedActor`]; the engine then:
//!
//! 1. loads the document and every record it references,
//! 2. plans the change with the pure core (state machine, capability
//!    table, guards, occupancy ledger),
//! 3. writes the plan with version-conditioned updates,
//! 4. hands the stored audit entries to the [`AuditSink`](quarters_audit::AuditSink),
//! 5. commits.
//!
//! Steps 1 through 5 run in one immediate transaction, so a failure at any
//! step, including a sink failure or an elapsed deadline, leaves nothing
//! behind.

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
#![allow(clippy::multiple_crate_versions)]

mod actor;
mod clock;
mod config;
mod consistency;
mod engine;
mod error;

#[cfg(test)]
mod tests;

pub use actor::AuthenticatedActor;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use consistency::{ConsistencyReport, Violation, scan};
pub use engine::Engine;
pub use error::{EngineError, translate_core_error, translate_persistence_error, translate_sink_error};
