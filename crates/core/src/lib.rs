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

mod apply;
mod capabilities;
mod error;
mod ledger;
mod machines;
mod state;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use apply::{
    VACATED_REASON, apply_create, apply_mark_reminder, apply_transition, apply_unit_state,
    authorize_create,
};
pub use capabilities::{
    AccessScope, Capability, CapabilityAuthorizer, CapabilityTable, RoleCapabilities, ViewScope,
};
pub use error::{CoreError, translate_domain_error};
pub use ledger::DISPLACED_REASON;
pub use machines::{Edge, EdgeRole, Effect, Guard, PartyRule, StateMachine, Transition};
pub use state::{CreateContext, TransitionContext, TransitionResult, UnitChangeResult};
