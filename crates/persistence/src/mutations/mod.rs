// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! ## Module Organization
//!
//! - `records`: versioned writes of single users, units and documents,
//!   and audit inserts
//! - `registration`: administrative registration and deactivation
//! - `transition`: writing a planned change as one unit of work
//!
//! Versioned writes are conditional on the version the record was loaded
//! with. They must run inside `Persistence::atomically` so that a failure
//! part-way rolls back every earlier write.

pub mod records;
pub mod registration;
pub mod transition;
