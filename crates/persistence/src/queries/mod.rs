// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! Every function takes a plain connection so it can run either on its
//! own or inside a transaction opened by `Persistence::atomically`.

pub mod audit;
pub mod documents;
pub mod units;
pub mod users;
