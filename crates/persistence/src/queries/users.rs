// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use quarters_domain::{User, UserId};
use tracing::debug;

use crate::data_models::UserRow;
use crate::diesel_schema::users;
use crate::error::PersistenceError;

/// Loads a user by ID.
///
/// # Errors
///
/// Returns `NotFound` if no such user exists.
pub fn load_user(conn: &mut SqliteConnection, user_id: UserId) -> Result<User, PersistenceError> {
    debug!(user_id = user_id.value(), "Loading user");

    let row: Option<UserRow> = users::table
        .filter(users::user_id.eq(user_id.value()))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?;

    row.ok_or_else(|| PersistenceError::not_found("user", user_id.value()))?
        .into_domain()
}

/// Loads every user, ordered by ID.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_users(conn: &mut SqliteConnection) -> Result<Vec<User>, PersistenceError> {
    let rows: Vec<UserRow> = users::table
        .order(users::user_id.asc())
        .select(UserRow::as_select())
        .load(conn)?;

    rows.into_iter().map(UserRow::into_domain).collect()
}
