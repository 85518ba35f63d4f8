// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{params, Connection, OptionalExtension};

use super::require_name;
use crate::error::{LedgerError, LedgerResult};
use crate::models::User;

pub fn create_user(conn: &Connection, username: &str) -> LedgerResult<User> {
    let username = require_name(username, "username")?;
    if find_user(conn, &username)?.is_some() {
        return Err(LedgerError::validation(format!(
            "user '{}' already exists",
            username
        )));
    }
    conn.execute("INSERT INTO users(username) VALUES (?1)", params![username])?;
    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, %username, "user created");
    Ok(User { id, username })
}

pub fn get_user(conn: &Connection, id: i64) -> LedgerResult<User> {
    conn.query_row(
        "SELECT id, username FROM users WHERE id=?1",
        params![id],
        |r| {
            Ok(User {
                id: r.get(0)?,
                username: r.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("user", id))
}

pub fn find_user(conn: &Connection, username: &str) -> LedgerResult<Option<User>> {
    Ok(conn
        .query_row(
            "SELECT id, username FROM users WHERE username=?1",
            params![username],
            |r| {
                Ok(User {
                    id: r.get(0)?,
                    username: r.get(1)?,
                })
            },
        )
        .optional()?)
}

pub fn list_users(conn: &Connection) -> LedgerResult<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, username FROM users ORDER BY username")?;
    let rows = stmt.query_map([], |r| {
        Ok(User {
            id: r.get(0)?,
            username: r.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
