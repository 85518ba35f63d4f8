// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::ledger::users;
use crate::utils::pretty_table;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let user = users::create_user(conn, name)?;
            println!("Added user '{}' (id {})", user.username, user.id);
        }
        Some(("list", _)) => {
            let data = users::list_users(conn)?
                .into_iter()
                .map(|u| vec![u.id.to_string(), u.username])
                .collect();
            println!("{}", pretty_table(&["Id", "User"], data));
        }
        _ => {}
    }
    Ok(())
}
