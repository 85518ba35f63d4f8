// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::config::{get_setting, set_setting, KNOWN_KEYS};
use crate::utils::pretty_table;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let keys: Vec<&str> = match sub.get_one::<String>("key") {
                Some(k) => vec![k.as_str()],
                None => KNOWN_KEYS.to_vec(),
            };
            let mut rows = Vec::with_capacity(keys.len());
            for k in keys {
                rows.push(vec![
                    k.to_string(),
                    get_setting(conn, k)?.unwrap_or_else(|| "(unset)".into()),
                ]);
            }
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            let value = sub.get_one::<String>("value").unwrap();
            set_setting(conn, key, value)?;
            println!("{} = {}", key, get_setting(conn, key)?.unwrap_or_default());
        }
        _ => {}
    }
    Ok(())
}
