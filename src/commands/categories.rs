// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::ledger::categories::{self, CategoryTree, NewCategory};
use crate::models::CategoryType;
use crate::utils::{maybe_print_json, pretty_table};

#[derive(Serialize)]
pub struct CategoryRow {
    pub id: i64,
    pub path: String,
    pub r#type: CategoryType,
    pub active: bool,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let typ: CategoryType = sub.get_one::<String>("type").unwrap().parse()?;
            let parent_id = match sub.get_one::<String>("parent") {
                Some(p) => Some(categories::resolve_category(conn, p)?.id),
                None => None,
            };
            let cat = categories::create_category(
                conn,
                &NewCategory {
                    name: name.clone(),
                    r#type: typ,
                    parent_id,
                    icon: sub.get_one::<String>("icon").cloned(),
                    color: sub.get_one::<String>("color").cloned(),
                    description: sub.get_one::<String>("description").cloned(),
                },
            )?;
            println!("Added category '{}'", categories::full_path(conn, cat.id)?);
        }
        Some(("list", sub)) => {
            let data = rows(conn, sub.get_flag("all"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let table = data
                    .into_iter()
                    .map(|r| vec![r.id.to_string(), r.path, r.r#type.label().to_string()])
                    .collect();
                println!("{}", pretty_table(&["Id", "Category", "Type"], table));
            }
        }
        Some(("move", sub)) => {
            let cat = categories::resolve_category(conn, sub.get_one::<String>("category").unwrap())?;
            let parent = match sub.get_one::<String>("parent") {
                Some(p) => Some(categories::resolve_category(conn, p)?.id),
                None if sub.get_flag("root") => None,
                None => anyhow::bail!("Pass --parent <category> or --root"),
            };
            categories::move_category(conn, cat.id, parent)?;
            println!("Moved to '{}'", categories::full_path(conn, cat.id)?);
        }
        Some(("deactivate", sub)) => {
            let cat = categories::resolve_category(conn, sub.get_one::<String>("category").unwrap())?;
            categories::set_category_active(conn, cat.id, false)?;
            println!("Deactivated category '{}'", categories::full_path(conn, cat.id)?);
        }
        _ => {}
    }
    Ok(())
}

/// Categories with their full paths, sorted by path.
pub fn rows(conn: &Connection, include_inactive: bool) -> Result<Vec<CategoryRow>> {
    let tree = CategoryTree::load(conn)?;
    Ok(tree
        .paths()?
        .into_iter()
        .filter(|(_, c)| include_inactive || c.is_active)
        .map(|(path, c)| CategoryRow {
            id: c.id,
            path,
            r#type: c.r#type,
            active: c.is_active,
        })
        .collect())
}
