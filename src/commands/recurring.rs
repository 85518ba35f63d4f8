// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;

use crate::config::Config;
use crate::ledger::categories;
use crate::ledger::recurring::{self, NewRecurring};
use crate::ledger::transactions::Engine;
use crate::models::{Frequency, TransactionType, User};
use crate::utils::{id_for_account, maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(
    conn: &mut Connection,
    engine: &Engine,
    config: &Config,
    m: &clap::ArgMatches,
) -> Result<()> {
    let user = config.require_user(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &user, sub)?,
        Some(("list", sub)) => {
            let data = recurring::list_recurring(conn, Some(user.id), !sub.get_flag("all"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|r| {
                        vec![
                            r.id.to_string(),
                            r.title.clone(),
                            r.transaction_type.label().to_string(),
                            format!("{:.2}", r.amount),
                            r.frequency.label().to_string(),
                            r.next_due_date.to_string(),
                            r.end_date.map(|d| d.to_string()).unwrap_or_default(),
                            if r.auto_create { "auto" } else { "manual" }.to_string(),
                            if r.is_active { "active" } else { "paused" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Id", "Title", "Type", "Amount", "Every", "Next", "Until", "Mode", "State"],
                        rows,
                    )
                );
            }
        }
        Some(("fire", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            owned(conn, &user, id)?;
            let fired = recurring::fire(engine, conn, id)?;
            println!(
                "Booked '{}' on {} (transaction {}); next due {}",
                fired.transaction.title,
                fired.transaction.date,
                fired.transaction.id,
                fired.next_due_date
            );
        }
        Some(("run", sub)) => {
            let as_of = match sub.get_one::<String>("date") {
                Some(d) => parse_date(d)?,
                None => chrono::Local::now().date_naive(),
            };
            let (fired, failed) = recurring::run_due(engine, conn, as_of)?;
            for f in &fired {
                println!(
                    "Booked '{}' on {} (template {}); next due {}",
                    f.transaction.title, f.transaction.date, f.template_id, f.next_due_date
                );
            }
            for (id, err) in &failed {
                eprintln!("Template {} failed: {}", id, err);
            }
            println!("{} booked, {} failed", fired.len(), failed.len());
        }
        Some(("pause", sub)) | Some(("resume", sub)) => {
            let active = matches!(m.subcommand_name(), Some("resume"));
            let id = *sub.get_one::<i64>("id").unwrap();
            owned(conn, &user, id)?;
            recurring::set_recurring_active(conn, id, active)?;
            println!(
                "{} recurring template {}",
                if active { "Resumed" } else { "Paused" },
                id
            );
        }
        _ => {}
    }
    Ok(())
}

fn owned(conn: &Connection, user: &User, id: i64) -> Result<()> {
    if recurring::get_recurring(conn, id)?.user_id != user.id {
        bail!("Recurring template {} does not belong to '{}'", id, user.username);
    }
    Ok(())
}

fn add(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(conn, user.id, sub.get_one::<String>("account").unwrap())?;
    let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
    let frequency: Frequency = sub.get_one::<String>("frequency").unwrap().parse()?;
    let start_date = parse_date(sub.get_one::<String>("start").unwrap())?;
    let end_date = sub.get_one::<String>("end").map(|s| parse_date(s)).transpose()?;
    let next_due_date = match sub.get_one::<String>("next") {
        Some(n) => parse_date(n)?,
        None => start_date,
    };
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(categories::resolve_category(conn, c)?.id),
        None => None,
    };

    let template = recurring::create_recurring(
        conn,
        &NewRecurring {
            user_id: user.id,
            account_id,
            transaction_type: kind,
            category_id,
            amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
            title: sub.get_one::<String>("title").unwrap().clone(),
            description: sub.get_one::<String>("description").cloned(),
            frequency,
            start_date,
            end_date,
            next_due_date,
            auto_create: sub.get_flag("auto"),
        },
    )?;
    println!(
        "Added recurring '{}' (id {}), {} from {}, next due {}",
        template.title,
        template.id,
        frequency.label().to_lowercase(),
        template.start_date,
        template.next_due_date
    );
    Ok(())
}
