// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::Config;
use crate::ledger::accounts::list_accounts;
use crate::ledger::categories::CategoryTree;
use crate::ledger::transactions::{list_transactions, TransactionFilter};

pub fn handle(conn: &Connection, config: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, config, sub),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub r#type: String,
    pub account: String,
    pub to_account: Option<String>,
    pub amount: String,
    pub title: String,
    pub category: Option<String>,
    pub payment_method: String,
    pub merchant: Option<String>,
    pub tags: Option<String>,
    pub verified: bool,
    pub recurring: bool,
}

/// Every transaction on the user's accounts, oldest first.
pub fn export_rows(conn: &Connection, user_id: i64) -> Result<Vec<ExportRow>> {
    let names: HashMap<i64, String> = list_accounts(conn, Some(user_id), true)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let tree = CategoryTree::load(conn)?;
    let account_name = |id: i64| names.get(&id).cloned().unwrap_or_else(|| format!("#{}", id));

    let mut txns = list_transactions(
        conn,
        &TransactionFilter {
            user_id: Some(user_id),
            ..TransactionFilter::default()
        },
    )?;
    txns.reverse();

    let mut out = Vec::with_capacity(txns.len());
    for t in txns {
        out.push(ExportRow {
            id: t.id,
            date: t.date.to_string(),
            time: t.time.format("%H:%M:%S").to_string(),
            r#type: t.transaction_type.as_str().to_string(),
            account: account_name(t.account_id),
            to_account: t.to_account_id.map(account_name),
            amount: t.amount.to_string(),
            title: t.title,
            category: t.category_id.map(|c| tree.full_path(c)).transpose()?,
            payment_method: t.payment_method.as_str().to_string(),
            merchant: t.merchant,
            tags: t.tags,
            verified: t.is_verified,
            recurring: t.is_recurring,
        });
    }
    Ok(out)
}

fn export_transactions(conn: &Connection, config: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }
    let user = config.require_user(conn)?;
    let rows = export_rows(conn, user.id)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        _ => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
    }
    tracing::info!(count = rows.len(), path = %out, format = %fmt, "transactions exported");
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}
