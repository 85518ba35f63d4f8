// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::config::Config;
use crate::ledger::accounts::list_accounts;
use crate::ledger::stats::{account_stats, transaction_stats, AccountStats};
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, config: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("stats", sub)) => stats(conn, config, sub)?,
        Some(("balances", sub)) => balances(conn, config, sub)?,
        Some(("accounts", sub)) => {
            let s = accounts(conn, config, sub)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                print_account_stats(&s);
            }
        }
        _ => {}
    }
    Ok(())
}

fn stats(conn: &Connection, config: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user_id = if sub.get_flag("everyone") {
        None
    } else {
        Some(config.require_user(conn)?.id)
    };
    let s = transaction_stats(conn, user_id)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }

    let mut rows = vec![
        vec!["Transactions".to_string(), s.total_transactions.to_string()],
        vec!["Verified".to_string(), s.verified_transactions.to_string()],
        vec!["Unverified".to_string(), s.unverified_transactions.to_string()],
        vec!["Recurring".to_string(), s.recurring_transactions.to_string()],
    ];
    for t in &s.by_type {
        rows.push(vec![
            t.transaction_type.label().to_string(),
            format!("{} ({:.2})", t.count, t.total_amount),
        ]);
    }
    println!("{}", pretty_table(&["Metric", "Value"], rows));

    if !s.payment_methods.is_empty() {
        let rows = s
            .payment_methods
            .iter()
            .map(|(m, n)| vec![m.label().to_string(), n.to_string()])
            .collect();
        println!("{}", pretty_table(&["Payment method", "Count"], rows));
    }
    if !s.categories.is_empty() {
        let rows = s
            .categories
            .iter()
            .map(|(c, n)| vec![c.clone(), n.to_string()])
            .collect();
        println!("{}", pretty_table(&["Category", "Count"], rows));
    }
    if !s.monthly_counts.is_empty() {
        let rows = s
            .monthly_counts
            .iter()
            .map(|(m, n)| vec![m.clone(), n.to_string()])
            .collect();
        println!("{}", pretty_table(&["Month", "Count"], rows));
    }
    Ok(())
}

fn balances(conn: &Connection, config: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = config.require_user(conn)?;
    let accounts = list_accounts(conn, Some(user.id), false)?;
    let data: Vec<Vec<String>> = accounts
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.currency.to_string(),
                format!("{:.2}", a.balance),
            ]
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!("{}", pretty_table(&["Account", "CCY", "Balance"], data));
    }
    Ok(())
}

pub fn accounts(conn: &Connection, config: &Config, sub: &clap::ArgMatches) -> Result<AccountStats> {
    let user_id = if sub.get_flag("everyone") {
        None
    } else {
        Some(config.require_user(conn)?.id)
    };
    Ok(account_stats(conn, user_id)?)
}

fn print_account_stats(s: &AccountStats) {
    let rows = vec![
        vec!["Accounts".to_string(), s.total_accounts.to_string()],
        vec!["Active".to_string(), s.active_accounts.to_string()],
        vec!["Inactive".to_string(), s.inactive_accounts.to_string()],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], rows));

    if !s.by_type.is_empty() {
        let rows = s
            .by_type
            .iter()
            .map(|(t, n)| vec![t.label().to_string(), n.to_string()])
            .collect();
        println!("{}", pretty_table(&["Account type", "Count"], rows));
    }
    if !s.by_currency.is_empty() {
        let rows = s
            .by_currency
            .iter()
            .map(|(c, n)| {
                let total = s
                    .balance_by_currency
                    .iter()
                    .find(|(bc, _)| bc == c)
                    .map(|(_, b)| *b)
                    .unwrap_or_default();
                vec![c.to_string(), n.to_string(), format!("{:.2}", total)]
            })
            .collect();
        println!("{}", pretty_table(&["CCY", "Accounts", "Balance"], rows));
    }
}
