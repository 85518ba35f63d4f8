// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::config::Config;
use crate::ledger::accounts::{self, NewAccount};
use crate::models::{AccountType, Currency};
use crate::utils::{fmt_money, id_for_account, maybe_print_json, parse_decimal, parse_month, pretty_table};

pub fn handle(conn: &Connection, config: &Config, m: &clap::ArgMatches) -> Result<()> {
    let user = config.require_user(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let typ: AccountType = sub.get_one::<String>("type").unwrap().parse()?;
            let ccy = match sub.get_one::<String>("currency") {
                Some(c) => c.parse::<Currency>()?,
                None => config.default_currency,
            };
            let initial = parse_decimal(sub.get_one::<String>("initial").unwrap())?;
            let acct = accounts::create_account(
                conn,
                &NewAccount {
                    user_id: user.id,
                    name: name.clone(),
                    r#type: typ,
                    currency: ccy,
                    initial_balance: initial,
                    account_number: sub.get_one::<String>("number").cloned(),
                    description: sub.get_one::<String>("description").cloned(),
                },
            )?;
            println!(
                "Added account '{}' ({}, {}) opening at {}",
                acct.name,
                typ.label(),
                ccy,
                fmt_money(&acct.balance, ccy)
            );
        }
        Some(("list", sub)) => {
            let data = accounts::list_accounts(conn, Some(user.id), sub.get_flag("all"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|a| {
                        vec![
                            a.name.clone(),
                            a.r#type.label().to_string(),
                            a.currency.to_string(),
                            format!("{:.2}", a.balance),
                            if a.is_active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Name", "Type", "Currency", "Balance", "Active"], rows)
                );
            }
        }
        Some(("show", sub)) => {
            let id = id_for_account(conn, user.id, sub.get_one::<String>("name").unwrap())?;
            let summary = accounts::account_summary(conn, id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
                let ccy = summary.account.currency;
                let rows = vec![
                    vec!["Balance".into(), fmt_money(&summary.account.balance, ccy)],
                    vec![
                        "Initial balance".into(),
                        fmt_money(&summary.account.initial_balance, ccy),
                    ],
                    vec!["Total income".into(), fmt_money(&summary.total_income, ccy)],
                    vec!["Total expense".into(), fmt_money(&summary.total_expense, ccy)],
                    vec!["Net flow".into(), fmt_money(&summary.net_flow, ccy)],
                ];
                println!("{}", pretty_table(&[&summary.account.name, ""], rows));
            }
        }
        Some(("month", sub)) => {
            let id = id_for_account(conn, user.id, sub.get_one::<String>("name").unwrap())?;
            let month = sub.get_one::<String>("month").unwrap();
            let (y, mo) = parse_month(month)?;
            let s = accounts::monthly_summary(conn, id, y, mo)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                println!(
                    "{}",
                    pretty_table(
                        &["Month", "Income", "Expense", "Net", "Transactions"],
                        vec![vec![
                            month.clone(),
                            format!("{:.2}", s.income),
                            format!("{:.2}", s.expense),
                            format!("{:.2}", s.net),
                            s.transaction_count.to_string(),
                        ]],
                    )
                );
            }
        }
        Some(("deactivate", sub)) | Some(("activate", sub)) => {
            let active = matches!(m.subcommand_name(), Some("activate"));
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_account(conn, user.id, name)?;
            accounts::set_account_active(conn, id, active)?;
            println!(
                "{} account '{}'",
                if active { "Activated" } else { "Deactivated" },
                name
            );
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_account(conn, user.id, name)?;
            accounts::delete_account(conn, id)?;
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
