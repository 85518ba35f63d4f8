// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::Config;
use crate::ledger::categories::{self, CategoryTree};
use crate::ledger::transactions::{
    self, Engine, NewTransaction, TransactionFilter, TransactionPatch,
};
use crate::models::{PaymentMethod, Transaction, TransactionType, User};
use crate::utils::{
    id_for_account, maybe_print_json, parse_date, parse_decimal, parse_month, parse_time,
    pretty_table,
};

pub fn handle(
    conn: &mut Connection,
    engine: &Engine,
    config: &Config,
    m: &clap::ArgMatches,
) -> Result<()> {
    let user = config.require_user(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, engine, &user, sub)?,
        Some(("edit", sub)) => edit(conn, engine, &user, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            owned(conn, &user, id)?;
            let gone = engine.delete(conn, id)?;
            println!("Removed transaction {} '{}' ({})", id, gone.title, gone.amount);
        }
        Some(("show", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let t = owned(conn, &user, id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &t)? {
                let row = to_row(conn, &CategoryTree::load(conn)?, &t)?;
                let rows = vec![
                    vec!["Id".into(), row.id.to_string()],
                    vec!["When".into(), format!("{} {}", row.date, row.time)],
                    vec!["Type".into(), row.r#type],
                    vec!["Account".into(), row.account],
                    vec!["To".into(), row.to_account],
                    vec!["Amount".into(), row.amount],
                    vec!["Title".into(), row.title],
                    vec!["Category".into(), row.category],
                    vec!["Method".into(), t.payment_method.label().to_string()],
                    vec!["Merchant".into(), t.merchant.clone().unwrap_or_default()],
                    vec!["Location".into(), t.location.clone().unwrap_or_default()],
                    vec!["Tags".into(), t.tags_list().join(", ")],
                    vec!["Verified".into(), t.is_verified.to_string()],
                    vec!["Recurring".into(), t.is_recurring.to_string()],
                ];
                println!("{}", pretty_table(&["Field", "Value"], rows));
            }
        }
        Some(("list", sub)) => list(conn, &user, sub)?,
        _ => {}
    }
    Ok(())
}

/// The transaction, provided its source account belongs to `user`.
fn owned(conn: &Connection, user: &User, id: i64) -> Result<Transaction> {
    let t = transactions::get_transaction(conn, id)?;
    let account = crate::ledger::accounts::get_account(conn, t.account_id)?;
    if account.user_id != user.id {
        bail!("Transaction {} does not belong to '{}'", id, user.username);
    }
    Ok(t)
}

fn tags_arg(sub: &clap::ArgMatches) -> Option<String> {
    sub.get_one::<String>("tags").map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    })
}

fn add(conn: &mut Connection, engine: &Engine, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(conn, user.id, sub.get_one::<String>("account").unwrap())?;
    let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let title = sub.get_one::<String>("title").unwrap();
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };

    let mut new = NewTransaction::new(account_id, kind, amount, title.as_str(), date);
    if let Some(t) = sub.get_one::<String>("time") {
        new = new.at(parse_time(t)?);
    }
    if let Some(c) = sub.get_one::<String>("category") {
        new = new.with_category(categories::resolve_category(conn, c)?.id);
    }
    if let Some(to) = sub.get_one::<String>("to") {
        new = new.with_destination(id_for_account(conn, user.id, to)?);
    }
    if let Some(pm) = sub.get_one::<String>("method") {
        new.payment_method = pm.parse::<PaymentMethod>()?;
    }
    new.merchant = sub.get_one::<String>("merchant").cloned();
    new.location = sub.get_one::<String>("location").cloned();
    new.description = sub.get_one::<String>("description").cloned();
    new.tags = tags_arg(sub);
    new.is_verified = !sub.get_flag("unverified");
    new.created_by = Some(user.id);

    let t = engine.create(conn, &new)?;
    println!(
        "Recorded {} {} '{}' on {} (id {})",
        t.transaction_type.label().to_lowercase(),
        t.amount,
        t.title,
        t.date,
        t.id
    );
    Ok(())
}

fn edit(conn: &mut Connection, engine: &Engine, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let existing = owned(conn, user, id)?;

    let mut patch = TransactionPatch::default();
    if let Some(a) = sub.get_one::<String>("account") {
        patch.account_id = Some(id_for_account(conn, user.id, a)?);
    }
    if let Some(t) = sub.get_one::<String>("type") {
        patch.transaction_type = Some(t.parse()?);
    }
    if let Some(a) = sub.get_one::<String>("amount") {
        patch.amount = Some(parse_decimal(a)?);
    }
    patch.title = sub.get_one::<String>("title").cloned();
    if let Some(d) = sub.get_one::<String>("date") {
        patch.date = Some(parse_date(d)?);
    }
    if let Some(t) = sub.get_one::<String>("time") {
        patch.time = Some(parse_time(t)?);
    }
    if let Some(c) = sub.get_one::<String>("category") {
        patch.category_id = Some(Some(categories::resolve_category(conn, c)?.id));
    } else if sub.get_flag("clear-category") {
        patch.category_id = Some(None);
    }
    if let Some(to) = sub.get_one::<String>("to") {
        patch.to_account_id = Some(Some(id_for_account(conn, user.id, to)?));
    }
    if let Some(pm) = sub.get_one::<String>("method") {
        patch.payment_method = Some(pm.parse()?);
    }
    if let Some(v) = sub.get_one::<String>("merchant") {
        patch.merchant = Some(Some(v.clone()));
    }
    if let Some(v) = sub.get_one::<String>("location") {
        patch.location = Some(Some(v.clone()));
    }
    if let Some(v) = sub.get_one::<String>("description") {
        patch.description = Some(Some(v.clone()));
    }
    if let Some(tags) = tags_arg(sub) {
        patch.tags = Some(Some(tags));
    }
    patch.is_verified = sub.get_one::<bool>("verified").copied();

    let updated = engine.update(conn, id, &patch.apply_to(&existing))?;
    println!(
        "Updated transaction {}: {} {} '{}'",
        updated.id,
        updated.transaction_type.label().to_lowercase(),
        updated.amount,
        updated.title
    );
    Ok(())
}

fn list(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, user, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date,
                    r.r#type,
                    r.account,
                    r.amount,
                    r.title,
                    r.category,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Type", "Account", "Amount", "Title", "Category"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub r#type: String,
    pub account: String,
    pub to_account: String,
    pub amount: String,
    pub title: String,
    pub category: String,
}

fn to_row(conn: &Connection, tree: &CategoryTree, t: &Transaction) -> Result<TransactionRow> {
    let account = crate::ledger::accounts::get_account(conn, t.account_id)?;
    let to_account = match t.to_account_id {
        Some(id) => crate::ledger::accounts::get_account(conn, id)?.name,
        None => String::new(),
    };
    let category = match t.category_id {
        Some(id) => tree.full_path(id)?,
        None => String::new(),
    };
    Ok(TransactionRow {
        id: t.id,
        date: t.date.to_string(),
        time: t.time.format("%H:%M:%S").to_string(),
        r#type: t.transaction_type.label().to_string(),
        account: account.name,
        to_account,
        amount: format!("{:.2}", t.amount),
        title: t.title.clone(),
        category,
    })
}

/// Rows for `tx list`, newest first, honouring the account, type,
/// category, month and limit filters.
pub fn query_rows(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let tree = CategoryTree::load(conn)?;
    let mut filter = TransactionFilter {
        user_id: Some(user.id),
        limit: sub.get_one::<usize>("limit").copied(),
        ..TransactionFilter::default()
    };
    if let Some(a) = sub.get_one::<String>("account") {
        filter.account_id = Some(id_for_account(conn, user.id, a)?);
    }
    if let Some(t) = sub.get_one::<String>("type") {
        filter.transaction_type = Some(t.parse()?);
    }
    if let Some(c) = sub.get_one::<String>("category") {
        filter.category_id = Some(tree.resolve(c)?.id);
    }
    if let Some(m) = sub.get_one::<String>("month") {
        filter.month = Some(parse_month(m)?);
    }

    transactions::list_transactions(conn, &filter)?
        .iter()
        .map(|t| to_row(conn, &tree, t))
        .collect()
}
