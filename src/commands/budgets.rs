// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::config::Config;
use crate::ledger::budgets::{self, NewBudget};
use crate::ledger::categories::{self, CategoryTree};
use crate::models::{BudgetPeriod, User};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, config: &Config, m: &clap::ArgMatches) -> Result<()> {
    let user = config.require_user(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &user, sub)?,
        Some(("list", sub)) => list(conn, &user, sub)?,
        Some(("status", sub)) => status(conn, &user, sub)?,
        Some(("deactivate", sub)) | Some(("activate", sub)) => {
            let active = matches!(m.subcommand_name(), Some("activate"));
            let name = sub.get_one::<String>("name").unwrap();
            let budget = budgets::find_budget(conn, user.id, name)?;
            budgets::set_budget_active(conn, budget.id, active)?;
            println!(
                "{} budget '{}'",
                if active { "Activated" } else { "Deactivated" },
                name
            );
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let period: BudgetPeriod = sub.get_one::<String>("period").unwrap().parse()?;
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(categories::resolve_category(conn, c)?.id),
        None => None,
    };
    let start_date = match sub.get_one::<String>("start") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let end_date = sub.get_one::<String>("end").map(|s| parse_date(s)).transpose()?;

    let budget = budgets::create_budget(
        conn,
        &NewBudget {
            user_id: user.id,
            name: name.clone(),
            category_id,
            amount,
            period,
            start_date,
            end_date,
        },
    )?;
    println!(
        "Budget '{}' set: {} per {}",
        budget.name,
        budget.amount,
        period.label().to_lowercase()
    );
    Ok(())
}

fn category_label(tree: &CategoryTree, category_id: Option<i64>) -> Result<String> {
    Ok(match category_id {
        Some(id) => tree.full_path(id)?,
        None => "(all)".to_string(),
    })
}

fn list(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let data = budgets::list_budgets(conn, user.id, !sub.get_flag("all"))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let tree = CategoryTree::load(conn)?;
        let mut rows = Vec::with_capacity(data.len());
        for b in &data {
            rows.push(vec![
                b.name.clone(),
                category_label(&tree, b.category_id)?,
                format!("{:.2}", b.amount),
                b.period.label().to_string(),
                b.start_date.to_string(),
                b.end_date.map(|d| d.to_string()).unwrap_or_default(),
            ]);
        }
        println!(
            "{}",
            pretty_table(&["Budget", "Category", "Limit", "Period", "Start", "End"], rows)
        );
    }
    Ok(())
}

fn status(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let now = chrono::Local::now().naive_local();
    let selected = match sub.get_one::<String>("name") {
        Some(name) => vec![budgets::find_budget(conn, user.id, name)?],
        None => budgets::list_budgets(conn, user.id, true)?,
    };
    let data = selected
        .iter()
        .map(|b| budgets::evaluate(conn, b, now))
        .collect::<Result<Vec<_>, _>>()?;

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let tree = CategoryTree::load(conn)?;
        let mut rows = Vec::with_capacity(data.len());
        for s in &data {
            rows.push(vec![
                s.budget.name.clone(),
                category_label(&tree, s.budget.category_id)?,
                format!("{} .. {}", s.window.start.date(), s.window.end.date()),
                format!("{:.2}", s.budget.amount),
                format!("{:.2}", s.spent),
                format!("{:.2}", s.remaining),
                format!("{:.1}%", s.percentage_used),
            ]);
        }
        println!(
            "{}",
            pretty_table(
                &["Budget", "Category", "Window", "Limit", "Spent", "Remaining", "Used"],
                rows,
            )
        );
    }
    Ok(())
}
