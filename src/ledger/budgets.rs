// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget evaluation. Spent, remaining and percentage are always derived
//! from the transaction table at evaluation time.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

use super::categories::get_category;
use super::{require_name, sum_amounts, validate_amount};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Budget, BudgetPeriod, TransactionType};
use crate::utils::month_bounds;

const WINDOW_FMT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub user_id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Inclusive bounds, second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub window: PeriodWindow,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage_used: Decimal,
}

fn one_second_before(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN) - TimeDelta::seconds(1)
}

/// The current period of `budget` as seen at `now`.
pub fn period_window(budget: &Budget, now: NaiveDateTime) -> LedgerResult<PeriodWindow> {
    let today = now.date();
    let out_of_range = || LedgerError::validation(format!("no {} window around {}", budget.period, now));
    let (start, end) = match budget.period {
        BudgetPeriod::Monthly => {
            let (first, next) = month_bounds(today.year(), today.month()).ok_or_else(out_of_range)?;
            (first.and_time(NaiveTime::MIN), one_second_before(next))
        }
        BudgetPeriod::Weekly => {
            let back = u64::from(today.weekday().num_days_from_monday());
            let monday = today.checked_sub_days(Days::new(back)).ok_or_else(out_of_range)?;
            let next_monday = monday.checked_add_days(Days::new(7)).ok_or_else(out_of_range)?;
            (monday.and_time(NaiveTime::MIN), one_second_before(next_monday))
        }
        BudgetPeriod::Yearly => {
            let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).ok_or_else(out_of_range)?;
            let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).ok_or_else(out_of_range)?;
            (first.and_time(NaiveTime::MIN), one_second_before(next))
        }
        BudgetPeriod::Custom => {
            let start = budget.start_date.and_time(NaiveTime::MIN);
            let end = match budget.end_date {
                Some(end) => end.and_hms_opt(23, 59, 59).ok_or_else(out_of_range)?,
                None => now,
            };
            (start, end)
        }
    };
    Ok(PeriodWindow { start, end })
}

/// Expense total over the owner's accounts inside `window`, restricted to
/// the budget's own category when it has one (subcategories not included).
pub fn spent_in_window(
    conn: &Connection,
    budget: &Budget,
    window: &PeriodWindow,
) -> LedgerResult<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT t.amount FROM transactions t JOIN accounts a ON t.account_id=a.id
         WHERE a.user_id=?1 AND t.transaction_type=?2
           AND (t.date || ' ' || t.time) BETWEEN ?3 AND ?4
           AND (?5 IS NULL OR t.category_id=?5)",
    )?;
    let rows = stmt.query_map(
        params![
            budget.user_id,
            TransactionType::Expense,
            window.start.format(WINDOW_FMT).to_string(),
            window.end.format(WINDOW_FMT).to_string(),
            budget.category_id
        ],
        |r| r.get::<_, String>(0),
    )?;
    sum_amounts(rows)
}

pub fn spent_amount(conn: &Connection, budget: &Budget, now: NaiveDateTime) -> LedgerResult<Decimal> {
    let window = period_window(budget, now)?;
    spent_in_window(conn, budget, &window)
}

pub fn remaining_budget(
    conn: &Connection,
    budget: &Budget,
    now: NaiveDateTime,
) -> LedgerResult<Decimal> {
    Ok(budget.amount - spent_amount(conn, budget, now)?)
}

pub fn percentage_used(
    conn: &Connection,
    budget: &Budget,
    now: NaiveDateTime,
) -> LedgerResult<Decimal> {
    Ok(percentage_of(spent_amount(conn, budget, now)?, budget.amount))
}

/// `spent / limit * 100`, capped at 100; 0 for a non-positive limit.
pub fn percentage_of(spent: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    match spent.checked_div(limit).and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED)) {
        Some(p) => p.min(Decimal::ONE_HUNDRED),
        None => Decimal::ONE_HUNDRED,
    }
}

/// Spent, remaining and percentage from a single aggregation.
pub fn evaluate(conn: &Connection, budget: &Budget, now: NaiveDateTime) -> LedgerResult<BudgetStatus> {
    let window = period_window(budget, now)?;
    let spent = spent_in_window(conn, budget, &window)?;
    Ok(BudgetStatus {
        budget: budget.clone(),
        window,
        spent,
        remaining: budget.amount - spent,
        percentage_used: percentage_of(spent, budget.amount),
    })
}

pub fn create_budget(conn: &Connection, new: &NewBudget) -> LedgerResult<Budget> {
    let name = require_name(&new.name, "budget name")?;
    validate_amount(new.amount)?;
    super::users::get_user(conn, new.user_id)?;
    if let Some(cid) = new.category_id {
        get_category(conn, cid)?;
    }
    if let Some(end) = new.end_date {
        if end < new.start_date {
            return Err(LedgerError::validation(format!(
                "end date {} is before start date {}",
                end, new.start_date
            )));
        }
    }
    let exists: Option<i64> = conn
        .query_row(
            "SELECT id FROM budgets WHERE user_id=?1 AND name=?2",
            params![new.user_id, name],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(LedgerError::validation(format!(
            "budget '{}' already exists for this user",
            name
        )));
    }
    conn.execute(
        "INSERT INTO budgets(user_id, name, category_id, amount, period, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.user_id,
            name,
            new.category_id,
            new.amount.to_string(),
            new.period,
            new.start_date,
            new.end_date
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(budget_id = id, %name, period = %new.period, "budget created");
    get_budget(conn, id)
}

pub fn get_budget(conn: &Connection, id: i64) -> LedgerResult<Budget> {
    conn.query_row(
        &format!("SELECT {} FROM budgets WHERE id=?1", Budget::COLUMNS),
        params![id],
        Budget::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("budget", id))
}

pub fn find_budget(conn: &Connection, user_id: i64, name: &str) -> LedgerResult<Budget> {
    conn.query_row(
        &format!(
            "SELECT {} FROM budgets WHERE user_id=?1 AND name=?2",
            Budget::COLUMNS
        ),
        params![user_id, name],
        Budget::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("budget", name))
}

pub fn list_budgets(conn: &Connection, user_id: i64, active_only: bool) -> LedgerResult<Vec<Budget>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM budgets WHERE user_id=?1 AND (NOT ?2 OR is_active=1) ORDER BY name",
        Budget::COLUMNS
    ))?;
    let rows = stmt.query_map(params![user_id, active_only], Budget::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn set_budget_active(conn: &Connection, id: i64, active: bool) -> LedgerResult<()> {
    let n = conn.execute(
        "UPDATE budgets SET is_active=?2 WHERE id=?1",
        params![id, active],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("budget", id));
    }
    Ok(())
}
