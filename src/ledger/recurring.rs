// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring templates. Firing a template books one transaction through the
//! engine and moves the template's due-date cursor forward one step.

use chrono::{Days, Months, NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use serde::Serialize;

use super::accounts::get_account;
use super::categories::get_category;
use super::transactions::{Engine, NewTransaction};
use super::{require_name, validate_amount};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Frequency, RecurringTransaction, Transaction, TransactionType};

#[derive(Debug, Clone)]
pub struct NewRecurring {
    pub user_id: i64,
    pub account_id: i64,
    pub transaction_type: TransactionType,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub auto_create: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Fired {
    pub template_id: i64,
    pub transaction: Transaction,
    pub next_due_date: NaiveDate,
}

/// One calendar step after `date`. Month-based steps clamp to the last day
/// of the target month (Jan 31 + 1 month = Feb 28/29).
pub fn next_occurrence(frequency: Frequency, date: NaiveDate) -> LedgerResult<NaiveDate> {
    let next = match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Biweekly => date.checked_add_days(Days::new(14)),
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
        Frequency::Quarterly => date.checked_add_months(Months::new(3)),
        Frequency::Yearly => date.checked_add_months(Months::new(12)),
    };
    next.ok_or_else(|| {
        LedgerError::validation(format!("{} step from {} is out of range", frequency, date))
    })
}

pub fn create_recurring(conn: &Connection, new: &NewRecurring) -> LedgerResult<RecurringTransaction> {
    validate_amount(new.amount)?;
    let title = require_name(&new.title, "title")?;
    let account = get_account(conn, new.account_id)?;
    if account.user_id != new.user_id {
        return Err(LedgerError::validation(format!(
            "account '{}' does not belong to user {}",
            account.name, new.user_id
        )));
    }
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
    conn.execute(
        "INSERT INTO recurring_transactions(user_id, account_id, transaction_type, category_id,
            amount, title, description, frequency, start_date, end_date, next_due_date, auto_create)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            new.user_id,
            new.account_id,
            new.transaction_type,
            new.category_id,
            new.amount.to_string(),
            title,
            new.description,
            new.frequency,
            new.start_date,
            new.end_date,
            new.next_due_date,
            new.auto_create
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(template_id = id, frequency = %new.frequency, next_due = %new.next_due_date, "recurring template created");
    get_recurring(conn, id)
}

pub fn get_recurring(conn: &Connection, id: i64) -> LedgerResult<RecurringTransaction> {
    conn.query_row(
        &format!(
            "SELECT {} FROM recurring_transactions WHERE id=?1",
            RecurringTransaction::COLUMNS
        ),
        params![id],
        RecurringTransaction::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("recurring template", id))
}

/// Ordered by next due date.
pub fn list_recurring(
    conn: &Connection,
    user_id: Option<i64>,
    active_only: bool,
) -> LedgerResult<Vec<RecurringTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM recurring_transactions
         WHERE (?1 IS NULL OR user_id=?1) AND (NOT ?2 OR is_active=1)
         ORDER BY next_due_date, id",
        RecurringTransaction::COLUMNS
    ))?;
    let rows = stmt.query_map(params![user_id, active_only], RecurringTransaction::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn set_recurring_active(conn: &Connection, id: i64, active: bool) -> LedgerResult<()> {
    let n = conn.execute(
        "UPDATE recurring_transactions SET is_active=?2 WHERE id=?1",
        params![id, active],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("recurring template", id));
    }
    tracing::info!(template_id = id, active, "recurring template activity changed");
    Ok(())
}

/// Active auto-create templates whose cursor is on or before `as_of` and
/// not past their end date.
pub fn due_templates(conn: &Connection, as_of: NaiveDate) -> LedgerResult<Vec<RecurringTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM recurring_transactions
         WHERE is_active=1 AND auto_create=1 AND next_due_date<=?1
           AND (end_date IS NULL OR next_due_date<=end_date)
         ORDER BY next_due_date, id",
        RecurringTransaction::COLUMNS
    ))?;
    let rows = stmt.query_map(params![as_of], RecurringTransaction::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Books one occurrence of template `id` and advances its cursor by one
/// step, in a single unit of work. Missed periods are not caught up; call
/// again for each one.
pub fn fire(engine: &Engine, conn: &mut Connection, id: i64) -> LedgerResult<Fired> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let template = get_recurring(&tx, id)?;
    if !template.is_active {
        return Err(LedgerError::validation(format!(
            "recurring template {} is inactive",
            id
        )));
    }

    let booked = NewTransaction {
        category_id: template.category_id,
        description: template.description.clone(),
        time: NaiveTime::MIN,
        is_recurring: true,
        created_by: Some(template.user_id),
        ..NewTransaction::new(
            template.account_id,
            template.transaction_type,
            template.amount,
            template.title.clone(),
            template.next_due_date,
        )
    };
    let transaction = engine.create_in(&tx, &booked)?;

    let next_due_date = next_occurrence(template.frequency, template.next_due_date)?;
    tx.execute(
        "UPDATE recurring_transactions SET next_due_date=?2 WHERE id=?1",
        params![id, next_due_date],
    )?;
    tx.commit()?;

    tracing::info!(
        template_id = id,
        transaction_id = transaction.id,
        next_due = %next_due_date,
        "recurring template fired"
    );
    Ok(Fired {
        template_id: id,
        transaction,
        next_due_date,
    })
}

/// Fires every due template once. Each firing is its own unit of work; a
/// failing template is logged and skipped so the others still run.
pub fn run_due(
    engine: &Engine,
    conn: &mut Connection,
    as_of: NaiveDate,
) -> LedgerResult<(Vec<Fired>, Vec<(i64, LedgerError)>)> {
    let due = due_templates(conn, as_of)?;
    let mut fired = Vec::with_capacity(due.len());
    let mut failed = Vec::new();
    for t in due {
        match fire(engine, conn, t.id) {
            Ok(f) => fired.push(f),
            Err(e) => {
                tracing::warn!(template_id = t.id, error = %e, "recurring template failed to fire");
                failed.push((t.id, e));
            }
        }
    }
    Ok((fired, failed))
}
