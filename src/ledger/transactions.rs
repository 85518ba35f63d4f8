// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction engine: the only writer of account balances.
//!
//! Each operation validates its input, then writes the transaction row and
//! the matching balance deltas inside one `BEGIN IMMEDIATE` SQLite
//! transaction. If any step fails the whole unit rolls back, so a stored
//! transaction never exists without its balance effect.
//!
//! Balance effects per type:
//!
//! | event  | INCOME   | EXPENSE  | TRANSFER (with destination)     |
//! |--------|----------|----------|---------------------------------|
//! | create | +amount  | -amount  | source -amount, dest +amount    |
//! | delete | -amount  | +amount  | source +amount, dest -amount    |
//!
//! Updates reverse the old INCOME/EXPENSE effect on the old account and
//! apply the new one on the new account. Transfer legs are not touched by
//! updates, and a transfer without a destination has no effect at all;
//! under [`TransferPolicy::Strict`] both cases are rejected instead.

use chrono::{NaiveDate, NaiveTime, Timelike};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;

use super::accounts::{apply_delta, get_account};
use super::categories::get_category;
use super::{require_name, validate_amount};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{PaymentMethod, Transaction, TransactionType, TransferPolicy};

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub transaction_type: TransactionType,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub payment_method: PaymentMethod,
    pub to_account_id: Option<i64>,
    pub merchant: Option<String>,
    pub location: Option<String>,
    pub tags: Option<String>,
    pub is_verified: bool,
    pub is_recurring: bool,
    pub created_by: Option<i64>,
}

impl NewTransaction {
    /// A verified, cash, midnight transaction with no optional fields set.
    pub fn new(
        account_id: i64,
        transaction_type: TransactionType,
        amount: Decimal,
        title: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        NewTransaction {
            account_id,
            transaction_type,
            category_id: None,
            amount,
            title: title.into(),
            description: None,
            date,
            time: NaiveTime::MIN,
            payment_method: PaymentMethod::default(),
            to_account_id: None,
            merchant: None,
            location: None,
            tags: None,
            is_verified: true,
            is_recurring: false,
            created_by: None,
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_destination(mut self, to_account_id: i64) -> Self {
        self.to_account_id = Some(to_account_id);
        self
    }

    pub fn at(mut self, time: NaiveTime) -> Self {
        self.time = time;
        self
    }
}

impl From<&Transaction> for NewTransaction {
    fn from(t: &Transaction) -> Self {
        NewTransaction {
            account_id: t.account_id,
            transaction_type: t.transaction_type,
            category_id: t.category_id,
            amount: t.amount,
            title: t.title.clone(),
            description: t.description.clone(),
            date: t.date,
            time: t.time,
            payment_method: t.payment_method,
            to_account_id: t.to_account_id,
            merchant: t.merchant.clone(),
            location: t.location.clone(),
            tags: t.tags.clone(),
            is_verified: t.is_verified,
            is_recurring: t.is_recurring,
            created_by: t.created_by,
        }
    }
}

/// Field overrides for an edit; `None` keeps the stored value.
///
/// Optional columns use `Option<Option<_>>` so an edit can clear them.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub account_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<Option<i64>>,
    pub amount: Option<Decimal>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub payment_method: Option<PaymentMethod>,
    pub to_account_id: Option<Option<i64>>,
    pub merchant: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub tags: Option<Option<String>>,
    pub is_verified: Option<bool>,
}

impl TransactionPatch {
    pub fn apply_to(&self, existing: &Transaction) -> NewTransaction {
        let mut n = NewTransaction::from(existing);
        if let Some(v) = self.account_id {
            n.account_id = v;
        }
        if let Some(v) = self.transaction_type {
            n.transaction_type = v;
        }
        if let Some(v) = self.category_id {
            n.category_id = v;
        }
        if let Some(v) = self.amount {
            n.amount = v;
        }
        if let Some(v) = &self.title {
            n.title = v.clone();
        }
        if let Some(v) = &self.description {
            n.description = v.clone();
        }
        if let Some(v) = self.date {
            n.date = v;
        }
        if let Some(v) = self.time {
            n.time = v;
        }
        if let Some(v) = self.payment_method {
            n.payment_method = v;
        }
        if let Some(v) = self.to_account_id {
            n.to_account_id = v;
        }
        if let Some(v) = &self.merchant {
            n.merchant = v.clone();
        }
        if let Some(v) = &self.location {
            n.location = v.clone();
        }
        if let Some(v) = &self.tags {
            n.tags = v.clone();
        }
        if let Some(v) = self.is_verified {
            n.is_verified = v;
        }
        n
    }
}

/// Filter for [`list_transactions`]. Empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Option<i64>,
    pub account_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub month: Option<(i32, u32)>,
    pub limit: Option<usize>,
}

/// Applies transactions to the ledger. Built once per process from the
/// configured [`TransferPolicy`] and handed to whatever needs to write.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    transfers: TransferPolicy,
}

impl Engine {
    pub fn new(transfers: TransferPolicy) -> Self {
        Engine { transfers }
    }

    pub fn create(&self, conn: &mut Connection, new: &NewTransaction) -> LedgerResult<Transaction> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = self.create_in(&tx, new)?;
        tx.commit()?;
        Ok(created)
    }

    /// Create path shared with the recurring scheduler, which supplies its
    /// own unit of work.
    pub(crate) fn create_in(
        &self,
        tx: &rusqlite::Transaction<'_>,
        new: &NewTransaction,
    ) -> LedgerResult<Transaction> {
        let title = self.validate(tx, new)?;
        if new.transaction_type == TransactionType::Transfer && new.to_account_id.is_none() {
            if self.transfers == TransferPolicy::Strict {
                return Err(LedgerError::validation(
                    "transfer requires a destination account",
                ));
            }
            tracing::warn!(
                account_id = new.account_id,
                amount = %new.amount,
                "transfer recorded without destination; no balance effect applied"
            );
        }

        tx.execute(
            "INSERT INTO transactions(account_id, transaction_type, category_id, amount, title,
                description, date, time, payment_method, to_account_id, merchant, location, tags,
                is_recurring, is_verified, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                new.account_id,
                new.transaction_type,
                new.category_id,
                new.amount.to_string(),
                title,
                new.description,
                new.date,
                time_text(new.time),
                new.payment_method,
                new.to_account_id,
                new.merchant,
                new.location,
                new.tags,
                new.is_recurring,
                new.is_verified,
                new.created_by
            ],
        )?;
        let id = tx.last_insert_rowid();

        match new.transaction_type {
            TransactionType::Income => {
                apply_delta(tx, new.account_id, new.amount)?;
            }
            TransactionType::Expense => {
                apply_delta(tx, new.account_id, -new.amount)?;
            }
            TransactionType::Transfer => {
                if let Some(dest) = new.to_account_id {
                    apply_delta(tx, new.account_id, -new.amount)?;
                    apply_delta(tx, dest, new.amount)?;
                }
            }
        }

        tracing::info!(
            transaction_id = id,
            kind = %new.transaction_type,
            amount = %new.amount,
            account_id = new.account_id,
            "transaction created"
        );
        get_transaction(tx, id)
    }

    /// Replaces every field of transaction `id` with `new`.
    pub fn update(
        &self,
        conn: &mut Connection,
        id: i64,
        new: &NewTransaction,
    ) -> LedgerResult<Transaction> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let old = get_transaction(&tx, id)?;
        let title = self.validate(&tx, new)?;

        let touches_transfer = old.transaction_type == TransactionType::Transfer
            || new.transaction_type == TransactionType::Transfer;
        if touches_transfer {
            if self.transfers == TransferPolicy::Strict {
                return Err(LedgerError::validation(
                    "transfers cannot be edited; delete and re-create them",
                ));
            }
            tracing::warn!(
                transaction_id = id,
                "transfer legs are not reversed or reapplied on update"
            );
        }

        match old.transaction_type {
            TransactionType::Income => {
                apply_delta(&tx, old.account_id, -old.amount)?;
            }
            TransactionType::Expense => {
                apply_delta(&tx, old.account_id, old.amount)?;
            }
            TransactionType::Transfer => {}
        }

        tx.execute(
            "UPDATE transactions SET account_id=?2, transaction_type=?3, category_id=?4, amount=?5,
                title=?6, description=?7, date=?8, time=?9, payment_method=?10, to_account_id=?11,
                merchant=?12, location=?13, tags=?14, is_recurring=?15, is_verified=?16,
                created_by=?17, updated_at=datetime('now')
             WHERE id=?1",
            params![
                id,
                new.account_id,
                new.transaction_type,
                new.category_id,
                new.amount.to_string(),
                title,
                new.description,
                new.date,
                time_text(new.time),
                new.payment_method,
                new.to_account_id,
                new.merchant,
                new.location,
                new.tags,
                new.is_recurring,
                new.is_verified,
                new.created_by
            ],
        )?;

        match new.transaction_type {
            TransactionType::Income => {
                apply_delta(&tx, new.account_id, new.amount)?;
            }
            TransactionType::Expense => {
                apply_delta(&tx, new.account_id, -new.amount)?;
            }
            TransactionType::Transfer => {}
        }

        let updated = get_transaction(&tx, id)?;
        tx.commit()?;
        tracing::info!(
            transaction_id = id,
            old_amount = %old.amount,
            new_amount = %updated.amount,
            "transaction updated"
        );
        Ok(updated)
    }

    /// Reverses the creation effect of transaction `id` and removes it.
    pub fn delete(&self, conn: &mut Connection, id: i64) -> LedgerResult<Transaction> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let old = get_transaction(&tx, id)?;

        match old.transaction_type {
            TransactionType::Income => {
                apply_delta(&tx, old.account_id, -old.amount)?;
            }
            TransactionType::Expense => {
                apply_delta(&tx, old.account_id, old.amount)?;
            }
            TransactionType::Transfer => {
                if let Some(dest) = old.to_account_id {
                    apply_delta(&tx, old.account_id, old.amount)?;
                    apply_delta(&tx, dest, -old.amount)?;
                }
            }
        }

        let n = tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
        if n != 1 {
            return Err(LedgerError::Inconsistency(format!(
                "transaction {} vanished during delete",
                id
            )));
        }
        tx.commit()?;
        tracing::info!(transaction_id = id, kind = %old.transaction_type, "transaction deleted");
        Ok(old)
    }

    fn validate(&self, conn: &Connection, new: &NewTransaction) -> LedgerResult<String> {
        validate_amount(new.amount)?;
        let title = require_name(&new.title, "title")?;
        get_account(conn, new.account_id)?;
        if let Some(cid) = new.category_id {
            get_category(conn, cid)?;
        }
        if new.transaction_type == TransactionType::Transfer {
            if let Some(dest) = new.to_account_id {
                get_account(conn, dest)?;
                if dest == new.account_id && self.transfers == TransferPolicy::Strict {
                    return Err(LedgerError::validation(
                        "transfer destination must differ from the source account",
                    ));
                }
            }
        }
        Ok(title)
    }
}

/// Times are kept at whole seconds so date+time strings compare in order.
fn time_text(t: NaiveTime) -> String {
    t.with_nanosecond(0).unwrap_or(t).format("%H:%M:%S").to_string()
}

pub fn get_transaction(conn: &Connection, id: i64) -> LedgerResult<Transaction> {
    conn.query_row(
        &format!("SELECT {} FROM transactions WHERE id=?1", Transaction::COLUMNS),
        params![id],
        Transaction::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("transaction", id))
}

/// Newest first.
pub fn list_transactions(
    conn: &Connection,
    filter: &TransactionFilter,
) -> LedgerResult<Vec<Transaction>> {
    let (from, to) = match filter.month {
        Some((y, m)) => {
            let (first, next) = crate::utils::month_bounds(y, m).ok_or_else(|| {
                LedgerError::validation(format!("invalid month {}-{:02}", y, m))
            })?;
            (Some(first), Some(next))
        }
        None => (None, None),
    };
    let cols = Transaction::COLUMNS
        .split(", ")
        .map(|c| format!("t.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {cols} FROM transactions t JOIN accounts a ON t.account_id=a.id
         WHERE (?1 IS NULL OR a.user_id=?1)
           AND (?2 IS NULL OR t.account_id=?2 OR t.to_account_id=?2)
           AND (?3 IS NULL OR t.transaction_type=?3)
           AND (?4 IS NULL OR t.category_id=?4)
           AND (?5 IS NULL OR t.date>=?5)
           AND (?6 IS NULL OR t.date<?6)
         ORDER BY t.date DESC, t.time DESC, t.id DESC
         LIMIT ?7"
    );
    let limit = filter
        .limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            filter.user_id,
            filter.account_id,
            filter.transaction_type,
            filter.category_id,
            from,
            to,
            limit
        ],
        Transaction::from_row,
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
