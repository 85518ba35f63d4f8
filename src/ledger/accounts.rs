// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account ledger: account records, the balance mutation primitive, and
//! income/expense aggregates.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{require_name, sum_amounts, validate_balance};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountType, Currency, TransactionType};
use crate::utils::month_bounds;

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: i64,
    pub name: String,
    pub r#type: AccountType,
    pub currency: Currency,
    pub initial_balance: Decimal,
    pub account_number: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub account: Account,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_flow: Decimal,
}

/// Stored balance next to the one implied by the transaction history.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceCheck {
    pub account_id: i64,
    pub name: String,
    pub stored: Decimal,
    pub expected: Decimal,
}

impl BalanceCheck {
    pub fn drift(&self) -> Decimal {
        self.stored - self.expected
    }

    pub fn is_consistent(&self) -> bool {
        self.drift().is_zero()
    }
}

pub fn create_account(conn: &Connection, new: &NewAccount) -> LedgerResult<Account> {
    let name = require_name(&new.name, "account name")?;
    validate_balance(new.initial_balance, "initial balance")?;
    super::users::get_user(conn, new.user_id)?;
    if find_account(conn, new.user_id, &name)?.is_some() {
        return Err(LedgerError::validation(format!(
            "account '{}' already exists for this user",
            name
        )));
    }
    conn.execute(
        "INSERT INTO accounts(user_id, name, type, account_number, currency, balance, initial_balance, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)",
        params![
            new.user_id,
            name,
            new.r#type,
            new.account_number,
            new.currency,
            new.initial_balance.to_string(),
            new.description
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(account_id = id, %name, initial = %new.initial_balance, "account created");
    get_account(conn, id)
}

pub fn get_account(conn: &Connection, id: i64) -> LedgerResult<Account> {
    conn.query_row(
        &format!("SELECT {} FROM accounts WHERE id=?1", Account::COLUMNS),
        params![id],
        Account::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("account", id))
}

pub fn find_account(conn: &Connection, user_id: i64, name: &str) -> LedgerResult<Option<Account>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM accounts WHERE user_id=?1 AND name=?2",
                Account::COLUMNS
            ),
            params![user_id, name],
            Account::from_row,
        )
        .optional()?)
}

pub fn list_accounts(
    conn: &Connection,
    user_id: Option<i64>,
    include_inactive: bool,
) -> LedgerResult<Vec<Account>> {
    let sql = format!(
        "SELECT {} FROM accounts
         WHERE (?1 IS NULL OR user_id=?1) AND (?2 OR is_active=1)
         ORDER BY name",
        Account::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id, include_inactive], Account::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn set_account_active(conn: &Connection, id: i64, active: bool) -> LedgerResult<()> {
    let n = conn.execute(
        "UPDATE accounts SET is_active=?2, updated_at=datetime('now') WHERE id=?1",
        params![id, active],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("account", id));
    }
    tracing::info!(account_id = id, active, "account activity changed");
    Ok(())
}

/// Hard delete, only for accounts nothing refers to. Referenced accounts
/// are deactivated instead.
pub fn delete_account(conn: &Connection, id: i64) -> LedgerResult<()> {
    get_account(conn, id)?;
    let refs: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM transactions WHERE account_id=?1 OR to_account_id=?1)
              + (SELECT COUNT(*) FROM recurring_transactions WHERE account_id=?1)",
        params![id],
        |r| r.get(0),
    )?;
    if refs > 0 {
        return Err(LedgerError::validation(format!(
            "account {} is referenced by {} record(s); deactivate it instead",
            id, refs
        )));
    }
    conn.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    tracing::info!(account_id = id, "account deleted");
    Ok(())
}

/// Adds `delta` to the stored balance.
///
/// Takes an open SQLite transaction so the write can only happen inside the
/// engine's unit of work, next to the transaction row that caused it.
pub(crate) fn apply_delta(
    tx: &rusqlite::Transaction<'_>,
    account_id: i64,
    delta: Decimal,
) -> LedgerResult<Decimal> {
    let current: Option<String> = tx
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .optional()?;
    let current = current.ok_or_else(|| {
        LedgerError::Inconsistency(format!(
            "balance update for missing account {}",
            account_id
        ))
    })?;
    let current = current.parse::<Decimal>().map_err(|_| LedgerError::Corrupt {
        column: "accounts.balance",
        value: current.clone(),
    })?;
    let updated = current.checked_add(delta).ok_or_else(|| {
        LedgerError::validation(format!(
            "balance of account {} overflows when adding {}",
            account_id, delta
        ))
    })?;
    validate_balance(updated, "resulting balance")?;
    tx.execute(
        "UPDATE accounts SET balance=?2, updated_at=datetime('now') WHERE id=?1",
        params![account_id, updated.to_string()],
    )?;
    tracing::debug!(account_id, %delta, balance = %updated, "balance delta applied");
    Ok(updated)
}

fn total_of_type(conn: &Connection, account_id: i64, kind: TransactionType) -> LedgerResult<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions WHERE account_id=?1 AND transaction_type=?2",
    )?;
    let rows = stmt.query_map(params![account_id, kind], |r| r.get::<_, String>(0))?;
    sum_amounts(rows)
}

pub fn total_income(conn: &Connection, account_id: i64) -> LedgerResult<Decimal> {
    total_of_type(conn, account_id, TransactionType::Income)
}

pub fn total_expense(conn: &Connection, account_id: i64) -> LedgerResult<Decimal> {
    total_of_type(conn, account_id, TransactionType::Expense)
}

pub fn monthly_summary(
    conn: &Connection,
    account_id: i64,
    year: i32,
    month: u32,
) -> LedgerResult<MonthlySummary> {
    let (first, next) = month_bounds(year, month).ok_or_else(|| {
        LedgerError::validation(format!("invalid month {}-{:02}", year, month))
    })?;
    let mut stmt = conn.prepare(
        "SELECT transaction_type, amount FROM transactions
         WHERE account_id=?1 AND date>=?2 AND date<?3",
    )?;
    let mut rows = stmt.query(params![account_id, first, next])?;
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut count = 0i64;
    while let Some(r) = rows.next()? {
        let kind: TransactionType = r.get(0)?;
        let amount = crate::models::decimal_at(r, 1)?;
        match kind {
            TransactionType::Income => income += amount,
            TransactionType::Expense => expense += amount,
            TransactionType::Transfer => {}
        }
        count += 1;
    }
    Ok(MonthlySummary {
        income,
        expense,
        net: income - expense,
        transaction_count: count,
    })
}

pub fn account_summary(conn: &Connection, account_id: i64) -> LedgerResult<AccountSummary> {
    let account = get_account(conn, account_id)?;
    let total_income = total_income(conn, account_id)?;
    let total_expense = total_expense(conn, account_id)?;
    Ok(AccountSummary {
        account,
        total_income,
        total_expense,
        net_flow: total_income - total_expense,
    })
}

/// Replays the history of one account: income adds, expense subtracts,
/// transfers move money out of the source and into the destination.
/// Transfers without a destination carry no effect.
pub fn check_balance(conn: &Connection, account_id: i64) -> LedgerResult<BalanceCheck> {
    let account = get_account(conn, account_id)?;
    let mut stmt = conn.prepare(
        "SELECT transaction_type, amount, account_id, to_account_id FROM transactions
         WHERE account_id=?1 OR to_account_id=?1",
    )?;
    let mut rows = stmt.query(params![account_id])?;
    let mut expected = account.initial_balance;
    while let Some(r) = rows.next()? {
        let kind: TransactionType = r.get(0)?;
        let amount = crate::models::decimal_at(r, 1)?;
        let source: i64 = r.get(2)?;
        let dest: Option<i64> = r.get(3)?;
        match kind {
            TransactionType::Income if source == account_id => expected += amount,
            TransactionType::Expense if source == account_id => expected -= amount,
            TransactionType::Transfer if dest.is_some() => {
                if source == account_id {
                    expected -= amount;
                }
                if dest == Some(account_id) {
                    expected += amount;
                }
            }
            _ => {}
        }
    }
    Ok(BalanceCheck {
        account_id,
        name: account.name,
        stored: account.balance,
        expected,
    })
}

pub fn check_all_balances(conn: &Connection) -> LedgerResult<Vec<BalanceCheck>> {
    list_accounts(conn, None, true)?
        .into_iter()
        .map(|a| check_balance(conn, a.id))
        .collect()
}
