// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountType, Currency, PaymentMethod, TransactionType};

#[derive(Debug, Clone, Serialize)]
pub struct TypeTotal {
    pub transaction_type: TransactionType,
    pub count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionStats {
    pub total_transactions: i64,
    pub verified_transactions: i64,
    pub unverified_transactions: i64,
    pub recurring_transactions: i64,
    pub by_type: Vec<TypeTotal>,
    pub payment_methods: Vec<(PaymentMethod, i64)>,
    pub categories: Vec<(String, i64)>,
    /// `YYYY-MM` → count, newest first, at most 12 months.
    pub monthly_counts: Vec<(String, i64)>,
}

/// Aggregates over all transactions, or only those on accounts of `user_id`.
pub fn transaction_stats(conn: &Connection, user_id: Option<i64>) -> LedgerResult<TransactionStats> {
    let mut stmt = conn.prepare(
        "SELECT t.transaction_type, t.amount, t.payment_method, t.is_verified, t.is_recurring,
                c.name, substr(t.date, 1, 7)
         FROM transactions t
         JOIN accounts a ON t.account_id=a.id
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE (?1 IS NULL OR a.user_id=?1)",
    )?;
    let mut rows = stmt.query(params![user_id])?;

    let mut total = 0i64;
    let mut verified = 0i64;
    let mut recurring = 0i64;
    let mut by_type: BTreeMap<&'static str, TypeTotal> = BTreeMap::new();
    let mut methods: BTreeMap<&'static str, (PaymentMethod, i64)> = BTreeMap::new();
    let mut categories: BTreeMap<String, i64> = BTreeMap::new();
    let mut months: BTreeMap<String, i64> = BTreeMap::new();

    while let Some(r) = rows.next()? {
        let kind: TransactionType = r.get(0)?;
        let amount = crate::models::decimal_at(r, 1)?;
        let method: PaymentMethod = r.get(2)?;
        let is_verified: bool = r.get(3)?;
        let is_recurring: bool = r.get(4)?;
        let category: Option<String> = r.get(5)?;
        let month: String = r.get(6)?;

        total += 1;
        if is_verified {
            verified += 1;
        }
        if is_recurring {
            recurring += 1;
        }
        let entry = by_type.entry(kind.as_str()).or_insert(TypeTotal {
            transaction_type: kind,
            count: 0,
            total_amount: Decimal::ZERO,
        });
        entry.count += 1;
        entry.total_amount += amount;
        methods.entry(method.as_str()).or_insert((method, 0)).1 += 1;
        if let Some(c) = category {
            *categories.entry(c).or_insert(0) += 1;
        }
        *months.entry(month).or_insert(0) += 1;
    }

    Ok(TransactionStats {
        total_transactions: total,
        verified_transactions: verified,
        unverified_transactions: total - verified,
        recurring_transactions: recurring,
        by_type: by_type.into_values().collect(),
        payment_methods: methods.into_values().collect(),
        categories: categories.into_iter().collect(),
        monthly_counts: months.into_iter().rev().take(12).collect(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountStats {
    pub total_accounts: i64,
    pub active_accounts: i64,
    pub inactive_accounts: i64,
    pub by_type: Vec<(AccountType, i64)>,
    pub by_currency: Vec<(Currency, i64)>,
    /// Stored balances summed per currency, inactive accounts included.
    pub balance_by_currency: Vec<(Currency, Decimal)>,
}

/// Account counts and balance totals, across all users when `user_id` is `None`.
pub fn account_stats(conn: &Connection, user_id: Option<i64>) -> LedgerResult<AccountStats> {
    let mut stmt = conn.prepare(
        "SELECT type, currency, balance, is_active FROM accounts
         WHERE (?1 IS NULL OR user_id=?1)",
    )?;
    let mut rows = stmt.query(params![user_id])?;

    let mut total = 0i64;
    let mut active = 0i64;
    let mut types: BTreeMap<&'static str, (AccountType, i64)> = BTreeMap::new();
    let mut currencies: BTreeMap<&'static str, (Currency, i64)> = BTreeMap::new();
    let mut balances: BTreeMap<&'static str, (Currency, Decimal)> = BTreeMap::new();

    while let Some(r) = rows.next()? {
        let kind: AccountType = r.get(0)?;
        let currency: Currency = r.get(1)?;
        let balance = crate::models::decimal_at(r, 2)?;
        let is_active: bool = r.get(3)?;

        total += 1;
        if is_active {
            active += 1;
        }
        types.entry(kind.as_str()).or_insert((kind, 0)).1 += 1;
        currencies.entry(currency.as_str()).or_insert((currency, 0)).1 += 1;
        let sum = &mut balances
            .entry(currency.as_str())
            .or_insert((currency, Decimal::ZERO))
            .1;
        *sum = sum.checked_add(balance).ok_or_else(|| {
            LedgerError::Inconsistency(format!("{} balance total overflows", currency))
        })?;
    }

    Ok(AccountStats {
        total_accounts: total,
        active_accounts: active,
        inactive_accounts: total - active,
        by_type: types.into_values().collect(),
        by_currency: currencies.into_values().collect(),
        balance_by_currency: balances.into_values().collect(),
    })
}
