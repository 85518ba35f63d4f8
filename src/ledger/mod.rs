// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bookkeeping core: balance maintenance, recurring templates, budgets.
//!
//! Account balances are only written by [`transactions::Engine`]; every
//! other module here either manages plain records or derives figures from
//! the transaction table.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod recurring;
pub mod stats;
pub mod transactions;
pub mod users;

use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};

/// Largest single amount: ten digits with two of them after the point.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Largest balance magnitude: twelve digits with two after the point.
pub const MAX_BALANCE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Amounts are positive with cent precision; direction comes from the type.
pub(crate) fn validate_amount(amount: Decimal) -> LedgerResult<()> {
    if amount < Decimal::new(1, 2) {
        return Err(LedgerError::validation(format!(
            "amount must be at least 0.01, got {}",
            amount
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::validation(format!(
            "amount {} exceeds the limit of {}",
            amount, MAX_AMOUNT
        )));
    }
    if amount.normalize().scale() > 2 {
        return Err(LedgerError::validation(format!(
            "amount {} has more than two decimal places",
            amount
        )));
    }
    Ok(())
}

pub(crate) fn require_name(value: &str, what: &str) -> LedgerResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(LedgerError::validation(format!("{} cannot be empty", what)));
    }
    Ok(v.to_string())
}

/// Balances stay within [`MAX_BALANCE`] on either side of zero.
pub(crate) fn validate_balance(balance: Decimal, what: &str) -> LedgerResult<()> {
    if balance.abs() > MAX_BALANCE {
        return Err(LedgerError::validation(format!(
            "{} {} exceeds the limit of {}",
            what, balance, MAX_BALANCE
        )));
    }
    if balance.normalize().scale() > 2 {
        return Err(LedgerError::validation(format!(
            "{} {} has more than two decimal places",
            what, balance
        )));
    }
    Ok(())
}

/// Sums TEXT amounts exactly.
pub(crate) fn sum_amounts<I>(amounts: I) -> LedgerResult<Decimal>
where
    I: IntoIterator<Item = rusqlite::Result<String>>,
{
    let mut total = Decimal::ZERO;
    for a in amounts {
        let s = a?;
        let amount = s.parse::<Decimal>().map_err(|_| LedgerError::Corrupt {
            column: "amount",
            value: s.clone(),
        })?;
        total = total
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Inconsistency(format!("sum overflows at {}", s)))?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_rules() {
        assert!(validate_amount(Decimal::new(1, 2)).is_ok());
        assert!(validate_amount(Decimal::new(12050, 3)).is_ok()); // 12.050
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::new(-5, 0)).is_err());
        assert!(validate_amount(Decimal::new(1001, 3)).is_err());
        assert!(validate_amount(Decimal::new(9_999_999_999, 2)).is_ok());
        assert!(validate_amount(Decimal::new(10_000_000_000, 2)).is_err());
    }

    #[test]
    fn limits_match_their_digit_counts() {
        assert_eq!(MAX_AMOUNT, Decimal::new(9_999_999_999, 2));
        assert_eq!(MAX_BALANCE, Decimal::new(999_999_999_999, 2));
        assert!(validate_balance(-MAX_BALANCE, "balance").is_ok());
        assert!(validate_balance(MAX_BALANCE + Decimal::new(1, 2), "balance").is_err());
        assert!(validate_balance(Decimal::new(1001, 3), "balance").is_err());
    }

    #[test]
    fn sum_reports_overflow_instead_of_panicking() {
        let rows = vec![Ok(Decimal::MAX.to_string()), Ok("1".to_string())];
        assert!(matches!(
            sum_amounts(rows),
            Err(LedgerError::Inconsistency(_))
        ));
    }
}
