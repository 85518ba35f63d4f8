// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares an enum stored as an upper-case TEXT code, with a human label.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($code:literal, $label:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let code = s.trim().to_ascii_uppercase().replace('-', "_");
                match code.as_str() {
                    $($code => Ok($name::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum! {
    AccountType {
        Checking => ("CHECKING", "Checking Account"),
        Savings => ("SAVINGS", "Savings Account"),
        Credit => ("CREDIT", "Credit Card"),
        Investment => ("INVESTMENT", "Investment Account"),
        Loan => ("LOAN", "Loan Account"),
        Cash => ("CASH", "Cash"),
    }
}

text_enum! {
    Currency {
        Usd => ("USD", "US Dollar"),
        Eur => ("EUR", "Euro"),
        Gbp => ("GBP", "British Pound"),
        Jpy => ("JPY", "Japanese Yen"),
        Cad => ("CAD", "Canadian Dollar"),
        Aud => ("AUD", "Australian Dollar"),
    }
}

text_enum! {
    CategoryType {
        Income => ("INCOME", "Income"),
        Expense => ("EXPENSE", "Expense"),
        Both => ("BOTH", "Both"),
    }
}

text_enum! {
    TransactionType {
        Income => ("INCOME", "Income"),
        Expense => ("EXPENSE", "Expense"),
        Transfer => ("TRANSFER", "Transfer"),
    }
}

text_enum! {
    PaymentMethod {
        Cash => ("CASH", "Cash"),
        CreditCard => ("CREDIT_CARD", "Credit Card"),
        DebitCard => ("DEBIT_CARD", "Debit Card"),
        BankTransfer => ("BANK_TRANSFER", "Bank Transfer"),
        Check => ("CHECK", "Check"),
        MobilePay => ("MOBILE_PAY", "Mobile Payment"),
        Other => ("OTHER", "Other"),
    }
}

text_enum! {
    Frequency {
        Daily => ("DAILY", "Daily"),
        Weekly => ("WEEKLY", "Weekly"),
        Biweekly => ("BIWEEKLY", "Bi-weekly"),
        Monthly => ("MONTHLY", "Monthly"),
        Quarterly => ("QUARTERLY", "Quarterly"),
        Yearly => ("YEARLY", "Yearly"),
    }
}

text_enum! {
    BudgetPeriod {
        Monthly => ("MONTHLY", "Monthly"),
        Weekly => ("WEEKLY", "Weekly"),
        Yearly => ("YEARLY", "Yearly"),
        Custom => ("CUSTOM", "Custom Period"),
    }
}

text_enum! {
    /// How the engine treats the transfer paths that cannot keep both legs
    /// balanced: a transfer without a destination and edits of transfers.
    TransferPolicy {
        Lenient => ("LENIENT", "Record and warn"),
        Strict => ("STRICT", "Reject"),
    }
}

impl Default for TransferPolicy {
    fn default() -> Self {
        TransferPolicy::Lenient
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

/// Reads a TEXT column holding an exact decimal.
pub(crate) fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub r#type: AccountType,
    pub account_number: Option<String>,
    pub currency: Currency,
    pub balance: Decimal,
    pub initial_balance: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Account {
    pub(crate) const COLUMNS: &'static str = "id, user_id, name, type, account_number, currency, \
         balance, initial_balance, description, is_active";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Account {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            r#type: r.get(3)?,
            account_number: r.get(4)?,
            currency: r.get(5)?,
            balance: decimal_at(r, 6)?,
            initial_balance: decimal_at(r, 7)?,
            description: r.get(8)?,
            is_active: r.get(9)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub r#type: CategoryType,
    pub parent_id: Option<i64>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Category {
    pub(crate) const COLUMNS: &'static str =
        "id, name, type, parent_id, icon, color, description, is_active";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
            r#type: r.get(2)?,
            parent_id: r.get(3)?,
            icon: r.get(4)?,
            color: r.get(5)?,
            description: r.get(6)?,
            is_active: r.get(7)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
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
    pub is_recurring: bool,
    pub is_verified: bool,
    pub created_by: Option<i64>,
}

impl Transaction {
    pub(crate) const COLUMNS: &'static str = "id, account_id, transaction_type, category_id, \
         amount, title, description, date, time, payment_method, to_account_id, merchant, \
         location, tags, is_recurring, is_verified, created_by";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: r.get(0)?,
            account_id: r.get(1)?,
            transaction_type: r.get(2)?,
            category_id: r.get(3)?,
            amount: decimal_at(r, 4)?,
            title: r.get(5)?,
            description: r.get(6)?,
            date: r.get(7)?,
            time: r.get(8)?,
            payment_method: r.get(9)?,
            to_account_id: r.get(10)?,
            merchant: r.get(11)?,
            location: r.get(12)?,
            tags: r.get(13)?,
            is_recurring: r.get(14)?,
            is_verified: r.get(15)?,
            created_by: r.get(16)?,
        })
    }

    /// Comma-separated tags, trimmed, empties dropped.
    pub fn tags_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: i64,
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
    pub is_active: bool,
    pub auto_create: bool,
}

impl RecurringTransaction {
    pub(crate) const COLUMNS: &'static str = "id, user_id, account_id, transaction_type, \
         category_id, amount, title, description, frequency, start_date, end_date, \
         next_due_date, is_active, auto_create";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RecurringTransaction {
            id: r.get(0)?,
            user_id: r.get(1)?,
            account_id: r.get(2)?,
            transaction_type: r.get(3)?,
            category_id: r.get(4)?,
            amount: decimal_at(r, 5)?,
            title: r.get(6)?,
            description: r.get(7)?,
            frequency: r.get(8)?,
            start_date: r.get(9)?,
            end_date: r.get(10)?,
            next_due_date: r.get(11)?,
            is_active: r.get(12)?,
            auto_create: r.get(13)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub category_id: Option<i64>, // None = every category
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl Budget {
    pub(crate) const COLUMNS: &'static str =
        "id, user_id, name, category_id, amount, period, start_date, end_date, is_active";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Budget {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            category_id: r.get(3)?,
            amount: decimal_at(r, 4)?,
            period: r.get(5)?,
            start_date: r.get(6)?,
            end_date: r.get(7)?,
            is_active: r.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_codes_parse_case_insensitively() {
        assert_eq!("credit-card".parse::<PaymentMethod>().unwrap(), PaymentMethod::CreditCard);
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!("fortnightly".parse::<Frequency>().is_err());
    }

    #[test]
    fn tags_list_trims_and_skips_empty() {
        let t = Transaction {
            id: 1,
            account_id: 1,
            transaction_type: TransactionType::Expense,
            category_id: None,
            amount: Decimal::ONE,
            title: "x".into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            time: NaiveTime::MIN,
            payment_method: PaymentMethod::Cash,
            to_account_id: None,
            merchant: None,
            location: None,
            tags: Some(" food, ,weekly ".into()),
            is_recurring: false,
            is_verified: true,
            created_by: None,
        };
        assert_eq!(t.tags_list(), vec!["food".to_string(), "weekly".to_string()]);
    }
}
