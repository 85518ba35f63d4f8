// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ledgerly::db::open_in_memory;
use ledgerly::error::LedgerError;
use ledgerly::ledger::accounts::{
    account_summary, check_all_balances, create_account, delete_account, list_accounts,
    monthly_summary, set_account_active, total_expense, total_income, NewAccount,
};
use ledgerly::ledger::transactions::{Engine, NewTransaction};
use ledgerly::ledger::users::create_user;
use ledgerly::models::{AccountType, Currency, TransactionType};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn amt(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_account(user_id: i64, name: &str, opening: &str) -> NewAccount {
    NewAccount {
        user_id,
        name: name.into(),
        r#type: AccountType::Savings,
        currency: Currency::Eur,
        initial_balance: amt(opening),
        account_number: Some("DE00 1234".into()),
        description: None,
    }
}

fn setup() -> (Connection, i64) {
    let conn = open_in_memory().unwrap();
    let user = create_user(&conn, "alice").unwrap();
    (conn, user.id)
}

#[test]
fn new_account_starts_at_its_opening_balance() {
    let (conn, user) = setup();
    let acct = create_account(&conn, &new_account(user, "Rainy day", "250.10")).unwrap();
    assert_eq!(acct.balance, amt("250.10"));
    assert_eq!(acct.initial_balance, amt("250.10"));
    assert!(acct.is_active);

    assert_eq!(total_income(&conn, acct.id).unwrap(), Decimal::ZERO);
    assert_eq!(total_expense(&conn, acct.id).unwrap(), Decimal::ZERO);
    let summary = account_summary(&conn, acct.id).unwrap();
    assert_eq!(summary.net_flow, Decimal::ZERO);
}

#[test]
fn names_are_unique_per_user() {
    let (conn, user) = setup();
    let bob = create_user(&conn, "bob").unwrap();
    create_account(&conn, &new_account(user, "Main", "0")).unwrap();
    assert!(matches!(
        create_account(&conn, &new_account(user, "Main", "0")).unwrap_err(),
        LedgerError::Validation(_)
    ));
    assert!(create_account(&conn, &new_account(bob.id, "Main", "0")).is_ok());
}

#[test]
fn monthly_summary_counts_the_calendar_month() {
    let (mut conn, user) = setup();
    let main = create_account(&conn, &new_account(user, "Main", "0")).unwrap().id;
    let other = create_account(&conn, &new_account(user, "Other", "0")).unwrap().id;
    let engine = Engine::default();
    let book = |conn: &mut Connection, kind: TransactionType, amount: &str, date: NaiveDate| {
        let mut new = NewTransaction::new(main, kind, amt(amount), "x", date);
        if kind == TransactionType::Transfer {
            new = new.with_destination(other);
        }
        engine.create(conn, &new).unwrap();
    };
    book(&mut conn, TransactionType::Income, "1000", day(2024, 2, 1));
    book(&mut conn, TransactionType::Expense, "250.50", day(2024, 2, 14));
    book(&mut conn, TransactionType::Transfer, "100", day(2024, 2, 29));
    book(&mut conn, TransactionType::Expense, "99", day(2024, 3, 1));
    book(&mut conn, TransactionType::Income, "5", day(2024, 1, 31));

    let s = monthly_summary(&conn, main, 2024, 2).unwrap();
    assert_eq!(s.income, amt("1000"));
    assert_eq!(s.expense, amt("250.50"));
    assert_eq!(s.net, amt("749.50"));
    assert_eq!(s.transaction_count, 3);

    let empty = monthly_summary(&conn, main, 2023, 12).unwrap();
    assert_eq!(empty.transaction_count, 0);
    assert!(monthly_summary(&conn, main, 2024, 13).is_err());

    assert_eq!(total_income(&conn, main).unwrap(), amt("1005"));
    assert_eq!(total_expense(&conn, main).unwrap(), amt("349.50"));
    assert!(check_all_balances(&conn).unwrap().iter().all(|c| c.is_consistent()));
}

#[test]
fn referenced_accounts_can_only_be_deactivated() {
    let (mut conn, user) = setup();
    let used = create_account(&conn, &new_account(user, "Used", "0")).unwrap().id;
    let unused = create_account(&conn, &new_account(user, "Unused", "0")).unwrap().id;
    Engine::default()
        .create(
            &mut conn,
            &NewTransaction::new(used, TransactionType::Income, amt("1"), "Seed", day(2024, 1, 1)),
        )
        .unwrap();

    assert!(matches!(
        delete_account(&conn, used).unwrap_err(),
        LedgerError::Validation(_)
    ));
    set_account_active(&conn, used, false).unwrap();
    delete_account(&conn, unused).unwrap();

    assert!(list_accounts(&conn, Some(user), false).unwrap().is_empty());
    assert_eq!(list_accounts(&conn, Some(user), true).unwrap().len(), 1);
}
