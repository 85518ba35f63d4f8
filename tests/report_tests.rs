// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ledgerly::cli;
use ledgerly::commands::{doctor, reports};
use ledgerly::config::Config;
use ledgerly::db::open_in_memory;
use ledgerly::ledger::accounts::{create_account, set_account_active, NewAccount};
use ledgerly::ledger::categories::{create_category, NewCategory};
use ledgerly::ledger::stats::{account_stats, transaction_stats};
use ledgerly::ledger::transactions::{Engine, NewTransaction};
use ledgerly::ledger::users::create_user;
use ledgerly::models::{
    AccountType, CategoryType, Currency, PaymentMethod, TransactionType, TransferPolicy,
};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

fn amt(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Two users; alice has a busy account, bob a single expense.
fn seeded() -> (Connection, i64, i64) {
    let mut conn = open_in_memory().unwrap();
    let mut accounts = Vec::new();
    for name in ["alice", "bob"] {
        let user = create_user(&conn, name).unwrap();
        let acct = create_account(
            &conn,
            &NewAccount {
                user_id: user.id,
                name: "Main".into(),
                r#type: AccountType::Checking,
                currency: Currency::Usd,
                initial_balance: amt("100"),
                account_number: None,
                description: None,
            },
        )
        .unwrap();
        accounts.push((user.id, acct.id));
    }
    let food = create_category(
        &conn,
        &NewCategory {
            name: "Food".into(),
            r#type: CategoryType::Expense,
            parent_id: None,
            icon: None,
            color: None,
            description: None,
        },
    )
    .unwrap();

    let engine = Engine::new(TransferPolicy::Lenient);
    let (alice, main) = accounts[0];
    let (_, bobs) = accounts[1];
    let mut lunch =
        NewTransaction::new(main, TransactionType::Expense, amt("12.50"), "Lunch", day(2024, 5, 3))
            .with_category(food.id);
    lunch.payment_method = PaymentMethod::DebitCard;
    lunch.is_verified = false;
    engine.create(&mut conn, &lunch).unwrap();
    engine
        .create(
            &mut conn,
            &NewTransaction::new(main, TransactionType::Income, amt("900"), "Pay", day(2024, 4, 30)),
        )
        .unwrap();
    let mut rent =
        NewTransaction::new(main, TransactionType::Expense, amt("400"), "Rent", day(2024, 5, 1));
    rent.is_recurring = true;
    engine.create(&mut conn, &rent).unwrap();
    engine
        .create(
            &mut conn,
            &NewTransaction::new(bobs, TransactionType::Expense, amt("7"), "Snack", day(2024, 5, 4))
                .with_category(food.id),
        )
        .unwrap();
    (conn, alice, main)
}

#[test]
fn stats_are_scoped_to_the_owner() {
    let (conn, alice, _) = seeded();
    let s = transaction_stats(&conn, Some(alice)).unwrap();
    assert_eq!(s.total_transactions, 3);
    assert_eq!(s.verified_transactions, 2);
    assert_eq!(s.unverified_transactions, 1);
    assert_eq!(s.recurring_transactions, 1);

    let expense = s
        .by_type
        .iter()
        .find(|t| t.transaction_type == TransactionType::Expense)
        .unwrap();
    assert_eq!(expense.count, 2);
    assert_eq!(expense.total_amount, amt("412.50"));
    assert!(s.payment_methods.contains(&(PaymentMethod::DebitCard, 1)));
    assert!(s.payment_methods.contains(&(PaymentMethod::Cash, 2)));
    assert_eq!(s.categories, vec![("Food".to_string(), 1)]);
    assert_eq!(
        s.monthly_counts,
        vec![("2024-05".to_string(), 2), ("2024-04".to_string(), 1)]
    );

    let everyone = transaction_stats(&conn, None).unwrap();
    assert_eq!(everyone.total_transactions, 4);
    assert_eq!(everyone.categories, vec![("Food".to_string(), 2)]);
}

#[test]
fn doctor_is_quiet_on_a_consistent_ledger() {
    let (conn, _, _) = seeded();
    assert!(doctor::findings(&conn).unwrap().is_empty());
    assert!(doctor::handle(&conn).is_ok());
}

#[test]
fn doctor_reports_drift_and_dangling_transfers() {
    let (mut conn, _, main) = seeded();
    conn.execute(
        "UPDATE accounts SET balance='1.00' WHERE id=?1",
        params![main],
    )
    .unwrap();
    Engine::new(TransferPolicy::Lenient)
        .create(
            &mut conn,
            &NewTransaction::new(main, TransactionType::Transfer, amt("5"), "Lost", day(2024, 5, 9)),
        )
        .unwrap();

    let kinds: Vec<String> = doctor::findings(&conn)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(kinds, vec!["balance_drift", "transfer_without_destination"]);
    assert!(doctor::handle(&conn).is_err());
}

#[test]
fn account_stats_count_and_total_per_currency() {
    let (conn, alice, _) = seeded();
    let savings = create_account(
        &conn,
        &NewAccount {
            user_id: alice,
            name: "Euro savings".into(),
            r#type: AccountType::Savings,
            currency: Currency::Eur,
            initial_balance: amt("50.25"),
            account_number: None,
            description: None,
        },
    )
    .unwrap();
    set_account_active(&conn, savings.id, false).unwrap();

    let s = account_stats(&conn, Some(alice)).unwrap();
    assert_eq!(s.total_accounts, 2);
    assert_eq!(s.active_accounts, 1);
    assert_eq!(s.inactive_accounts, 1);
    assert!(s.by_type.contains(&(AccountType::Checking, 1)));
    assert!(s.by_type.contains(&(AccountType::Savings, 1)));
    assert!(s.by_currency.contains(&(Currency::Eur, 1)));
    assert!(s.balance_by_currency.contains(&(Currency::Usd, amt("587.50"))));
    assert!(s.balance_by_currency.contains(&(Currency::Eur, amt("50.25"))));

    let everyone = account_stats(&conn, None).unwrap();
    assert_eq!(everyone.total_accounts, 3);
    assert_eq!(everyone.by_type, vec![(AccountType::Checking, 2), (AccountType::Savings, 1)]);
    assert!(everyone.by_currency.contains(&(Currency::Usd, 2)));
    assert!(everyone.balance_by_currency.contains(&(Currency::Usd, amt("680.50"))));
}

#[test]
fn report_accounts_scopes_to_the_configured_user() {
    let (conn, _, _) = seeded();
    let config = Config {
        user: Some("bob".into()),
        default_currency: Currency::Usd,
        transfer_policy: TransferPolicy::Lenient,
    };
    let pick = |args: &[&str]| {
        let matches = cli::build_cli().get_matches_from(args.iter().copied());
        let Some(("report", report_m)) = matches.subcommand() else {
            panic!("no report subcommand");
        };
        let Some(("accounts", sub)) = report_m.subcommand() else {
            panic!("no accounts subcommand");
        };
        reports::accounts(&conn, &config, sub).unwrap()
    };

    let mine = pick(&["ledgerly", "report", "accounts", "--json"]);
    assert_eq!(mine.total_accounts, 1);
    assert_eq!(mine.balance_by_currency, vec![(Currency::Usd, amt("93"))]);
    let all = pick(&["ledgerly", "report", "accounts", "--everyone"]);
    assert_eq!(all.total_accounts, 2);
}
