// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ledgerly::db::open_in_memory;
use ledgerly::error::LedgerError;
use ledgerly::ledger::accounts::{check_balance, create_account, get_account, NewAccount};
use ledgerly::ledger::transactions::{get_transaction, Engine, TransactionPatch, NewTransaction};
use ledgerly::ledger::users::create_user;
use ledgerly::ledger::{MAX_AMOUNT, MAX_BALANCE};
use ledgerly::models::{AccountType, Currency, TransactionType, TransferPolicy};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn amt(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn account(conn: &Connection, user_id: i64, name: &str, opening: &str) -> i64 {
    create_account(
        conn,
        &NewAccount {
            user_id,
            name: name.into(),
            r#type: AccountType::Checking,
            currency: Currency::Usd,
            initial_balance: amt(opening),
            account_number: None,
            description: None,
        },
    )
    .unwrap()
    .id
}

/// Database with one user owning accounts A (200.00) and B (0.00).
fn setup() -> (Connection, i64, i64) {
    let conn = open_in_memory().unwrap();
    let user = create_user(&conn, "alice").unwrap();
    let a = account(&conn, user.id, "A", "200");
    let b = account(&conn, user.id, "B", "0");
    (conn, a, b)
}

fn balance(conn: &Connection, id: i64) -> Decimal {
    get_account(conn, id).unwrap().balance
}

fn tx_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

fn assert_consistent(conn: &Connection, ids: &[i64]) {
    for id in ids {
        let check = check_balance(conn, *id).unwrap();
        assert!(check.is_consistent(), "drift on account {}: {:?}", id, check);
    }
}

#[test]
fn income_is_added_and_removed_again_on_delete() {
    let (mut conn, a, _) = setup();
    let engine = Engine::default();
    let t = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Income, amt("100"), "Salary", day(2024, 3, 1)),
        )
        .unwrap();
    assert_eq!(balance(&conn, a), amt("300"));
    assert_consistent(&conn, &[a]);

    engine.delete(&mut conn, t.id).unwrap();
    assert_eq!(balance(&conn, a), amt("200"));
    assert_eq!(tx_count(&conn), 0);
    assert_consistent(&conn, &[a]);
}

#[test]
fn transfer_moves_money_and_delete_moves_it_back() {
    let (mut conn, a, b) = setup();
    let engine = Engine::default();
    let t = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Transfer, amt("50"), "Savings", day(2024, 3, 2))
                .with_destination(b),
        )
        .unwrap();
    assert_eq!(balance(&conn, a), amt("150"));
    assert_eq!(balance(&conn, b), amt("50"));
    assert_consistent(&conn, &[a, b]);

    engine.delete(&mut conn, t.id).unwrap();
    assert_eq!(balance(&conn, a), amt("200"));
    assert_eq!(balance(&conn, b), amt("0"));
}

#[test]
fn editing_an_expense_applies_only_the_difference() {
    let (mut conn, a, _) = setup();
    let engine = Engine::default();
    let t = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Expense, amt("100"), "Groceries", day(2024, 3, 3)),
        )
        .unwrap();
    assert_eq!(balance(&conn, a), amt("100"));

    let patch = TransactionPatch {
        amount: Some(amt("70")),
        ..TransactionPatch::default()
    };
    let updated = engine.update(&mut conn, t.id, &patch.apply_to(&t)).unwrap();
    assert_eq!(updated.amount, amt("70"));
    assert_eq!(balance(&conn, a), amt("130"));
    assert_consistent(&conn, &[a]);
}

#[test]
fn editing_the_account_moves_the_effect() {
    let (mut conn, a, b) = setup();
    let engine = Engine::default();
    let t = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Income, amt("25.50"), "Refund", day(2024, 3, 4)),
        )
        .unwrap();
    let patch = TransactionPatch {
        account_id: Some(b),
        ..TransactionPatch::default()
    };
    engine.update(&mut conn, t.id, &patch.apply_to(&t)).unwrap();
    assert_eq!(balance(&conn, a), amt("200"));
    assert_eq!(balance(&conn, b), amt("25.50"));
    assert_consistent(&conn, &[a, b]);
}

#[test]
fn editing_the_type_flips_the_sign() {
    let (mut conn, a, _) = setup();
    let engine = Engine::default();
    let t = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Expense, amt("10"), "Oops", day(2024, 3, 5)),
        )
        .unwrap();
    let patch = TransactionPatch {
        transaction_type: Some(TransactionType::Income),
        ..TransactionPatch::default()
    };
    engine.update(&mut conn, t.id, &patch.apply_to(&t)).unwrap();
    assert_eq!(balance(&conn, a), amt("210"));
}

#[test]
fn lenient_transfer_without_destination_moves_nothing() {
    let (mut conn, a, _) = setup();
    let engine = Engine::new(TransferPolicy::Lenient);
    let t = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Transfer, amt("40"), "Nowhere", day(2024, 3, 6)),
        )
        .unwrap();
    assert_eq!(get_transaction(&conn, t.id).unwrap().to_account_id, None);
    assert_eq!(balance(&conn, a), amt("200"));

    engine.delete(&mut conn, t.id).unwrap();
    assert_eq!(balance(&conn, a), amt("200"));
}

#[test]
fn lenient_transfer_edit_leaves_legs_untouched() {
    let (mut conn, a, b) = setup();
    let engine = Engine::new(TransferPolicy::Lenient);
    let t = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Transfer, amt("50"), "Move", day(2024, 3, 7))
                .with_destination(b),
        )
        .unwrap();
    let patch = TransactionPatch {
        amount: Some(amt("80")),
        ..TransactionPatch::default()
    };
    engine.update(&mut conn, t.id, &patch.apply_to(&t)).unwrap();

    assert_eq!(balance(&conn, a), amt("150"));
    assert_eq!(balance(&conn, b), amt("50"));
    let check = check_balance(&conn, a).unwrap();
    assert_eq!(check.expected, amt("120"));
    assert_eq!(check.drift(), amt("30"));
}

#[test]
fn strict_policy_rejects_transfer_gaps() {
    let (mut conn, a, b) = setup();
    let engine = Engine::new(TransferPolicy::Strict);

    let err = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Transfer, amt("40"), "Nowhere", day(2024, 3, 8)),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Transfer, amt("40"), "Self", day(2024, 3, 8))
                .with_destination(a),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(tx_count(&conn), 0);

    let t = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Transfer, amt("40"), "Move", day(2024, 3, 8))
                .with_destination(b),
        )
        .unwrap();
    let patch = TransactionPatch {
        amount: Some(amt("60")),
        ..TransactionPatch::default()
    };
    let err = engine.update(&mut conn, t.id, &patch.apply_to(&t)).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(get_transaction(&conn, t.id).unwrap().amount, amt("40"));
    assert_consistent(&conn, &[a, b]);
}

#[test]
fn invalid_input_is_rejected_before_anything_is_written() {
    let (mut conn, a, _) = setup();
    let engine = Engine::default();
    for bad in ["0", "-5", "0.001"] {
        let err = engine
            .create(
                &mut conn,
                &NewTransaction::new(a, TransactionType::Expense, amt(bad), "Bad", day(2024, 3, 9)),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)), "amount {}", bad);
    }
    let err = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Expense, amt("5"), "   ", day(2024, 3, 9)),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = engine
        .create(
            &mut conn,
            &NewTransaction::new(999, TransactionType::Expense, amt("5"), "Ghost", day(2024, 3, 9)),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));

    assert_eq!(tx_count(&conn), 0);
    assert_eq!(balance(&conn, a), amt("200"));
}

#[test]
fn missing_transactions_are_not_found() {
    let (mut conn, _, _) = setup();
    let engine = Engine::default();
    assert!(matches!(
        engine.delete(&mut conn, 42).unwrap_err(),
        LedgerError::NotFound { .. }
    ));
    assert!(matches!(
        get_transaction(&conn, 42).unwrap_err(),
        LedgerError::NotFound { .. }
    ));
}

#[test]
fn failed_balance_write_rolls_back_the_whole_unit() {
    let (mut conn, a, b) = setup();
    conn.execute_batch(&format!(
        "CREATE TRIGGER block_b BEFORE UPDATE OF balance ON accounts WHEN NEW.id = {b}
         BEGIN SELECT RAISE(ABORT, 'balance locked'); END;"
    ))
    .unwrap();
    let engine = Engine::default();
    let err = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Transfer, amt("50"), "Blocked", day(2024, 3, 10))
                .with_destination(b),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Sql(_)));

    assert_eq!(tx_count(&conn), 0);
    assert_eq!(balance(&conn, a), amt("200"));
    assert_eq!(balance(&conn, b), amt("0"));
}

#[test]
fn balance_overflow_is_an_error_and_rolls_back() {
    let (mut conn, a, b) = setup();
    let engine = Engine::default();

    conn.execute(
        "UPDATE accounts SET balance=?2 WHERE id=?1",
        rusqlite::params![a, Decimal::MAX.to_string()],
    )
    .unwrap();
    let err = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Income, amt("1"), "Bonus", day(2024, 3, 1)),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(balance(&conn, a), Decimal::MAX);
    assert_eq!(tx_count(&conn), 0);

    // The source leg succeeds before the destination leg hits the ceiling.
    conn.execute(
        "UPDATE accounts SET balance='200' WHERE id=?1",
        rusqlite::params![a],
    )
    .unwrap();
    conn.execute(
        "UPDATE accounts SET balance=?2 WHERE id=?1",
        rusqlite::params![b, MAX_BALANCE.to_string()],
    )
    .unwrap();
    let err = engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Transfer, amt("50"), "Top up", day(2024, 3, 2))
                .with_destination(b),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(balance(&conn, a), amt("200"));
    assert_eq!(balance(&conn, b), MAX_BALANCE);
    assert_eq!(tx_count(&conn), 0);
}

#[test]
fn amounts_and_opening_balances_are_capped() {
    let (mut conn, a, _) = setup();
    let engine = Engine::default();
    let err = engine
        .create(
            &mut conn,
            &NewTransaction::new(
                a,
                TransactionType::Expense,
                amt("100000000.00"),
                "Too much",
                day(2024, 3, 3),
            ),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    engine
        .create(
            &mut conn,
            &NewTransaction::new(a, TransactionType::Income, MAX_AMOUNT, "Jackpot", day(2024, 3, 3)),
        )
        .unwrap();
    assert_eq!(balance(&conn, a), MAX_AMOUNT + amt("200"));

    let user_id: i64 = conn
        .query_row("SELECT user_id FROM accounts WHERE id=?1", [a], |r| r.get(0))
        .unwrap();
    let huge = create_account(
        &conn,
        &NewAccount {
            user_id,
            name: "Huge".into(),
            r#type: AccountType::Savings,
            currency: Currency::Usd,
            initial_balance: Decimal::MAX,
            account_number: None,
            description: None,
        },
    );
    assert!(matches!(huge, Err(LedgerError::Validation(_))));
}

#[test]
fn balances_match_history_after_a_mixed_sequence() {
    let (mut conn, a, b) = setup();
    let engine = Engine::default();
    let mut ids = Vec::new();
    let steps: [(TransactionType, &str, bool); 6] = [
        (TransactionType::Income, "1000", false),
        (TransactionType::Expense, "19.99", false),
        (TransactionType::Transfer, "300", true),
        (TransactionType::Expense, "0.01", false),
        (TransactionType::Transfer, "45.50", true),
        (TransactionType::Income, "12.34", false),
    ];
    for (i, (kind, amount, to_b)) in steps.into_iter().enumerate() {
        let mut new = NewTransaction::new(a, kind, amt(amount), "step", day(2024, 4, i as u32 + 1));
        if to_b {
            new = new.with_destination(b);
        }
        ids.push(engine.create(&mut conn, &new).unwrap());
    }
    assert_eq!(balance(&conn, a), amt("846.84"));
    assert_eq!(balance(&conn, b), amt("345.50"));
    assert_consistent(&conn, &[a, b]);

    let patch = TransactionPatch {
        amount: Some(amt("20")),
        ..TransactionPatch::default()
    };
    engine.update(&mut conn, ids[1].id, &patch.apply_to(&ids[1])).unwrap();
    engine.delete(&mut conn, ids[2].id).unwrap();
    engine.delete(&mut conn, ids[5].id).unwrap();
    assert_eq!(balance(&conn, a), amt("1134.49"));
    assert_eq!(balance(&conn, b), amt("45.50"));
    assert_consistent(&conn, &[a, b]);
}
