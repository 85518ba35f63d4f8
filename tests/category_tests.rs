// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use ledgerly::db::open_in_memory;
use ledgerly::error::LedgerError;
use ledgerly::ledger::categories::{
    create_category, full_path, list_categories, move_category, resolve_category,
    set_category_active, NewCategory,
};
use ledgerly::models::CategoryType;
use rusqlite::Connection;

fn add(conn: &Connection, name: &str, parent_id: Option<i64>) -> Result<i64, LedgerError> {
    create_category(
        conn,
        &NewCategory {
            name: name.into(),
            r#type: CategoryType::Both,
            parent_id,
            icon: None,
            color: None,
            description: None,
        },
    )
    .map(|c| c.id)
}

#[test]
fn paths_follow_parents_from_the_root() {
    let conn = open_in_memory().unwrap();
    let living = add(&conn, "Living", None).unwrap();
    let food = add(&conn, "Food", Some(living)).unwrap();
    let groceries = add(&conn, "Groceries", Some(food)).unwrap();

    assert_eq!(full_path(&conn, groceries).unwrap(), "Living > Food > Groceries");
    assert_eq!(full_path(&conn, living).unwrap(), "Living");
    assert_eq!(resolve_category(&conn, "Groceries").unwrap().id, groceries);
    assert_eq!(
        resolve_category(&conn, "Living>Food > Groceries").unwrap().id,
        groceries
    );
}

#[test]
fn moves_that_would_create_a_cycle_are_refused() {
    let conn = open_in_memory().unwrap();
    let a = add(&conn, "A", None).unwrap();
    let b = add(&conn, "B", Some(a)).unwrap();
    let c = add(&conn, "C", Some(b)).unwrap();

    assert!(matches!(
        move_category(&conn, a, Some(c)).unwrap_err(),
        LedgerError::Validation(_)
    ));
    assert!(matches!(
        move_category(&conn, a, Some(a)).unwrap_err(),
        LedgerError::Validation(_)
    ));
    assert_eq!(full_path(&conn, c).unwrap(), "A > B > C");

    move_category(&conn, c, None).unwrap();
    assert_eq!(full_path(&conn, c).unwrap(), "C");
}

#[test]
fn names_are_unique_per_parent_only() {
    let conn = open_in_memory().unwrap();
    let home = add(&conn, "Home", None).unwrap();
    let car = add(&conn, "Car", None).unwrap();
    add(&conn, "Insurance", Some(home)).unwrap();
    let car_ins = add(&conn, "Insurance", Some(car)).unwrap();

    assert!(matches!(
        add(&conn, "Insurance", Some(home)).unwrap_err(),
        LedgerError::Validation(_)
    ));
    assert!(add(&conn, "Home", None).is_err());
    assert!(add(&conn, "  ", None).is_err());
    assert!(matches!(
        add(&conn, "Orphan", Some(999)).unwrap_err(),
        LedgerError::NotFound { .. }
    ));
    assert!(move_category(&conn, car_ins, Some(home)).is_err());
    assert!(resolve_category(&conn, "Insurance").is_err());
}

#[test]
fn deactivated_categories_drop_out_of_the_default_listing() {
    let conn = open_in_memory().unwrap();
    let old = add(&conn, "Old", None).unwrap();
    add(&conn, "New", None).unwrap();
    set_category_active(&conn, old, false).unwrap();

    assert_eq!(list_categories(&conn, false).unwrap().len(), 1);
    assert_eq!(list_categories(&conn, true).unwrap().len(), 2);
    assert_eq!(full_path(&conn, old).unwrap(), "Old");
}
