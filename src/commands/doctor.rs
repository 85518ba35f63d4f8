// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::{params, Connection};

use crate::ledger::accounts::{check_all_balances, BalanceCheck};
use crate::ledger::categories::CategoryTree;
use crate::models::TransactionType;
use crate::utils::pretty_table;

/// Issues found in the database, as (kind, detail) pairs.
pub fn findings(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();

    // 1) Stored balances that disagree with the transaction history
    for BalanceCheck {
        account_id,
        name,
        stored,
        expected,
    } in check_all_balances(conn)?.into_iter().filter(|c| !c.is_consistent())
    {
        rows.push((
            "balance_drift".to_string(),
            format!(
                "{} (#{}): stored {} expected {} drift {}",
                name,
                account_id,
                stored,
                expected,
                stored - expected
            ),
        ));
    }

    // 2) Category parent chains that loop
    let tree = CategoryTree::load(conn)?;
    if let Err(e) = tree.paths() {
        rows.push(("category_cycle".to_string(), e.to_string()));
    }

    // 3) Transfers that never moved money
    let mut stmt = conn.prepare(
        "SELECT id, date FROM transactions
         WHERE transaction_type=?1 AND to_account_id IS NULL ORDER BY date, id",
    )?;
    let mut cur = stmt.query(params![TransactionType::Transfer])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let d: String = r.get(1)?;
        rows.push(("transfer_without_destination".to_string(), format!("#{} on {}", id, d)));
    }
    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = findings(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
        return Ok(());
    }
    let drift = rows.iter().any(|(k, _)| k == "balance_drift");
    let table = rows.into_iter().map(|(k, d)| vec![k, d]).collect();
    println!("{}", pretty_table(&["Issue", "Detail"], table));
    if drift {
        bail!("stored balances disagree with history");
    }
    Ok(())
}
