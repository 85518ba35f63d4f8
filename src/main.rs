// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;

use ledgerly::config::Config;
use ledgerly::ledger::transactions::Engine;
use ledgerly::{cli, commands, db, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    logging::init_tracing(matches.get_flag("verbose"));

    let db_arg = matches.get_one::<PathBuf>("db").cloned();
    let mut conn = db::open_or_init(db_arg.as_deref())?;
    let config = Config::load(&conn, matches.get_one::<String>("user").cloned())?;
    let engine = Engine::new(config.transfer_policy);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!(
                "Database initialized at {}",
                db::db_path(db_arg.as_deref())?.display()
            );
        }
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&conn, &config, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, &engine, &config, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&mut conn, &engine, &config, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, &config, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, &config, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, &config, sub)?,
        Some(("config", sub)) => commands::settings::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
