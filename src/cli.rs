// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

use crate::config::{DB_ENV, USER_ENV};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
        .help("Record id")
}

/// Optional transaction fields shared by `tx add` and `tx edit`.
fn tx_detail_args(cmd: Command) -> Command {
    cmd.arg(opt("date", "YYYY-MM-DD"))
        .arg(opt("time", "HH:MM[:SS]"))
        .arg(opt("category", "Category name or 'Parent > Child' path"))
        .arg(opt("to", "Destination account (transfers)"))
        .arg(opt("method", "cash|credit-card|debit-card|bank-transfer|check|mobile-pay|other"))
        .arg(opt("merchant", "Store or merchant name"))
        .arg(opt("location", "Where it happened"))
        .arg(opt("tags", "Comma-separated tags"))
        .arg(opt("description", "Free text"))
}

pub fn build_cli() -> Command {
    Command::new("ledgerly")
        .version(clap::crate_version!())
        .about("Personal bookkeeping: accounts, transactions, recurring templates, budgets")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env(DB_ENV)
                .value_parser(value_parser!(PathBuf))
                .help("SQLite database file"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .env(USER_ENV)
                .help("Act as this user"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(Command::new("add").arg(Arg::new("name").required(true)))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Account name"))
                        .arg(req("type", "checking|savings|credit|investment|loan|cash"))
                        .arg(opt("currency", "USD|EUR|GBP|JPY|CAD|AUD"))
                        .arg(opt("initial", "Starting balance").default_value("0"))
                        .arg(opt("number", "Account number for reference"))
                        .arg(opt("description", "Free text")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(flag("all", "Include inactive accounts")),
                ))
                .subcommand(json_flags(
                    Command::new("show").arg(req("name", "Account name")),
                ))
                .subcommand(json_flags(
                    Command::new("month")
                        .arg(req("name", "Account name"))
                        .arg(req("month", "YYYY-MM")),
                ))
                .subcommand(Command::new("deactivate").arg(req("name", "Account name")))
                .subcommand(Command::new("activate").arg(req("name", "Account name")))
                .subcommand(Command::new("rm").arg(req("name", "Account name"))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage the category tree")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Category name"))
                        .arg(opt("type", "income|expense|both").default_value("both"))
                        .arg(opt("parent", "Parent name or path"))
                        .arg(opt("icon", "Icon name or emoji"))
                        .arg(opt("color", "Hex colour"))
                        .arg(opt("description", "Free text")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(flag("all", "Include inactive categories")),
                ))
                .subcommand(
                    Command::new("move")
                        .arg(req("category", "Category name or path"))
                        .arg(opt("parent", "New parent name or path"))
                        .arg(flag("root", "Make it a root category").conflicts_with("parent")),
                )
                .subcommand(
                    Command::new("deactivate").arg(req("category", "Category name or path")),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and inspect transactions")
                .subcommand(tx_detail_args(
                    Command::new("add")
                        .arg(req("account", "Account name"))
                        .arg(req("type", "income|expense|transfer"))
                        .arg(req("amount", "Positive amount"))
                        .arg(req("title", "Short title"))
                        .arg(flag("unverified", "Mark as not yet reconciled")),
                ))
                .subcommand(tx_detail_args(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(opt("account", "Account name"))
                        .arg(opt("type", "income|expense|transfer"))
                        .arg(opt("amount", "Positive amount"))
                        .arg(opt("title", "Short title"))
                        .arg(opt("verified", "true|false").value_parser(value_parser!(bool)))
                        .arg(flag("clear-category", "Remove the category").conflicts_with("category")),
                ))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(json_flags(Command::new("show").arg(id_arg())))
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(opt("account", "Account name"))
                        .arg(opt("type", "income|expense|transfer"))
                        .arg(opt("category", "Category name or path"))
                        .arg(opt("month", "YYYY-MM"))
                        .arg(opt("limit", "Max rows").value_parser(value_parser!(usize))),
                )),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring transaction templates")
                .subcommand(
                    Command::new("add")
                        .arg(req("account", "Account name"))
                        .arg(req("type", "income|expense|transfer"))
                        .arg(req("amount", "Positive amount"))
                        .arg(req("title", "Short title"))
                        .arg(req("frequency", "daily|weekly|biweekly|monthly|quarterly|yearly"))
                        .arg(req("start", "YYYY-MM-DD"))
                        .arg(opt("end", "YYYY-MM-DD"))
                        .arg(opt("next", "First due date, defaults to start"))
                        .arg(opt("category", "Category name or path"))
                        .arg(opt("description", "Free text"))
                        .arg(flag("auto", "Book automatically from `recurring run`")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(flag("all", "Include paused templates")),
                ))
                .subcommand(Command::new("fire").arg(id_arg()))
                .subcommand(
                    Command::new("run").arg(opt("date", "Book templates due on or before, default today")),
                )
                .subcommand(Command::new("pause").arg(id_arg()))
                .subcommand(Command::new("resume").arg(id_arg())),
        )
        .subcommand(
            Command::new("budget")
                .about("Budgets per category and period")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Budget name"))
                        .arg(req("amount", "Limit for one period"))
                        .arg(opt("period", "monthly|weekly|yearly|custom").default_value("monthly"))
                        .arg(opt("category", "Category name or path; omit for all"))
                        .arg(opt("start", "YYYY-MM-DD, default today"))
                        .arg(opt("end", "YYYY-MM-DD")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(flag("all", "Include inactive budgets")),
                ))
                .subcommand(json_flags(
                    Command::new("status").arg(opt("name", "Only this budget")),
                ))
                .subcommand(Command::new("deactivate").arg(req("name", "Budget name")))
                .subcommand(Command::new("activate").arg(req("name", "Budget name"))),
        )
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand(json_flags(
                    Command::new("stats").arg(flag("everyone", "Across all users")),
                ))
                .subcommand(json_flags(Command::new("balances")))
                .subcommand(json_flags(
                    Command::new("accounts")
                        .about("Account counts and balance totals")
                        .arg(flag("everyone", "Across all users")),
                )),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .arg(opt("format", "csv|json").default_value("csv"))
                    .arg(req("out", "Output file")),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Stored settings")
                .subcommand(Command::new("get").arg(Arg::new("key")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check balances against history"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
