// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistent settings (the `settings` table) and the per-run [`Config`].

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::ledger::users::find_user;
use crate::models::{Currency, TransferPolicy, User};

pub const DB_ENV: &str = "LEDGERLY_DB";
pub const USER_ENV: &str = "LEDGERLY_USER";
pub const LOG_ENV: &str = "LEDGERLY_LOG";

pub const KEY_DEFAULT_USER: &str = "default_user";
pub const KEY_DEFAULT_CURRENCY: &str = "default_currency";
pub const KEY_TRANSFER_POLICY: &str = "transfer_policy";

pub const KNOWN_KEYS: &[&str] = &[KEY_DEFAULT_USER, KEY_DEFAULT_CURRENCY, KEY_TRANSFER_POLICY];

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

/// Validates `value` for known keys before storing it.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let value = match key {
        KEY_DEFAULT_CURRENCY => value.parse::<Currency>()?.as_str(),
        KEY_TRANSFER_POLICY => value.parse::<TransferPolicy>()?.as_str(),
        KEY_DEFAULT_USER => {
            let value = value.trim();
            if find_user(conn, value)?.is_none() {
                bail!("User '{}' not found", value);
            }
            value
        }
        _ => bail!("Unknown setting '{}' (known: {})", key, KNOWN_KEYS.join(", ")),
    };
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    tracing::info!(key, value, "setting updated");
    Ok(())
}

/// Settings resolved once at startup and passed to the command handlers.
#[derive(Debug, Clone)]
pub struct Config {
    pub user: Option<String>,
    pub default_currency: Currency,
    pub transfer_policy: TransferPolicy,
}

impl Config {
    /// `user_override` comes from `--user` / `LEDGERLY_USER` and wins over
    /// the stored default.
    pub fn load(conn: &Connection, user_override: Option<String>) -> Result<Self> {
        let user = match user_override {
            Some(u) => Some(u),
            None => get_setting(conn, KEY_DEFAULT_USER)?,
        };
        let default_currency = match get_setting(conn, KEY_DEFAULT_CURRENCY)? {
            Some(s) => s
                .parse::<Currency>()
                .with_context(|| format!("Invalid {} setting", KEY_DEFAULT_CURRENCY))?,
            None => Currency::Usd,
        };
        let transfer_policy = match get_setting(conn, KEY_TRANSFER_POLICY)? {
            Some(s) => s
                .parse::<TransferPolicy>()
                .with_context(|| format!("Invalid {} setting", KEY_TRANSFER_POLICY))?,
            None => TransferPolicy::default(),
        };
        Ok(Config {
            user,
            default_currency,
            transfer_policy,
        })
    }

    /// The acting user; commands that own data need one.
    pub fn require_user(&self, conn: &Connection) -> Result<User> {
        let name = self.user.as_deref().ok_or_else(|| {
            anyhow!(
                "No user selected: pass --user, set {}, or run `config set {} <name>`",
                USER_ENV,
                KEY_DEFAULT_USER
            )
        })?;
        find_user(conn, name)?.ok_or_else(|| anyhow!("User '{}' not found", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_through_config() {
        let conn = crate::db::open_in_memory().unwrap();
        let cfg = Config::load(&conn, None).unwrap();
        assert_eq!(cfg.default_currency, Currency::Usd);
        assert_eq!(cfg.transfer_policy, TransferPolicy::Lenient);

        set_setting(&conn, KEY_TRANSFER_POLICY, "strict").unwrap();
        set_setting(&conn, KEY_DEFAULT_CURRENCY, "eur").unwrap();
        assert!(set_setting(&conn, KEY_DEFAULT_CURRENCY, "BTC").is_err());
        assert!(set_setting(&conn, "colour", "blue").is_err());
        assert!(set_setting(&conn, KEY_DEFAULT_USER, "nobody").is_err());

        let cfg = Config::load(&conn, None).unwrap();
        assert_eq!(cfg.transfer_policy, TransferPolicy::Strict);
        assert_eq!(cfg.default_currency, Currency::Eur);
    }
}
