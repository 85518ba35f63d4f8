// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error type shared by the bookkeeping core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A referenced account, category, budget, template or transaction id
    /// does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The request was rejected before anything was persisted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The stored ledger does not agree with itself, e.g. a balance update
    /// hit a missing account row after the transaction row was written.
    ///
    /// The unit of work that raised it is rolled back.
    #[error("ledger inconsistency: {0}")]
    Inconsistency(String),

    /// A stored value could not be decoded.
    #[error("corrupt value '{value}' in column {column}")]
    Corrupt { column: &'static str, value: String },

    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
