// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Bad input, rejected before any write is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid amount '{0}', expected a non-negative number")]
    InvalidAmount(String),

    #[error("Amount {0} must not be negative")]
    NegativeAmount(Decimal),

    #[error("Invalid balance '{0}'")]
    InvalidBalance(String),

    #[error("Unknown transaction type '{0}', expected INCOME or EXPENSE")]
    InvalidKind(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Account '{0}' not found")]
    UnknownAccount(String),

    #[error("Transaction '{0}' not found")]
    UnknownTransaction(String),

    #[error("Amount {0} would overflow the account balance")]
    AmountOutOfRange(Decimal),

    #[error("Field '{0}' must not be empty")]
    Empty(&'static str),
}

/// Backend failure, carrying the backend's own reason.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{collection} document '{id}' not found")]
    NotFound { collection: &'static str, id: String },

    #[error(
        "Balance of account '{account_id}' changed concurrently \
         (expected {expected}, found {found})"
    )]
    Conflict {
        account_id: String,
        expected: Decimal,
        found: Decimal,
    },

    #[error("Corrupt record '{0}'")]
    Corrupt(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type StoreResult<T> = std::result::Result<T, PersistenceError>;
pub type Result<T> = std::result::Result<T, LedgerError>;
