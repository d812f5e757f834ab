// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Shared multi-user document store on top of SQLite.
//!
//! Every write is its own statement. Subscribers get a fresh scoped snapshot
//! after each write that touches their user.

use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::{notify, Hub, Listener, Store, Subscription};
use crate::db;
use crate::error::{PersistenceError, StoreResult};
use crate::models::{Account, NewAccount, NewTransaction, Transaction, TransactionKind};
use crate::session::Mode;

pub struct RemoteStore {
    conn: Mutex<Connection>,
    accounts: Arc<Hub<Account>>,
    transactions: Arc<Hub<Transaction>>,
}

fn decimal_at(r: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn account_from_row(r: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        bank_name: r.get(3)?,
        balance: decimal_at(r, 4)?,
        color: r.get(5)?,
    })
}

fn transaction_from_row(r: &Row) -> rusqlite::Result<Transaction> {
    let kind: String = r.get(4)?;
    let kind = kind
        .parse::<TransactionKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(Transaction {
        id: r.get(0)?,
        user_id: r.get(1)?,
        account_id: r.get(2)?,
        amount: decimal_at(r, 3)?,
        kind,
        category: r.get(5)?,
        date: r.get(6)?,
        note: r.get(7)?,
        created_at: r.get(8)?,
    })
}

impl RemoteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = db::open_shared(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already-initialised connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            accounts: Hub::new(),
            transactions: Hub::new(),
        }
    }

    fn owner_of(&self, table: &'static str, id: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT user_id FROM {table} WHERE id=?1");
        Ok(conn
            .query_row(&sql, params![id], |r| r.get::<_, String>(0))
            .optional()?)
    }

    fn notify_accounts(&self, user_id: &str) {
        notify(&self.accounts, user_id, || self.list_accounts(user_id));
    }

    fn notify_transactions(&self, user_id: &str) {
        notify(&self.transactions, user_id, || self.list_transactions(user_id));
    }
}

impl Store for RemoteStore {
    fn mode(&self) -> Mode {
        Mode::Remote
    }

    fn list_accounts(&self, user_id: &str) -> StoreResult<Vec<Account>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, bank_name, balance, color
             FROM accounts WHERE user_id=?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![user_id], account_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn list_transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, account_id, amount, type, category, date, note, created_at
             FROM transactions WHERE user_id=?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![user_id], transaction_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn create_account(&self, account: NewAccount) -> StoreResult<Account> {
        let account = account.with_id(Uuid::new_v4().to_string());
        self.conn.lock().execute(
            "INSERT INTO accounts(id, user_id, name, bank_name, balance, color)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account.id,
                account.user_id,
                account.name,
                account.bank_name,
                account.balance.to_string(),
                account.color
            ],
        )?;
        tracing::debug!(id = %account.id, user_id = %account.user_id, "remote: account created");
        self.notify_accounts(&account.user_id);
        Ok(account)
    }

    fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let tx = transaction.with_id(Uuid::new_v4().to_string());
        self.conn.lock().execute(
            "INSERT INTO transactions(
                id, user_id, account_id, amount, type, category, date, note, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                tx.id,
                tx.user_id,
                tx.account_id,
                tx.amount.to_string(),
                tx.kind.as_str(),
                tx.category,
                tx.date,
                tx.note,
                tx.created_at
            ],
        )?;
        tracing::debug!(id = %tx.id, account_id = %tx.account_id, "remote: transaction created");
        self.notify_transactions(&tx.user_id);
        Ok(tx)
    }

    fn update_account_balance(
        &self,
        account_id: &str,
        expected: Decimal,
        new_balance: Decimal,
    ) -> StoreResult<()> {
        let user_id = {
            let mut conn = self.conn.lock();
            // IMMEDIATE takes the write lock up front so the compare and the
            // swap see the same row even with other processes on the file.
            let txn = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let row = txn
                .query_row(
                    "SELECT user_id, balance FROM accounts WHERE id=?1",
                    params![account_id],
                    |r| Ok((r.get::<_, String>(0)?, decimal_at(r, 1)?)),
                )
                .optional()?;
            let (user_id, found) = row.ok_or_else(|| PersistenceError::NotFound {
                collection: "accounts",
                id: account_id.to_string(),
            })?;
            if found != expected {
                return Err(PersistenceError::Conflict {
                    account_id: account_id.to_string(),
                    expected,
                    found,
                });
            }
            txn.execute(
                "UPDATE accounts SET balance=?1 WHERE id=?2",
                params![new_balance.to_string(), account_id],
            )?;
            txn.commit()?;
            user_id
        };
        tracing::debug!(account_id, %expected, %new_balance, "remote: balance updated");
        self.notify_accounts(&user_id);
        Ok(())
    }

    fn delete_transaction(&self, transaction_id: &str) -> StoreResult<()> {
        let user_id = self
            .owner_of("transactions", transaction_id)?
            .ok_or_else(|| PersistenceError::NotFound {
                collection: "transactions",
                id: transaction_id.to_string(),
            })?;
        let n = self
            .conn
            .lock()
            .execute("DELETE FROM transactions WHERE id=?1", params![transaction_id])?;
        if n == 0 {
            return Err(PersistenceError::NotFound {
                collection: "transactions",
                id: transaction_id.to_string(),
            });
        }
        tracing::debug!(id = transaction_id, "remote: transaction deleted");
        self.notify_transactions(&user_id);
        Ok(())
    }

    fn subscribe_accounts(
        &self,
        user_id: &str,
        listener: Listener<Account>,
    ) -> StoreResult<Subscription> {
        let snapshot = self.list_accounts(user_id)?;
        listener(&snapshot);
        Ok(self.accounts.add(user_id, listener))
    }

    fn subscribe_transactions(
        &self,
        user_id: &str,
        listener: Listener<Transaction>,
    ) -> StoreResult<Subscription> {
        let snapshot = self.list_transactions(user_id)?;
        listener(&snapshot);
        Ok(self.transactions.add(user_id, listener))
    }
}
