// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Single-user store kept as named JSON records in a local directory.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::{notify, Hub, Listener, Store, Subscription};
use crate::error::{PersistenceError, StoreResult};
use crate::models::{Account, NewAccount, NewTransaction, Transaction, TransactionKind};
use crate::session::Mode;

pub const ACCOUNTS_KEY: &str = "demo_accounts";
pub const TRANSACTIONS_KEY: &str = "demo_transactions";
pub const USER_KEY: &str = "demo_user";

/// Owner of the seeded records and of every local-mode session.
pub const LOCAL_USER_ID: &str = "demo-uid";

pub struct LocalStore {
    dir: PathBuf,
    // Serialises read-modify-write cycles on the record files.
    lock: Mutex<()>,
    accounts: Arc<Hub<Account>>,
    transactions: Arc<Hub<Transaction>>,
}

pub fn seed_accounts() -> Vec<Account> {
    vec![
        Account {
            id: "a1".into(),
            name: "中國信託".into(),
            bank_name: "CTBC".into(),
            balance: Decimal::new(50000, 0),
            color: "#3B82F6".into(),
            user_id: LOCAL_USER_ID.into(),
        },
        Account {
            id: "a2".into(),
            name: "台新銀行".into(),
            bank_name: "Taishin".into(),
            balance: Decimal::new(12000, 0),
            color: "#EF4444".into(),
            user_id: LOCAL_USER_ID.into(),
        },
    ]
}

pub fn seed_transactions() -> Vec<Transaction> {
    let seeded = |id: &str, amount: i64, kind, category: &str, day: (i32, u32, u32), note: &str| {
        let created_at = Utc
            .with_ymd_and_hms(day.0, day.1, day.2, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Transaction {
            id: id.into(),
            account_id: "a1".into(),
            amount: Decimal::new(amount, 0),
            kind,
            category: category.into(),
            date: created_at.date_naive(),
            note: Some(note.into()),
            user_id: LOCAL_USER_ID.into(),
            created_at,
        }
    };
    vec![
        seeded("t1", 3000, TransactionKind::Expense, "飲食", (2024, 3, 20), "晚餐"),
        seeded("t2", 45000, TransactionKind::Income, "薪資", (2024, 3, 5), "月薪"),
    ]
}

impl LocalStore {
    /// Opens the record directory and seeds any missing ledger record.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let store = Self {
            dir,
            lock: Mutex::new(()),
            accounts: Hub::new(),
            transactions: Hub::new(),
        };
        store.seed()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the default data set into whichever ledger record is absent.
    /// Present records are left alone, so repeated calls never duplicate.
    pub fn seed(&self) -> StoreResult<bool> {
        let _guard = self.lock.lock();
        let mut seeded = false;
        if !self.record_path(ACCOUNTS_KEY).exists() {
            self.put_record(ACCOUNTS_KEY, &seed_accounts())?;
            seeded = true;
        }
        if !self.record_path(TRANSACTIONS_KEY).exists() {
            self.put_record(TRANSACTIONS_KEY, &seed_transactions())?;
            seeded = true;
        }
        if seeded {
            tracing::info!(dir = %self.dir.display(), "local: seeded default ledger data");
        }
        Ok(seeded)
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn get_record<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let path = self.record_path(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| PersistenceError::Corrupt(format!("{key}: {e}")))
    }

    /// Replaces a record. Written to a sibling file first, then renamed over
    /// the old one.
    pub fn put_record<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let path = self.record_path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn remove_record(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_accounts(&self) -> StoreResult<Vec<Account>> {
        Ok(self.get_record(ACCOUNTS_KEY)?.unwrap_or_default())
    }

    fn load_transactions(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.get_record(TRANSACTIONS_KEY)?.unwrap_or_default())
    }
}

impl Store for LocalStore {
    fn mode(&self) -> Mode {
        Mode::Local
    }

    fn list_accounts(&self, user_id: &str) -> StoreResult<Vec<Account>> {
        let _guard = self.lock.lock();
        let mut all = self.load_accounts()?;
        all.retain(|a| a.user_id == user_id);
        Ok(all)
    }

    fn list_transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>> {
        let _guard = self.lock.lock();
        let mut all = self.load_transactions()?;
        all.retain(|t| t.user_id == user_id);
        Ok(all)
    }

    fn create_account(&self, account: NewAccount) -> StoreResult<Account> {
        let account = account.with_id(format!("a-{}", Uuid::new_v4().simple()));
        {
            let _guard = self.lock.lock();
            let mut all = self.load_accounts()?;
            all.push(account.clone());
            self.put_record(ACCOUNTS_KEY, &all)?;
        }
        tracing::debug!(id = %account.id, "local: account created");
        self.notify_accounts(&account.user_id);
        Ok(account)
    }

    fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let tx = transaction.with_id(format!("t-{}", Uuid::new_v4().simple()));
        {
            let _guard = self.lock.lock();
            let mut all = self.load_transactions()?;
            all.push(tx.clone());
            self.put_record(TRANSACTIONS_KEY, &all)?;
        }
        tracing::debug!(id = %tx.id, account_id = %tx.account_id, "local: transaction created");
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
            let _guard = self.lock.lock();
            let mut all = self.load_accounts()?;
            let account = all.iter_mut().find(|a| a.id == account_id).ok_or_else(|| {
                PersistenceError::NotFound {
                    collection: "accounts",
                    id: account_id.to_string(),
                }
            })?;
            if account.balance != expected {
                return Err(PersistenceError::Conflict {
                    account_id: account_id.to_string(),
                    expected,
                    found: account.balance,
                });
            }
            account.balance = new_balance;
            let user_id = account.user_id.clone();
            self.put_record(ACCOUNTS_KEY, &all)?;
            user_id
        };
        tracing::debug!(account_id, %expected, %new_balance, "local: balance updated");
        self.notify_accounts(&user_id);
        Ok(())
    }

    fn delete_transaction(&self, transaction_id: &str) -> StoreResult<()> {
        let user_id = {
            let _guard = self.lock.lock();
            let mut all = self.load_transactions()?;
            let pos = all
                .iter()
                .position(|t| t.id == transaction_id)
                .ok_or_else(|| PersistenceError::NotFound {
                    collection: "transactions",
                    id: transaction_id.to_string(),
                })?;
            let removed = all.remove(pos);
            self.put_record(TRANSACTIONS_KEY, &all)?;
            removed.user_id
        };
        tracing::debug!(id = transaction_id, "local: transaction deleted");
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

impl LocalStore {
    fn notify_accounts(&self, user_id: &str) {
        notify(&self.accounts, user_id, || self.list_accounts(user_id));
    }

    fn notify_transactions(&self, user_id: &str) {
        notify(&self.transactions, user_id, || self.list_transactions(user_id));
    }
}
