// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Live per-user view of accounts and transactions.
//!
//! Each store push replaces the whole collection; there is no incremental
//! patching. Both backends publish the same way, so this code does not care
//! which one it is attached to.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::error::StoreResult;
use crate::models::{Account, Transaction};
use crate::session::Session;
use crate::store::{Store, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Accounts,
    Transactions,
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionState {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    /// Bumped on every replace.
    pub version: u64,
}

pub type Observer = Arc<dyn Fn(Change, &ProjectionState) + Send + Sync>;

#[derive(Default)]
struct Shared {
    state: RwLock<ProjectionState>,
    observers: Mutex<Vec<Observer>>,
}

impl Shared {
    fn replace(&self, change: Change, update: impl FnOnce(&mut ProjectionState)) {
        let snapshot = {
            let mut state = self.state.write();
            update(&mut state);
            state.version += 1;
            state.clone()
        };
        let observers: Vec<Observer> = self.observers.lock().iter().cloned().collect();
        for observer in observers {
            observer(change, &snapshot);
        }
    }
}

pub struct Projection {
    shared: Arc<Shared>,
    store: Arc<dyn Store>,
    session: Session,
    subscriptions: Vec<Subscription>,
}

impl Projection {
    /// Subscribes to both collections for `session`'s user. The stores push
    /// an initial snapshot, so the projection is populated on return.
    pub fn attach(store: Arc<dyn Store>, session: Session) -> StoreResult<Self> {
        let mut projection = Self {
            shared: Arc::new(Shared::default()),
            store,
            session,
            subscriptions: Vec::new(),
        };
        projection.subscribe()?;
        Ok(projection)
    }

    fn subscribe(&mut self) -> StoreResult<()> {
        let user_id = self.session.user_id.clone();

        let shared = Arc::clone(&self.shared);
        let accounts = self.store.subscribe_accounts(
            &user_id,
            Arc::new(move |snapshot: &[Account]| {
                shared.replace(Change::Accounts, |s| s.accounts = snapshot.to_vec());
            }),
        )?;

        let shared = Arc::clone(&self.shared);
        let transactions = self.store.subscribe_transactions(
            &user_id,
            Arc::new(move |snapshot: &[Transaction]| {
                shared.replace(Change::Transactions, |s| {
                    s.transactions = snapshot.to_vec()
                });
            }),
        )?;

        self.subscriptions = vec![accounts, transactions];
        tracing::debug!(user_id = %user_id, mode = %self.store.mode(), "projection attached");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn on_change(&self, observer: impl Fn(Change, &ProjectionState) + Send + Sync + 'static) {
        self.shared.observers.lock().push(Arc::new(observer));
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.shared.state.read().accounts.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.shared.state.read().transactions.clone()
    }

    pub fn snapshot(&self) -> ProjectionState {
        self.shared.state.read().clone()
    }

    /// Forces a full re-read of both collections.
    pub fn reload(&self) -> StoreResult<()> {
        let user_id = &self.session.user_id;
        let accounts = self.store.list_accounts(user_id)?;
        let transactions = self.store.list_transactions(user_id)?;
        self.shared.replace(Change::Reset, |s| {
            s.accounts = accounts;
            s.transactions = transactions;
        });
        Ok(())
    }

    /// Tears down the current subscriptions, clears the view and attaches to
    /// `store` as `session`. Used when the identity or mode changes.
    pub fn rebind(&mut self, store: Arc<dyn Store>, session: Session) -> StoreResult<()> {
        self.detach();
        self.shared.replace(Change::Reset, |s| {
            s.accounts.clear();
            s.transactions.clear();
        });
        self.store = store;
        self.session = session;
        self.subscribe()
    }

    pub fn detach(&mut self) {
        for sub in self.subscriptions.drain(..) {
            sub.unsubscribe();
        }
    }
}

impl Drop for Projection {
    fn drop(&mut self) {
        self.detach();
    }
}
