// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence contract shared by the remote and local backends.

pub mod local;
pub mod remote;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::{Arc, Weak};

use crate::error::StoreResult;
use crate::models::{Account, NewAccount, NewTransaction, Transaction};
use crate::session::Mode;

pub use local::LocalStore;
pub use remote::RemoteStore;

/// Receives the full current snapshot of a user's collection.
pub type Listener<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

/// Both backends implement this. Implementations never retry; every failure
/// is handed back to the caller as-is.
pub trait Store: Send + Sync {
    fn mode(&self) -> Mode;

    fn list_accounts(&self, user_id: &str) -> StoreResult<Vec<Account>>;
    fn list_transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>>;

    fn create_account(&self, account: NewAccount) -> StoreResult<Account>;
    fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction>;

    /// Sets the balance only if the stored value still equals `expected`.
    fn update_account_balance(
        &self,
        account_id: &str,
        expected: Decimal,
        new_balance: Decimal,
    ) -> StoreResult<()>;

    fn delete_transaction(&self, transaction_id: &str) -> StoreResult<()>;

    /// Pushes the current snapshot immediately, then again after every write
    /// that touches `user_id`'s accounts.
    fn subscribe_accounts(
        &self,
        user_id: &str,
        listener: Listener<Account>,
    ) -> StoreResult<Subscription>;

    fn subscribe_transactions(
        &self,
        user_id: &str,
        listener: Listener<Transaction>,
    ) -> StoreResult<Subscription>;
}

/// Live subscription handle. Dropping it stops delivery.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct Entry<T> {
    id: u64,
    user_id: String,
    listener: Listener<T>,
}

/// In-process fan-out of collection snapshots, keyed by user.
pub(crate) struct Hub<T> {
    inner: Mutex<HubInner<T>>,
}

struct HubInner<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T: 'static> Hub<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(HubInner {
                next_id: 0,
                entries: Vec::new(),
            }),
        })
    }

    pub(crate) fn add(self: &Arc<Self>, user_id: &str, listener: Listener<T>) -> Subscription
    where
        T: Send + Sync,
    {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Entry {
                id,
                user_id: user_id.to_string(),
                listener,
            });
            id
        };
        let hub: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(hub) = hub.upgrade() {
                hub.inner.lock().entries.retain(|e| e.id != id);
            }
        })
    }

    pub(crate) fn has_listeners(&self, user_id: &str) -> bool {
        self.inner.lock().entries.iter().any(|e| e.user_id == user_id)
    }

    /// Delivers `snapshot` to every listener scoped to `user_id`. Listeners run
    /// outside the hub lock so they may call back into the store.
    pub(crate) fn publish(&self, user_id: &str, snapshot: &[T]) {
        let targets: Vec<Listener<T>> = self
            .inner
            .lock()
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| Arc::clone(&e.listener))
            .collect();
        for listener in targets {
            listener(snapshot);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

/// Re-reads and publishes a collection if anyone is listening. A failed
/// snapshot is logged rather than propagated: the write itself succeeded.
pub(crate) fn notify<T: 'static>(
    hub: &Hub<T>,
    user_id: &str,
    load: impl FnOnce() -> StoreResult<Vec<T>>,
) {
    if !hub.has_listeners(user_id) {
        return;
    }
    match load() {
        Ok(snapshot) => hub.publish(user_id, &snapshot),
        Err(e) => tracing::error!(user_id, error = %e, "failed to load snapshot for subscribers"),
    }
}
