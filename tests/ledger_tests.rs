// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketledger::error::{LedgerError, PersistenceError, StoreResult, ValidationError};
use pocketledger::ledger::{DeleteIntent, Intent, Ledger};
use pocketledger::models::{Account, NewAccount, NewTransaction, Transaction};
use pocketledger::session::{Mode, Session};
use pocketledger::store::local::LOCAL_USER_ID;
use pocketledger::store::{Listener, LocalStore, RemoteStore, Store, Subscription};
use pocketledger::validate::{AccountDraft, AmountPolicy, TransactionDraft};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn local() -> (TempDir, Arc<LocalStore>, Session) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open(dir.path()).unwrap());
    let session = Session {
        user_id: LOCAL_USER_ID.into(),
        email: "demo@example.com".into(),
        mode: Mode::Local,
    };
    (dir, store, session)
}

fn remote() -> (Arc<RemoteStore>, Session) {
    let conn = Connection::open_in_memory().unwrap();
    pocketledger::db::init_schema(&conn).unwrap();
    let session = Session {
        user_id: "alice".into(),
        email: "alice@example.com".into(),
        mode: Mode::Remote,
    };
    (Arc::new(RemoteStore::from_connection(conn)), session)
}

fn open_account(store: &dyn Store, user: &str, balance: Decimal) -> Account {
    store
        .create_account(NewAccount {
            name: "Checking".into(),
            bank_name: "CTBC".into(),
            balance,
            color: "#3B82F6".into(),
            user_id: user.into(),
        })
        .unwrap()
}

fn draft(account_id: &str, kind: &str, amount: &str) -> TransactionDraft {
    TransactionDraft {
        account_id: account_id.into(),
        kind: kind.into(),
        amount: amount.into(),
        category: "飲食".into(),
        date: "2024-03-20".into(),
        note: None,
    }
}

fn balance_of(store: &dyn Store, user: &str, account_id: &str) -> Decimal {
    store
        .list_accounts(user)
        .unwrap()
        .into_iter()
        .find(|a| a.id == account_id)
        .unwrap()
        .balance
}

/// Delegates to another store, failing selected writes on demand.
struct Faulty {
    inner: Arc<dyn Store>,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    fail_balance: AtomicBool,
}

impl Faulty {
    fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_balance: AtomicBool::new(false),
        }
    }
}

fn injected() -> PersistenceError {
    PersistenceError::Unavailable("injected failure".into())
}

impl Store for Faulty {
    fn mode(&self) -> Mode {
        self.inner.mode()
    }
    fn list_accounts(&self, user_id: &str) -> StoreResult<Vec<Account>> {
        self.inner.list_accounts(user_id)
    }
    fn list_transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>> {
        self.inner.list_transactions(user_id)
    }
    fn create_account(&self, account: NewAccount) -> StoreResult<Account> {
        self.inner.create_account(account)
    }
    fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.create_transaction(transaction)
    }
    fn update_account_balance(
        &self,
        account_id: &str,
        expected: Decimal,
        new_balance: Decimal,
    ) -> StoreResult<()> {
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner
            .update_account_balance(account_id, expected, new_balance)
    }
    fn delete_transaction(&self, transaction_id: &str) -> StoreResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.delete_transaction(transaction_id)
    }
    fn subscribe_accounts(
        &self,
        user_id: &str,
        listener: Listener<Account>,
    ) -> StoreResult<Subscription> {
        self.inner.subscribe_accounts(user_id, listener)
    }
    fn subscribe_transactions(
        &self,
        user_id: &str,
        listener: Listener<Transaction>,
    ) -> StoreResult<Subscription> {
        self.inner.subscribe_transactions(user_id, listener)
    }
}

#[test]
fn expense_then_delete_restores_seed_balance() {
    let (_dir, store, session) = local();
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);

    let accounts = store.list_accounts(LOCAL_USER_ID).unwrap();
    let out = ledger
        .create_transaction(&draft("a1", "EXPENSE", "3000"), &accounts)
        .unwrap();
    assert!(out.is_consistent());
    assert_eq!(out.balance, Some(Decimal::new(47000, 0)));
    assert_eq!(balance_of(&*store, LOCAL_USER_ID, "a1"), Decimal::new(47000, 0));

    let accounts = store.list_accounts(LOCAL_USER_ID).unwrap();
    let del = ledger
        .delete_transaction(&DeleteIntent::from(&out.record), &accounts)
        .unwrap();
    assert!(del.is_consistent());
    assert_eq!(balance_of(&*store, LOCAL_USER_ID, "a1"), Decimal::new(50000, 0));
    assert!(
        !store
            .list_transactions(LOCAL_USER_ID)
            .unwrap()
            .iter()
            .any(|t| t.id == out.record.id)
    );
}

#[test]
fn income_is_added_to_balance() {
    let (_dir, store, session) = local();
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);
    let accounts = store.list_accounts(LOCAL_USER_ID).unwrap();
    let out = ledger
        .create_transaction(&draft("a2", "INCOME", "45000"), &accounts)
        .unwrap();
    assert_eq!(out.balance, Some(Decimal::new(57000, 0)));
    assert_eq!(balance_of(&*store, LOCAL_USER_ID, "a2"), Decimal::new(57000, 0));
}

#[test]
fn balance_is_order_independent_sum_of_deltas() {
    let intents = [
        ("INCOME", "120.50"),
        ("EXPENSE", "30"),
        ("EXPENSE", "0.25"),
        ("INCOME", "1000"),
        ("EXPENSE", "999.99"),
    ];
    let start = Decimal::new(100000, 2);
    let expected = start + Decimal::new(12050, 2) - Decimal::new(30, 0) - Decimal::new(25, 2)
        + Decimal::new(1000, 0)
        - Decimal::new(99999, 2);

    let orders: [Vec<usize>; 3] = [vec![0, 1, 2, 3, 4], vec![4, 3, 2, 1, 0], vec![2, 4, 0, 3, 1]];
    for order in orders {
        let (store, session) = remote();
        let acct = open_account(&*store, "alice", start);
        let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);
        for i in order {
            let (kind, amount) = intents[i];
            let known = store.list_accounts("alice").unwrap();
            let out = ledger
                .create_transaction(&draft(&acct.id, kind, amount), &known)
                .unwrap();
            assert!(out.is_consistent());
        }
        assert_eq!(balance_of(&*store, "alice", &acct.id), expected);
        assert_eq!(store.list_transactions("alice").unwrap().len(), intents.len());
    }
}

#[test]
fn create_then_delete_is_identity_for_both_kinds() {
    for kind in ["INCOME", "EXPENSE"] {
        let (store, session) = remote();
        let start = Decimal::new(-1234, 1);
        let acct = open_account(&*store, "alice", start);
        let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);

        let known = store.list_accounts("alice").unwrap();
        let out = ledger
            .create_transaction(&draft(&acct.id, kind, "77.70"), &known)
            .unwrap();
        assert_ne!(balance_of(&*store, "alice", &acct.id), start);

        ledger
            .delete_transaction(
                &DeleteIntent::from(&out.record),
                &store.list_accounts("alice").unwrap(),
            )
            .unwrap();
        assert_eq!(balance_of(&*store, "alice", &acct.id), start);
    }
}

#[test]
fn rejected_amounts_leave_store_untouched() {
    let (_dir, store, session) = local();
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);
    let before_accounts = store.list_accounts(LOCAL_USER_ID).unwrap();
    let before_txs = store.list_transactions(LOCAL_USER_ID).unwrap();

    for amount in ["-1", "abc", "NaN"] {
        let err = ledger
            .create_transaction(&draft("a1", "EXPENSE", amount), &before_accounts)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)), "{amount}: {err}");
    }
    assert_eq!(store.list_accounts(LOCAL_USER_ID).unwrap(), before_accounts);
    assert_eq!(store.list_transactions(LOCAL_USER_ID).unwrap(), before_txs);
}

#[test]
fn coerce_policy_records_zero_amount() {
    let (_dir, store, session) = local();
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::CoerceZero);
    let accounts = store.list_accounts(LOCAL_USER_ID).unwrap();
    let out = ledger
        .create_transaction(&draft("a1", "EXPENSE", "abc"), &accounts)
        .unwrap();
    assert!(out.record.amount.is_zero());
    assert_eq!(balance_of(&*store, LOCAL_USER_ID, "a1"), Decimal::new(50000, 0));
    assert_eq!(store.list_transactions(LOCAL_USER_ID).unwrap().len(), 3);
}

#[test]
fn unknown_or_foreign_account_is_rejected() {
    let (store, session) = remote();
    let bobs = open_account(&*store, "bob", Decimal::new(10, 0));
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);

    // Bob's account handed in as if it were known to Alice.
    let err = ledger
        .create_transaction(&draft(&bobs.id, "INCOME", "5"), std::slice::from_ref(&bobs))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::UnknownAccount(_))
    ));
    assert!(store.list_transactions("alice").unwrap().is_empty());
    assert!(store.list_transactions("bob").unwrap().is_empty());
    assert_eq!(balance_of(&*store, "bob", &bobs.id), Decimal::new(10, 0));
}

#[test]
fn delete_of_another_users_transaction_is_rejected() {
    let (store, session) = remote();
    let bobs_acct = open_account(&*store, "bob", Decimal::new(100, 0));
    let bob = Session {
        user_id: "bob".into(),
        email: "bob@example.com".into(),
        mode: Mode::Remote,
    };
    let bobs_tx = Ledger::new(store.clone(), &bob, AmountPolicy::Reject)
        .create_transaction(
            &draft(&bobs_acct.id, "EXPENSE", "40"),
            &store.list_accounts("bob").unwrap(),
        )
        .unwrap()
        .record;

    let alices_acct = open_account(&*store, "alice", Decimal::new(10, 0));
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);
    let intent = DeleteIntent {
        account_id: alices_acct.id.clone(),
        ..DeleteIntent::from(&bobs_tx)
    };
    let err = ledger
        .delete_transaction(&intent, &store.list_accounts("alice").unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::UnknownTransaction(_))
    ));
    assert_eq!(store.list_transactions("bob").unwrap().len(), 1);
    assert_eq!(balance_of(&*store, "alice", &alices_acct.id), Decimal::new(10, 0));
    assert_eq!(balance_of(&*store, "bob", &bobs_acct.id), Decimal::new(60, 0));
}

#[test]
fn delete_intent_must_match_stored_transaction() {
    let (_dir, store, session) = local();
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);
    let t2 = store
        .list_transactions(LOCAL_USER_ID)
        .unwrap()
        .into_iter()
        .find(|t| t.id == "t2")
        .unwrap();
    let inflated = DeleteIntent {
        amount: Decimal::new(1_000_000, 0),
        ..DeleteIntent::from(&t2)
    };
    let err = ledger
        .delete_transaction(&inflated, &store.list_accounts(LOCAL_USER_ID).unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::UnknownTransaction(_))
    ));
    assert_eq!(store.list_transactions(LOCAL_USER_ID).unwrap().len(), 2);
    assert_eq!(balance_of(&*store, LOCAL_USER_ID, "a1"), Decimal::new(50000, 0));
}

#[test]
fn balance_overflow_is_rejected_before_any_write() {
    let (_dir, store, session) = local();
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);
    let accounts = store.list_accounts(LOCAL_USER_ID).unwrap();

    let err = ledger
        .create_transaction(
            &draft("a1", "INCOME", "79228162514264337593543950335"),
            &accounts,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::AmountOutOfRange(_))
    ));
    assert_eq!(store.list_transactions(LOCAL_USER_ID).unwrap().len(), 2);
    assert_eq!(balance_of(&*store, LOCAL_USER_ID, "a1"), Decimal::new(50000, 0));

    // The largest amount that still fits goes through.
    let room = Decimal::MAX - Decimal::new(50000, 0);
    let out = ledger
        .create_transaction(&draft("a1", "INCOME", &room.to_string()), &accounts)
        .unwrap();
    assert_eq!(out.balance, Some(Decimal::MAX));
}

#[test]
fn balance_write_failure_leaves_consistency_gap() {
    let (_dir, local_store, session) = local();
    let store = Arc::new(Faulty::new(local_store.clone()));
    store.fail_balance.store(true, Ordering::SeqCst);
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);

    let accounts = store.list_accounts(LOCAL_USER_ID).unwrap();
    let out = ledger
        .create_transaction(&draft("a1", "EXPENSE", "3000"), &accounts)
        .unwrap();

    let gap = out.gap.clone().expect("gap expected");
    assert_eq!(gap.intent, Intent::CreateTransaction);
    assert_eq!(gap.account_id, "a1");
    assert_eq!(gap.transaction_id, out.record.id);
    assert_eq!(gap.delta, Decimal::new(-3000, 0));
    assert_eq!(gap.intended_balance, Decimal::new(47000, 0));
    assert!(out.balance.is_none());

    // Transaction persisted, balance untouched.
    assert!(
        local_store
            .list_transactions(LOCAL_USER_ID)
            .unwrap()
            .iter()
            .any(|t| t.id == out.record.id)
    );
    assert_eq!(balance_of(&*local_store, LOCAL_USER_ID, "a1"), Decimal::new(50000, 0));
}

#[test]
fn transaction_write_failure_skips_balance_write() {
    let (store, session) = remote();
    let acct = open_account(&*store, "alice", Decimal::new(500, 0));
    let faulty = Arc::new(Faulty::new(store.clone()));
    faulty.fail_create.store(true, Ordering::SeqCst);
    let ledger = Ledger::new(faulty.clone(), &session, AmountPolicy::Reject);

    let known = store.list_accounts("alice").unwrap();
    let err = ledger
        .create_transaction(&draft(&acct.id, "INCOME", "5"), &known)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Persistence(PersistenceError::Unavailable(_))
    ));
    assert_eq!(balance_of(&*store, "alice", &acct.id), Decimal::new(500, 0));
    assert!(store.list_transactions("alice").unwrap().is_empty());
}

#[test]
fn delete_failure_skips_balance_write() {
    let (_dir, local_store, session) = local();
    let store = Arc::new(Faulty::new(local_store.clone()));
    store.fail_delete.store(true, Ordering::SeqCst);
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);

    let t1 = local_store
        .list_transactions(LOCAL_USER_ID)
        .unwrap()
        .into_iter()
        .find(|t| t.id == "t1")
        .unwrap();
    let accounts = local_store.list_accounts(LOCAL_USER_ID).unwrap();
    assert!(ledger.delete_transaction(&DeleteIntent::from(&t1), &accounts).is_err());
    assert_eq!(balance_of(&*local_store, LOCAL_USER_ID, "a1"), Decimal::new(50000, 0));
    assert_eq!(local_store.list_transactions(LOCAL_USER_ID).unwrap().len(), 2);
}

#[test]
fn stale_known_balance_is_a_conflict_not_an_overwrite() {
    let (store, session) = remote();
    let acct = open_account(&*store, "alice", Decimal::new(100, 0));
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);

    // Two callers read the same balance, then both write.
    let stale = store.list_accounts("alice").unwrap();
    let first = ledger
        .create_transaction(&draft(&acct.id, "EXPENSE", "10"), &stale)
        .unwrap();
    assert!(first.is_consistent());

    let second = ledger
        .create_transaction(&draft(&acct.id, "EXPENSE", "20"), &stale)
        .unwrap();
    let gap = second.gap.expect("second writer must not overwrite");
    assert!(gap.reason.contains("changed concurrently"), "{}", gap.reason);
    assert_eq!(balance_of(&*store, "alice", &acct.id), Decimal::new(90, 0));
    assert_eq!(store.list_transactions("alice").unwrap().len(), 2);
}

#[test]
fn create_account_takes_opening_balance_and_cycles_palette() {
    let (_dir, store, session) = local();
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);
    let known = store.list_accounts(LOCAL_USER_ID).unwrap();

    let acct = ledger
        .create_account(
            &AccountDraft {
                name: "Credit card".into(),
                bank_name: "Esun".into(),
                balance: "-2500".into(),
            },
            &known,
        )
        .unwrap();
    assert_eq!(acct.balance, Decimal::new(-2500, 0));
    assert_eq!(acct.color, "#F59E0B");
    assert_eq!(acct.user_id, LOCAL_USER_ID);
    assert!(acct.id.starts_with("a-"));

    let all = store.list_accounts(LOCAL_USER_ID).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].id, acct.id);
}

#[test]
fn delete_with_unknown_account_writes_nothing() {
    let (_dir, store, session) = local();
    let ledger = Ledger::new(store.clone(), &session, AmountPolicy::Reject);
    let mut t1 = store
        .list_transactions(LOCAL_USER_ID)
        .unwrap()
        .into_iter()
        .find(|t| t.id == "t1")
        .unwrap();
    t1.account_id = "missing".into();
    let err = ledger
        .delete_transaction(&DeleteIntent::from(&t1), &store.list_accounts(LOCAL_USER_ID).unwrap())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(store.list_transactions(LOCAL_USER_ID).unwrap().len(), 2);
}
