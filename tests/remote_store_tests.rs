// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use parking_lot::Mutex;
use pocketledger::error::PersistenceError;
use pocketledger::models::{Account, NewAccount, NewTransaction, Transaction, TransactionKind};
use pocketledger::store::{RemoteStore, Store};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::Arc;

fn setup() -> RemoteStore {
    let conn = Connection::open_in_memory().unwrap();
    pocketledger::db::init_schema(&conn).unwrap();
    RemoteStore::from_connection(conn)
}

fn new_account(user: &str, name: &str, balance: i64) -> NewAccount {
    NewAccount {
        name: name.into(),
        bank_name: "Bank".into(),
        balance: Decimal::new(balance, 0),
        color: "#10B981".into(),
        user_id: user.into(),
    }
}

fn new_tx(user: &str, account_id: &str, amount: i64) -> NewTransaction {
    NewTransaction {
        account_id: account_id.into(),
        amount: Decimal::new(amount, 0),
        kind: TransactionKind::Income,
        category: "薪資".into(),
        date: "2024-03-05".parse().unwrap(),
        note: Some("monthly".into()),
        user_id: user.into(),
        created_at: Utc::now(),
    }
}

#[test]
fn reads_are_scoped_per_user() {
    let store = setup();
    store.create_account(new_account("alice", "A", 1)).unwrap();
    store.create_account(new_account("bob", "B", 2)).unwrap();
    store.create_account(new_account("alice", "C", 3)).unwrap();

    let names: Vec<String> = store
        .list_accounts("alice")
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["A", "C"]);
    assert_eq!(store.list_accounts("bob").unwrap().len(), 1);
}

#[test]
fn transaction_round_trips_every_field() {
    let store = setup();
    let acct = store.create_account(new_account("alice", "A", 0)).unwrap();
    let created = store.create_transaction(new_tx("alice", &acct.id, 45000)).unwrap();
    let listed = store.list_transactions("alice").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].amount, created.amount);
    assert_eq!(listed[0].kind, TransactionKind::Income);
    assert_eq!(listed[0].date, created.date);
    assert_eq!(listed[0].note.as_deref(), Some("monthly"));
    assert_eq!(
        listed[0].created_at.timestamp_millis(),
        created.created_at.timestamp_millis()
    );
}

#[test]
fn subscribers_get_initial_and_pushed_snapshots() {
    let store = setup();
    let seen: Arc<Mutex<Vec<Vec<Account>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = store
        .subscribe_accounts(
            "alice",
            Arc::new(move |snap: &[Account]| sink.lock().push(snap.to_vec())),
        )
        .unwrap();

    let acct = store.create_account(new_account("alice", "A", 100)).unwrap();
    store.create_account(new_account("bob", "B", 5)).unwrap();
    store
        .update_account_balance(&acct.id, Decimal::new(100, 0), Decimal::new(80, 0))
        .unwrap();

    {
        let seen = seen.lock();
        assert_eq!(seen.len(), 3, "initial + create + balance; bob's write is out of scope");
        assert!(seen[0].is_empty());
        assert_eq!(seen[1].len(), 1);
        assert_eq!(seen[2][0].balance, Decimal::new(80, 0));
    }

    sub.unsubscribe();
    store.create_account(new_account("alice", "Z", 0)).unwrap();
    assert_eq!(seen.lock().len(), 3);
}

#[test]
fn transaction_subscription_sees_delete() {
    let store = setup();
    let acct = store.create_account(new_account("alice", "A", 0)).unwrap();
    let tx = store.create_transaction(new_tx("alice", &acct.id, 10)).unwrap();

    let latest: Arc<Mutex<Option<Vec<Transaction>>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&latest);
    let _sub = store
        .subscribe_transactions(
            "alice",
            Arc::new(move |snap: &[Transaction]| *sink.lock() = Some(snap.to_vec())),
        )
        .unwrap();
    assert_eq!(latest.lock().as_ref().unwrap().len(), 1);

    store.delete_transaction(&tx.id).unwrap();
    assert!(latest.lock().as_ref().unwrap().is_empty());
}

#[test]
fn balance_write_is_compare_and_swap() {
    let store = setup();
    let acct = store.create_account(new_account("alice", "A", 100)).unwrap();

    let err = store
        .update_account_balance(&acct.id, Decimal::new(99, 0), Decimal::new(0, 0))
        .unwrap_err();
    match err {
        PersistenceError::Conflict {
            expected, found, ..
        } => {
            assert_eq!(expected, Decimal::new(99, 0));
            assert_eq!(found, Decimal::new(100, 0));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(store.list_accounts("alice").unwrap()[0].balance, Decimal::new(100, 0));

    // Same value at a different scale still matches.
    store
        .update_account_balance(&acct.id, Decimal::new(10000, 2), Decimal::new(4250, 2))
        .unwrap();
    assert_eq!(store.list_accounts("alice").unwrap()[0].balance, Decimal::new(4250, 2));
}

#[test]
fn missing_documents_are_reported() {
    let store = setup();
    assert!(matches!(
        store.delete_transaction("nope"),
        Err(PersistenceError::NotFound { collection: "transactions", .. })
    ));
    assert!(matches!(
        store.update_account_balance("nope", Decimal::ZERO, Decimal::ONE),
        Err(PersistenceError::NotFound { collection: "accounts", .. })
    ));
}

#[test]
fn shared_file_is_visible_to_a_second_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.sqlite");
    let first = RemoteStore::open(&path).unwrap();
    let second = RemoteStore::open(&path).unwrap();

    let acct = first.create_account(new_account("alice", "A", 50)).unwrap();
    second
        .update_account_balance(&acct.id, Decimal::new(50, 0), Decimal::new(60, 0))
        .unwrap();

    // The first handle's stale view is refused.
    assert!(matches!(
        first.update_account_balance(&acct.id, Decimal::new(50, 0), Decimal::new(40, 0)),
        Err(PersistenceError::Conflict { .. })
    ));
    assert_eq!(first.list_accounts("alice").unwrap()[0].balance, Decimal::new(60, 0));
}
