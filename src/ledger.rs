// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance-affecting mutations.
//!
//! Every intent is two independent writes: the transaction document first,
//! then the owning account's balance. Nothing spans both, so a failure on the
//! second write leaves a [`ConsistencyGap`] that is logged and returned but
//! never rolled back or retried.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{Result, ValidationError};
use crate::models::{
    color_for_index, Account, AccountId, NewAccount, NewTransaction, Transaction,
    TransactionId, TransactionKind, UserId,
};
use crate::session::Session;
use crate::store::Store;
use crate::validate::{self, AccountDraft, AmountPolicy, TransactionDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    CreateTransaction,
    DeleteTransaction,
}

/// A transaction write that landed without its paired balance write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyGap {
    pub intent: Intent,
    pub account_id: AccountId,
    pub transaction_id: TransactionId,
    pub delta: Decimal,
    pub expected_balance: Decimal,
    pub intended_balance: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub record: T,
    /// Balance written for the owning account, when that write succeeded.
    pub balance: Option<Decimal>,
    pub gap: Option<ConsistencyGap>,
}

impl<T> MutationOutcome<T> {
    pub fn is_consistent(&self) -> bool {
        self.gap.is_none()
    }
}

/// Everything needed to reverse a transaction's effect.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteIntent {
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub kind: TransactionKind,
}

impl From<&Transaction> for DeleteIntent {
    fn from(t: &Transaction) -> Self {
        Self {
            transaction_id: t.id.clone(),
            account_id: t.account_id.clone(),
            amount: t.amount,
            kind: t.kind,
        }
    }
}

/// Balance after `delta`, or a validation error when it does not fit in a
/// `Decimal`. Checked before any write.
fn next_balance(old_balance: Decimal, delta: Decimal) -> Result<Decimal> {
    old_balance
        .checked_add(delta)
        .ok_or_else(|| ValidationError::AmountOutOfRange(delta.abs()).into())
}

pub struct Ledger {
    store: Arc<dyn Store>,
    user_id: UserId,
    policy: AmountPolicy,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>, session: &Session, policy: AmountPolicy) -> Self {
        Self {
            store,
            user_id: session.user_id.clone(),
            policy,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn owned<'a>(&self, account_id: &str, known: &'a [Account]) -> Option<&'a Account> {
        known
            .iter()
            .find(|a| a.id == account_id && a.user_id == self.user_id)
    }

    /// Records a transaction and moves its account's balance.
    ///
    /// `known_accounts` is the caller's current view; the account's balance is
    /// taken from it rather than re-read, and the balance write only lands if
    /// the stored balance still matches.
    pub fn create_transaction(
        &self,
        draft: &TransactionDraft,
        known_accounts: &[Account],
    ) -> Result<MutationOutcome<Transaction>> {
        let valid = validate::validate_transaction(draft, known_accounts, self.policy)?;
        if valid.account.user_id != self.user_id {
            return Err(ValidationError::UnknownAccount(valid.account.id).into());
        }
        let delta = valid.kind.apply(valid.amount);
        let old_balance = valid.account.balance;
        let new_balance = next_balance(old_balance, delta)?;

        let tx = self.store.create_transaction(NewTransaction {
            account_id: valid.account.id.clone(),
            amount: valid.amount,
            kind: valid.kind,
            category: valid.category,
            date: valid.date,
            note: valid.note,
            user_id: self.user_id.clone(),
            created_at: Utc::now(),
        })?;

        let outcome = self.apply_balance(
            Intent::CreateTransaction,
            &valid.account.id,
            &tx.id,
            old_balance,
            new_balance,
        );
        Ok(MutationOutcome {
            record: tx,
            balance: outcome.0,
            gap: outcome.1,
        })
    }

    /// Removes a transaction and reverses its effect on the account balance
    /// known to the caller.
    pub fn delete_transaction(
        &self,
        intent: &DeleteIntent,
        known_accounts: &[Account],
    ) -> Result<MutationOutcome<TransactionId>> {
        let account = self
            .owned(&intent.account_id, known_accounts)
            .ok_or_else(|| ValidationError::UnknownAccount(intent.account_id.clone()))?;
        // The document must be the caller's own and match what the intent
        // claims to reverse.
        let in_scope = self
            .store
            .list_transactions(&self.user_id)?
            .iter()
            .any(|t| {
                t.id == intent.transaction_id
                    && t.account_id == intent.account_id
                    && t.amount == intent.amount
                    && t.kind == intent.kind
            });
        if !in_scope {
            return Err(ValidationError::UnknownTransaction(intent.transaction_id.clone()).into());
        }
        let delta = intent.kind.reverse(intent.amount);
        let old_balance = account.balance;
        let new_balance = next_balance(old_balance, delta)?;

        self.store.delete_transaction(&intent.transaction_id)?;

        let outcome = self.apply_balance(
            Intent::DeleteTransaction,
            &account.id,
            &intent.transaction_id,
            old_balance,
            new_balance,
        );
        Ok(MutationOutcome {
            record: intent.transaction_id.clone(),
            balance: outcome.0,
            gap: outcome.1,
        })
    }

    /// Creates an account with the supplied opening balance. One write, no
    /// derivation.
    pub fn create_account(
        &self,
        draft: &AccountDraft,
        known_accounts: &[Account],
    ) -> Result<Account> {
        let valid = validate::validate_account(draft, self.policy)?;
        let account = self.store.create_account(NewAccount {
            name: valid.name,
            bank_name: valid.bank_name,
            balance: valid.balance,
            color: color_for_index(known_accounts.len()).to_string(),
            user_id: self.user_id.clone(),
        })?;
        tracing::info!(id = %account.id, name = %account.name, "account created");
        Ok(account)
    }

    fn apply_balance(
        &self,
        intent: Intent,
        account_id: &str,
        transaction_id: &str,
        old_balance: Decimal,
        new_balance: Decimal,
    ) -> (Option<Decimal>, Option<ConsistencyGap>) {
        let delta = new_balance - old_balance;
        match self
            .store
            .update_account_balance(account_id, old_balance, new_balance)
        {
            Ok(()) => (Some(new_balance), None),
            Err(e) => {
                let gap = ConsistencyGap {
                    intent,
                    account_id: account_id.to_string(),
                    transaction_id: transaction_id.to_string(),
                    delta,
                    expected_balance: old_balance,
                    intended_balance: new_balance,
                    reason: e.to_string(),
                };
                tracing::error!(
                    intent = ?gap.intent,
                    account_id = %gap.account_id,
                    transaction_id = %gap.transaction_id,
                    delta = %gap.delta,
                    error = %e,
                    "balance write failed after transaction write; ledger is inconsistent"
                );
                (None, Some(gap))
            }
        }
    }
}
