// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Input checks applied to mutation intents before anything is written.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::{Account, TransactionKind};

/// What to do with an amount that does not parse as a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmountPolicy {
    /// Fail the intent with `ValidationError::InvalidAmount`.
    #[default]
    Reject,
    /// Treat the amount as zero and carry on.
    CoerceZero,
}

/// Raw transaction form input.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    pub account_id: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub date: String,
    pub note: Option<String>,
}

/// Raw account form input.
#[derive(Debug, Clone, Default)]
pub struct AccountDraft {
    pub name: String,
    pub bank_name: String,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidTransaction {
    pub account: Account,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidAccount {
    pub name: String,
    pub bank_name: String,
    pub balance: Decimal,
}

fn parse_number(s: &str) -> Option<Decimal> {
    let s = s.trim();
    // An empty field counts as zero, the way a blank numeric input does.
    if s.is_empty() {
        return Some(Decimal::ZERO);
    }
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

pub fn parse_amount(s: &str, policy: AmountPolicy) -> Result<Decimal, ValidationError> {
    let amount = match (parse_number(s), policy) {
        (Some(d), _) => d,
        (None, AmountPolicy::CoerceZero) => Decimal::ZERO,
        (None, AmountPolicy::Reject) => return Err(ValidationError::InvalidAmount(s.to_string())),
    };
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(amount)
}

pub fn parse_balance(s: &str, policy: AmountPolicy) -> Result<Decimal, ValidationError> {
    match (parse_number(s), policy) {
        (Some(d), _) => Ok(d),
        (None, AmountPolicy::CoerceZero) => Ok(Decimal::ZERO),
        (None, AmountPolicy::Reject) => Err(ValidationError::InvalidBalance(s.to_string())),
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

pub fn validate_transaction(
    draft: &TransactionDraft,
    known_accounts: &[Account],
    policy: AmountPolicy,
) -> Result<ValidTransaction, ValidationError> {
    let amount = parse_amount(&draft.amount, policy)?;
    let kind: TransactionKind = draft.kind.parse()?;
    let date = parse_date(&draft.date)?;
    let account_id = draft.account_id.trim();
    let account = known_accounts
        .iter()
        .find(|a| a.id == account_id)
        .cloned()
        .ok_or_else(|| ValidationError::UnknownAccount(account_id.to_string()))?;
    let note = draft
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    Ok(ValidTransaction {
        account,
        kind,
        amount,
        category: draft.category.trim().to_string(),
        date,
        note,
    })
}

pub fn validate_account(
    draft: &AccountDraft,
    policy: AmountPolicy,
) -> Result<ValidAccount, ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty("name"));
    }
    let bank_name = draft.bank_name.trim();
    if bank_name.is_empty() {
        return Err(ValidationError::Empty("bank name"));
    }
    Ok(ValidAccount {
        name: name.to_string(),
        bank_name: bank_name.to_string(),
        balance: parse_balance(&draft.balance, policy)?,
    })
}
