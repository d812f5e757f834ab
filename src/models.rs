// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub type AccountId = String;
pub type TransactionId = String;
pub type UserId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub bank_name: String,
    pub balance: Decimal,
    pub color: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
        }
    }

    /// Balance change when a transaction of this kind is recorded.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }

    /// Balance change when a transaction of this kind is removed.
    pub fn reverse(&self, amount: Decimal) -> Decimal {
        -self.apply(amount)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            _ => Err(ValidationError::InvalidKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn signed_amount(&self) -> Decimal {
        self.kind.apply(self.amount)
    }
}

/// Account document before the backend has assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub bank_name: String,
    pub balance: Decimal,
    pub color: String,
    pub user_id: UserId,
}

impl NewAccount {
    pub fn with_id(self, id: AccountId) -> Account {
        Account {
            id,
            name: self.name,
            bank_name: self.bank_name,
            balance: self.balance,
            color: self.color,
            user_id: self.user_id,
        }
    }
}

/// Transaction document before the backend has assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            account_id: self.account_id,
            amount: self.amount,
            kind: self.kind,
            category: self.category,
            date: self.date,
            note: self.note,
            user_id: self.user_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
}

pub const DEFAULT_CATEGORIES: [Category; 9] = [
    Category {
        id: "cat1",
        name: "飲食",
        color: "#F87171",
    },
    Category {
        id: "cat2",
        name: "交通",
        color: "#60A5FA",
    },
    Category {
        id: "cat3",
        name: "購物",
        color: "#F472B6",
    },
    Category {
        id: "cat4",
        name: "住家",
        color: "#34D399",
    },
    Category {
        id: "cat5",
        name: "娛樂",
        color: "#FBBF24",
    },
    Category {
        id: "cat6",
        name: "醫療",
        color: "#EF4444",
    },
    Category {
        id: "cat7",
        name: "薪資",
        color: "#10B981",
    },
    Category {
        id: "cat8",
        name: "投資",
        color: "#8B5CF6",
    },
    Category {
        id: "cat9",
        name: "其他",
        color: "#9CA3AF",
    },
];

pub const ACCOUNT_COLORS: [&str; 7] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#6366F1",
];

/// Palette slot for the next account, cycling by how many accounts exist.
pub fn color_for_index(n: usize) -> &'static str {
    ACCOUNT_COLORS[n % ACCOUNT_COLORS.len()]
}
