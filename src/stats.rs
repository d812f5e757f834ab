// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Account, Transaction, TransactionKind, DEFAULT_CATEGORIES};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub net_worth: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub color: String,
    pub total: Decimal,
}

/// Totals saturate at the `Decimal` bounds.
pub fn summarize(accounts: &[Account], transactions: &[Transaction]) -> Summary {
    let mut s = Summary {
        net_worth: accounts
            .iter()
            .fold(Decimal::ZERO, |acc, a| acc.saturating_add(a.balance)),
        ..Summary::default()
    };
    for t in transactions {
        match t.kind {
            TransactionKind::Income => s.income = s.income.saturating_add(t.amount),
            TransactionKind::Expense => s.expense = s.expense.saturating_add(t.amount),
        }
    }
    s
}

/// Expense totals for the fixed category set, in category order. Labels
/// outside the set and zero totals are left out.
pub fn expense_by_category(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
    {
        let total = totals.entry(t.category.as_str()).or_default();
        *total = total.saturating_add(t.amount);
    }
    DEFAULT_CATEGORIES
        .iter()
        .filter_map(|c| {
            let total = totals.get(c.name).copied().unwrap_or_default();
            (!total.is_zero()).then(|| CategoryTotal {
                category: c.name.to_string(),
                color: c.color.to_string(),
                total,
            })
        })
        .collect()
}
