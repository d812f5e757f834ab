// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::ledger::DeleteIntent;
use crate::models::{Account, Transaction};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use crate::validate::TransactionDraft;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        Some(("rm", sub)) => remove(app, sub)?,
        _ => {}
    }
    Ok(())
}

/// Accepts an account id, falling back to a name match.
fn resolve_account(accounts: &[Account], key: &str) -> String {
    let key = key.trim();
    accounts
        .iter()
        .find(|a| a.id == key)
        .or_else(|| accounts.iter().find(|a| a.name == key))
        .map(|a| a.id.clone())
        .unwrap_or_else(|| key.to_string())
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let session = app.session()?;
    let projection = app.projection(&session)?;
    let accounts = projection.accounts();
    let account_key = sub.get_one::<String>("account").cloned().unwrap_or_default();

    let draft = TransactionDraft {
        account_id: resolve_account(&accounts, &account_key),
        kind: sub.get_one::<String>("type").cloned().unwrap_or_default(),
        amount: sub.get_one::<String>("amount").cloned().unwrap_or_default(),
        category: sub.get_one::<String>("category").cloned().unwrap_or_default(),
        date: sub
            .get_one::<String>("date")
            .cloned()
            .unwrap_or_else(|| Utc::now().date_naive().to_string()),
        note: sub.get_one::<String>("note").cloned(),
    };
    let outcome = app.ledger(&session).create_transaction(&draft, &accounts)?;
    let tx = &outcome.record;
    println!(
        "Recorded {} {} on {} ({}) [{}]",
        tx.kind,
        fmt_money(&tx.amount),
        tx.date,
        account_key.trim(),
        tx.id
    );
    if let Some(balance) = outcome.balance {
        println!("New balance: {}", fmt_money(&balance));
    }
    Ok(())
}

fn remove(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let session = app.session()?;
    let projection = app.projection(&session)?;
    let id = sub.get_one::<String>("id").map(|s| s.trim()).unwrap_or_default();
    let tx = projection
        .transactions()
        .into_iter()
        .find(|t| t.id == id)
        .with_context(|| format!("Transaction '{}' not found", id))?;
    let outcome = app
        .ledger(&session)
        .delete_transaction(&DeleteIntent::from(&tx), &projection.accounts())?;
    println!("Removed transaction '{}'", outcome.record);
    if let Some(balance) = outcome.balance {
        println!("New balance: {}", fmt_money(&balance));
    }
    Ok(())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let session = app.session()?;
    let projection = app.projection(&session)?;
    let data = query_rows(&projection.accounts(), projection.transactions(), sub);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.clone(),
                    r.date.clone(),
                    r.account.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Account", "Type", "Amount", "Category", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub account: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub note: String,
}

/// Newest first, then filtered by the `account`, `month` and `limit` args.
pub fn query_rows(
    accounts: &[Account],
    mut transactions: Vec<Transaction>,
    sub: &clap::ArgMatches,
) -> Vec<TransactionRow> {
    transactions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    let account_filter = sub
        .get_one::<String>("account")
        .map(|k| resolve_account(accounts, k));
    let month = sub.get_one::<String>("month").map(|m| m.trim().to_string());
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);

    transactions
        .into_iter()
        .filter(|t| account_filter.as_ref().is_none_or(|a| &t.account_id == a))
        .filter(|t| {
            month
                .as_ref()
                .is_none_or(|m| t.date.format("%Y-%m").to_string() == *m)
        })
        .take(limit)
        .map(|t| TransactionRow {
            account: accounts
                .iter()
                .find(|a| a.id == t.account_id)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| t.account_id.clone()),
            id: t.id,
            date: t.date.to_string(),
            kind: t.kind.to_string(),
            amount: fmt_money(&t.amount),
            category: t.category,
            note: t.note.unwrap_or_default(),
        })
        .collect()
}
