// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use crate::validate::AccountDraft;
use anyhow::Result;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let session = app.session()?;
    let projection = app.projection(&session)?;
    let draft = AccountDraft {
        name: sub.get_one::<String>("name").cloned().unwrap_or_default(),
        bank_name: sub.get_one::<String>("bank").cloned().unwrap_or_default(),
        balance: sub.get_one::<String>("balance").cloned().unwrap_or_default(),
    };
    let account = app
        .ledger(&session)
        .create_account(&draft, &projection.accounts())?;
    println!(
        "Added account '{}' ({}, {}) [{}]",
        account.name,
        account.bank_name,
        fmt_money(&account.balance),
        account.id
    );
    Ok(())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let session = app.session()?;
    let accounts = app.projection(&session)?.accounts();
    if !maybe_print_json(json_flag, jsonl_flag, &accounts)? {
        let rows = accounts
            .iter()
            .map(|a| {
                vec![
                    a.id.clone(),
                    a.name.clone(),
                    a.bank_name.clone(),
                    fmt_money(&a.balance),
                    a.color.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Name", "Bank", "Balance", "Color"], rows)
        );
    }
    Ok(())
}
