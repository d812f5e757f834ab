// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::stats::{expense_by_category, summarize};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(app, sub)?,
        Some(("categories", sub)) => categories(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn summary(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let session = app.session()?;
    let state = app.projection(&session)?.snapshot();
    let s = summarize(&state.accounts, &state.transactions);
    if !maybe_print_json(json_flag, jsonl_flag, &s)? {
        let rows = vec![
            vec!["Net worth".to_string(), fmt_money(&s.net_worth)],
            vec!["Income".to_string(), format!("+{}", fmt_money(&s.income))],
            vec!["Expense".to_string(), format!("-{}", fmt_money(&s.expense))],
        ];
        println!("{}", pretty_table(&["Metric", "Amount"], rows));
    }
    Ok(())
}

fn categories(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let session = app.session()?;
    let totals = expense_by_category(&app.projection(&session)?.transactions());
    if !maybe_print_json(json_flag, jsonl_flag, &totals)? {
        let rows = totals
            .iter()
            .map(|c| vec![c.category.clone(), fmt_money(&c.total)])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent"], rows));
    }
    Ok(())
}
