// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only advisory text over the current projection. Never fails the
//! caller: a missing key or a broken service yields a fixed message.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::config::AdvisorConfig;
use crate::models::{Account, Transaction};
use crate::stats::{expense_by_category, summarize};
use crate::utils::http_client;

pub const OFFLINE_MESSAGE: &str =
    "Advice is unavailable in offline mode. Set an advisor API key to enable it.";
pub const UNAVAILABLE_MESSAGE: &str =
    "The advice service is temporarily unavailable. Please try again later.";
pub const EMPTY_MESSAGE: &str = "No advice could be generated.";

pub trait Advisor {
    fn advise(&self, transactions: &[Transaction], accounts: &[Account]) -> String;
}

pub struct OfflineAdvisor;

impl Advisor for OfflineAdvisor {
    fn advise(&self, _: &[Transaction], _: &[Account]) -> String {
        OFFLINE_MESSAGE.to_string()
    }
}

pub struct GeminiAdvisor {
    api_key: String,
    endpoint: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiAdvisor {
    pub fn new(api_key: String, cfg: &AdvisorConfig) -> Self {
        Self {
            api_key,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        }
    }

    fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        let resp = http_client()?
            .post(url)
            .json(&body)
            .send()?
            .error_for_status()?;
        let parsed: GenerateResponse = resp.json().context("Decode advisor response")?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        Ok((!text.trim().is_empty()).then_some(text))
    }
}

impl Advisor for GeminiAdvisor {
    fn advise(&self, transactions: &[Transaction], accounts: &[Account]) -> String {
        let prompt = build_prompt(transactions, accounts);
        match self.generate(&prompt) {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_MESSAGE.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, model = %self.model, "advisor request failed");
                UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

pub fn from_config(cfg: &AdvisorConfig) -> Box<dyn Advisor> {
    match cfg.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Box::new(GeminiAdvisor::new(key.to_string(), cfg)),
        _ => {
            tracing::warn!("no advisor API key configured; advice disabled");
            Box::new(OfflineAdvisor)
        }
    }
}

pub fn build_prompt(transactions: &[Transaction], accounts: &[Account]) -> String {
    let summary = summarize(accounts, transactions);
    let balances = accounts
        .iter()
        .map(|a| format!("{}: {}", a.name, a.balance))
        .collect::<Vec<_>>()
        .join(", ");
    let categories = expense_by_category(transactions)
        .into_iter()
        .map(|c| format!("{}: {}", c.category, c.total))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a professional financial advisor. The user's financial summary:\n\
         - Total income: {}\n\
         - Total expense: {}\n\
         - Account balances: {}\n\
         - Expense by category: {}\n\n\
         In under 300 words give: 1. an analysis of spending, 2. savings advice, \
         3. concrete tips for reducing specific expenses. Keep the tone friendly and professional.",
        summary.income, summary.expense, balances, categories
    )
}
