// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::Mode;
use crate::validate::AmountPolicy;

pub const ADVISOR_KEY_ENV: &str = "POCKETLEDGER_ADVISOR_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// User id for remote mode.
    pub user: Option<String>,
    pub amount_policy: AmountPolicy,
    /// Presence of this section selects remote mode.
    pub remote: Option<RemoteConfig>,
    pub local: LocalConfig,
    pub advisor: AdvisorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteConfig {
    pub database: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LocalConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AdvisorConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-3-pro-preview".into(),
        }
    }
}

impl Config {
    /// Reads `path`, or the platform default location when `path` is None.
    /// A missing default file yields the default (local-mode) config; an
    /// explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (crate::db::config_path()?, false),
        };
        let mut cfg = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Read config at {}", path.display()))?;
            Self::from_toml_str(&raw)
                .with_context(|| format!("Parse config at {}", path.display()))?
        } else if explicit {
            anyhow::bail!("Config file {} not found", path.display());
        } else {
            Self::default()
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(ADVISOR_KEY_ENV) {
            if !key.trim().is_empty() {
                self.advisor.api_key = Some(key.trim().to_string());
            }
        }
    }

    pub fn mode(&self) -> Mode {
        if self.remote.is_some() {
            Mode::Remote
        } else {
            Mode::Local
        }
    }

    pub fn local_data_dir(&self) -> Result<PathBuf> {
        match &self.local.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::db::data_dir(),
        }
    }
}
