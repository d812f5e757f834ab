// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::ledger::Ledger;
use crate::projection::Projection;
use crate::session::{Backend, Mode, Session};

/// Configuration plus the backend it selected, handed to every command.
pub struct App {
    pub config: Config,
    pub backend: Backend,
    pub user_override: Option<String>,
}

impl App {
    pub fn open(config: Config, user_override: Option<String>) -> Result<Self> {
        let backend = Backend::open(&config)?;
        Ok(Self {
            config,
            backend,
            user_override,
        })
    }

    pub fn session(&self) -> Result<Session> {
        let session = self
            .backend
            .current_session(&self.config, self.user_override.as_deref())?;
        match (session, self.backend.mode()) {
            (Some(s), _) => Ok(s),
            (None, Mode::Local) => {
                anyhow::bail!("Not logged in; run `pocketledger login --email <email>`")
            }
            (None, Mode::Remote) => {
                anyhow::bail!("No user configured; set `user` in config.toml or pass --user")
            }
        }
    }

    pub fn ledger(&self, session: &Session) -> Ledger {
        Ledger::new(self.backend.store(), session, self.config.amount_policy)
    }

    pub fn projection(&self, session: &Session) -> Result<Projection> {
        Projection::attach(self.backend.store(), session.clone())
            .with_context(|| format!("Load ledger for user '{}'", session.user_id))
    }
}
