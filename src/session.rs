// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Who is using the ledger, and which backend they are bound to.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::error::StoreResult;
use crate::models::UserId;
use crate::store::local::{LOCAL_USER_ID, USER_KEY};
use crate::store::{LocalStore, RemoteStore, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Remote,
    Local,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Remote => f.write_str("remote"),
            Mode::Local => f.write_str("local"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub mode: Mode,
}

/// Shape of the `demo_user` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalUser {
    uid: String,
    email: String,
}

/// The active persistence backend, chosen once from configuration.
#[derive(Clone)]
pub enum Backend {
    Remote(Arc<RemoteStore>),
    Local(Arc<LocalStore>),
}

impl Backend {
    pub fn open(config: &Config) -> Result<Self> {
        match config.mode() {
            Mode::Remote => {
                let remote = config
                    .remote
                    .as_ref()
                    .context("remote mode selected without a [remote] section")?;
                let store = RemoteStore::open(&remote.database)?;
                tracing::info!(database = %remote.database.display(), "bound to remote store");
                Ok(Backend::Remote(Arc::new(store)))
            }
            Mode::Local => {
                let dir = config.local_data_dir()?;
                let store = LocalStore::open(&dir)
                    .with_context(|| format!("Open local store at {}", dir.display()))?;
                tracing::info!(dir = %dir.display(), "bound to local store");
                Ok(Backend::Local(Arc::new(store)))
            }
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Backend::Remote(_) => Mode::Remote,
            Backend::Local(_) => Mode::Local,
        }
    }

    pub fn store(&self) -> Arc<dyn Store> {
        match self {
            Backend::Remote(s) => Arc::clone(s) as Arc<dyn Store>,
            Backend::Local(s) => Arc::clone(s) as Arc<dyn Store>,
        }
    }

    /// Resolves the current identity. Remote mode takes the configured user
    /// (or `user_override`); local mode reads the demo login record.
    pub fn current_session(
        &self,
        config: &Config,
        user_override: Option<&str>,
    ) -> Result<Option<Session>> {
        match self {
            Backend::Remote(_) => Ok(user_override
                .map(str::to_string)
                .or_else(|| config.user.clone())
                .map(|user| Session {
                    user_id: user.clone(),
                    email: user,
                    mode: Mode::Remote,
                })),
            Backend::Local(store) => Ok(local_session(store)?),
        }
    }
}

pub fn local_session(store: &LocalStore) -> StoreResult<Option<Session>> {
    let user: Option<LocalUser> = store.get_record(USER_KEY)?;
    Ok(user.map(|u| Session {
        user_id: u.uid,
        email: u.email,
        mode: Mode::Local,
    }))
}

/// Local logins are not authenticated: every email maps to the one demo user.
pub fn local_login(store: &LocalStore, email: &str) -> StoreResult<Session> {
    let user = LocalUser {
        uid: LOCAL_USER_ID.to_string(),
        email: email.trim().to_string(),
    };
    store.put_record(USER_KEY, &user)?;
    tracing::info!(email = %user.email, "local login");
    Ok(Session {
        user_id: user.uid,
        email: user.email,
        mode: Mode::Local,
    })
}

pub fn local_logout(store: &LocalStore) -> StoreResult<()> {
    store.remove_record(USER_KEY)?;
    tracing::info!("local logout");
    Ok(())
}
