// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::session::{local_login, local_logout, Backend};
use anyhow::Result;

pub fn login(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let email = sub.get_one::<String>("email").map(|s| s.trim()).unwrap_or_default();
    if email.is_empty() {
        anyhow::bail!("Email must not be empty");
    }
    match &app.backend {
        Backend::Local(store) => {
            let session = local_login(store, email)?;
            println!("Logged in as {} (local demo mode)", session.email);
        }
        Backend::Remote(_) => {
            anyhow::bail!("Remote identities come from config; set `user` or pass --user")
        }
    }
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    match &app.backend {
        Backend::Local(store) => {
            local_logout(store)?;
            println!("Logged out");
        }
        Backend::Remote(_) => println!("Remote sessions end with the process; nothing to do"),
    }
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    let session = app.session()?;
    println!("{} ({}, {} mode)", session.email, session.user_id, session.mode);
    Ok(())
}
