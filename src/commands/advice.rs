// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::advisor;
use crate::app::App;
use anyhow::Result;

pub fn handle(app: &App) -> Result<()> {
    let session = app.session()?;
    let state = app.projection(&session)?.snapshot();
    let advisor = advisor::from_config(&app.config.advisor);
    println!("{}", advisor.advise(&state.transactions, &state.accounts));
    Ok(())
}
