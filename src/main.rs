// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

use pocketledger::{app::App, cli, commands, config::Config, session::Backend, utils};

fn main() -> Result<()> {
    utils::init_logging();
    let matches = cli::build_cli().get_matches();

    let config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let app = App::open(config, matches.get_one::<String>("user").cloned())?;

    match matches.subcommand() {
        Some(("init", _)) => match &app.backend {
            Backend::Local(store) => {
                println!("Local store ready at {}", store.dir().display());
            }
            Backend::Remote(_) => println!("Remote store ready"),
        },
        Some(("login", sub)) => commands::session::login(&app, sub)?,
        Some(("logout", _)) => commands::session::logout(&app)?,
        Some(("whoami", _)) => commands::session::whoami(&app)?,
        Some(("account", sub)) => commands::accounts::handle(&app, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&app, sub)?,
        Some(("report", sub)) => commands::reports::handle(&app, sub)?,
        Some(("advice", _)) => commands::advice::handle(&app)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
