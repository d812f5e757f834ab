// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, value_parser, Arg, ArgAction, Command};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("pocketledger")
        .version(crate_version!())
        .about("Multi-account personal ledger with remote and local stores")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(std::path::PathBuf))
                .help("Path to config.toml"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .help("User id to act as (remote mode)"),
        )
        .subcommand(Command::new("init").about("Open the active store and seed local data"))
        .subcommand(
            Command::new("login")
                .about("Sign in to the local demo store")
                .arg(Arg::new("email").long("email").required(true)),
        )
        .subcommand(Command::new("logout").about("Sign out of the local demo store"))
        .subcommand(Command::new("whoami").about("Show the current session"))
        .subcommand(
            Command::new("account")
                .about("Manage bank accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("bank").long("bank").required(true))
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .allow_hyphen_values(true)
                                .default_value("0"),
                        ),
                )
                .subcommand(json_args(Command::new("list"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and remove transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("EXPENSE")
                                .help("INCOME or EXPENSE"),
                        )
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .allow_hyphen_values(true)
                                .required(true),
                        )
                        .arg(Arg::new("category").long("category").default_value("其他"))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("report")
                .about("Totals over the current user's ledger")
                .subcommand(json_args(Command::new("summary")))
                .subcommand(json_args(Command::new("categories"))),
        )
        .subcommand(Command::new("advice").about("Ask the advisor for a spending summary"))
}
