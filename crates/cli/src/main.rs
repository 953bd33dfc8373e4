// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mensa - run and simulate tables of fork-sharing agents

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, run, simulate};

#[derive(Parser)]
#[command(
    name = "mensa",
    version,
    about = "Mensa - decentralized fork sharing between neighboring agents"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live table until it is stopped
    Run(run::RunArgs),
    /// Run a deterministic simulation with invariant checks
    Simulate(simulate::SimulateArgs),
    /// Print the effective configuration as TOML
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Simulate(args) => simulate::simulate(args),
        Commands::Config(args) => config::config(args),
    }
}
