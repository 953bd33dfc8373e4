// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mensa config` - Print the effective configuration

use super::TableArgs;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub table: TableArgs,
}

pub fn config(args: ConfigArgs) -> Result<()> {
    let config = args.table.resolve()?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}
