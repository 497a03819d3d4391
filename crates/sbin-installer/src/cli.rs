// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The cli entry point (spec §6).

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::{
    orchestrator::{self, InstallOptions},
    output::{self, QueryField},
    script::Verbosity,
    Error,
};

/// A lightweight, deterministic package installer for Windows, modeled on the
/// macOS `/usr/sbin/installer` command.
#[derive(Parser, Debug, Serialize)]
#[clap(author, version, about)]
pub struct Cli {
    /// Path to the archive to process.
    #[clap(long)]
    pkg: Option<PathBuf>,

    /// Target root per the resolution table in spec §4.5.
    #[clap(long, default_value = "/")]
    target: String,

    /// Print a metadata summary for the archive and exit.
    #[clap(long)]
    pkginfo: bool,

    /// Print a fixed list of installation domains and exit.
    #[clap(long)]
    dominfo: bool,

    /// Print available filesystem volumes with sizes and exit.
    #[clap(long)]
    volinfo: bool,

    /// Print one metadata field and exit.
    #[clap(long, value_enum)]
    query: Option<QueryField>,

    /// Enables verbose logging. Repeatable.
    #[clap(long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Raises the effective level and forces shell output live.
    #[clap(long = "verboseR")]
    verbose_r: bool,

    /// Forces shell output live, same effect as `--verboseR` on script output.
    #[clap(long)]
    dumplog: bool,

    /// Frames info/domain/volume output as an XML property list.
    #[clap(long)]
    plist: bool,

    /// Accepted and ignored: no signature verification is implemented.
    #[clap(long = "allowUntrusted")]
    allow_untrusted: bool,

    /// Prints the tool's version stamp and exits.
    #[clap(long)]
    vers: bool,

    /// Echoes the parsed options as JSON.
    #[clap(long)]
    config: bool,
}

fn run_cli(cli: Cli) -> crate::Result<()> {
    if cli.vers {
        println!("{}", crate::VERSION_STAMP);
        return Ok(());
    }

    if cli.config {
        println!("{}", serde_json::to_string_pretty(&cli)?);
    }

    if cli.dominfo {
        return output::print_dominfo(&cli.target, cli.plist);
    }

    if cli.volinfo {
        return output::print_volinfo(cli.plist);
    }

    let pkg = cli
        .pkg
        .clone()
        .ok_or_else(|| Error::BadInput("--pkg is required for this operation".into()))?;

    if cli.pkginfo {
        let info = orchestrator::inspect(&pkg)?;
        return output::print_pkginfo(&info, cli.plist);
    }

    if let Some(field) = cli.query {
        let info = orchestrator::inspect(&pkg)?;
        println!("{}", output::query_value(&info, field));
        return Ok(());
    }

    let opts = InstallOptions {
        archive_path: pkg,
        target_spec: cli.target.clone(),
        verbosity: Verbosity {
            verbose_r: cli.verbose_r,
            dumplog: cli.dumplog,
        },
    };
    orchestrator::install(&opts)?;
    Ok(())
}

/// Runs the cli, exiting the process with the appropriate code on error.
pub fn run() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help/--version already printed their output; clap's own exit
        // code distinguishes that from a genuine usage error.
        Err(e) => e.exit(),
    };

    crate::init_tracing_subscriber(cli.verbose, cli.verbose_r || cli.dumplog);
    if let Err(e) = run_cli(cli) {
        eprintln!("sbin-installer: {e}");
        std::process::exit(e.exit_code());
    }
}
