// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface
//!
//! Two subcommands: `run` drives one loop of an experiment against a
//! configured driver, `validate` parses a spec file and reports parse
//! errors without executing anything.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DriverKind;

#[derive(Debug, Parser)]
#[command(name = "slorun", version, about = "Metrics-driven SLO experiment runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug-level logging.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Path to a config file (YAML/TOML/JSON); overrides `SLORUN_*` env vars.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one loop of the experiment against the configured driver.
    Run {
        /// Directory the local-file driver reads/writes, when `--driver local-file`.
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Which driver implementation to use.
        #[arg(long, value_enum)]
        driver: Option<CliDriverKind>,

        /// Carry the prior result forward instead of starting a fresh revision.
        #[arg(long)]
        reuse_result: bool,

        /// Override the driver's own revision counter instead of letting it
        /// auto-increment.
        #[arg(long)]
        revision: Option<i64>,

        /// Run up to this many loops, stopping early on task failure or a
        /// shutdown request. Defaults to one loop.
        #[arg(long)]
        loops: Option<u32>,
    },
    /// Parse a spec file and report any parse errors, without running it.
    Validate {
        /// Path to the spec file (YAML or JSON).
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliDriverKind {
    LocalFile,
    Memory,
}

impl From<CliDriverKind> for DriverKind {
    fn from(kind: CliDriverKind) -> Self {
        match kind {
            CliDriverKind::LocalFile => DriverKind::LocalFile,
            CliDriverKind::Memory => DriverKind::Memory,
        }
    }
}

/// Parses `argv` without touching the process's real arguments — used by
/// tests and anything that needs to re-parse a synthetic command line.
pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(args)
}
