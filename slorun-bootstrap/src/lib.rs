// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap
//!
//! The bootstrap crate sits outside the domain and drivers crates and
//! provides:
//!
//! - **Entry point** — CLI parsing and dispatch (`run` / `validate`)
//! - **Configuration** — layered config-file/env/flag resolution
//! - **Logging** — `tracing-subscriber` installation
//! - **Shutdown** — cancellation-token-based graceful shutdown
//! - **Composition root** — wires a [`slorun_domain::repositories::Driver`]
//!   and the execution ports into the engine loop
//! - **Exit codes** — maps [`slorun_domain::EngineError`] onto `sysexits.h`

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod ports;
pub mod run;
pub mod shutdown;

pub use cli::{Cli, Command};
pub use exit_code::{result_to_exit_code, ExitCode};
pub use shutdown::CancellationToken;

/// Installs a `tracing-subscriber` formatter at `info` (or `debug` when
/// `verbose`), honoring `RUST_LOG` if set.
pub fn install_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Dispatches a parsed [`Cli`] to the `run` or `validate` entry point.
///
/// `cancel` gates the `run` loop: it's checked between loop iterations so a
/// shutdown request lets the current loop finish and persist before `run`
/// returns. `validate` is a quick parse-only pass and ignores it.
pub async fn dispatch(cli: Cli, cancel: &shutdown::CancellationToken) -> Result<(), slorun_domain::EngineError> {
    match cli.command {
        Command::Run {
            directory,
            driver,
            reuse_result,
            revision,
            loops,
        } => {
            let mut engine_config = config::load(cli.config.as_deref()).map_err(|err| slorun_domain::EngineError::Driver(err.to_string()))?;
            if let Some(directory) = directory {
                engine_config.directory = directory;
            }
            if let Some(driver) = driver {
                engine_config.driver = driver.into();
            }
            if reuse_result {
                engine_config.reuse_result = true;
            }
            if revision.is_some() {
                engine_config.revision = revision;
            }
            if loops.is_some() {
                engine_config.loops = loops;
            }
            run::run(engine_config, cancel).await
        }
        Command::Validate { file } => run::validate(&file).await,
    }
}
