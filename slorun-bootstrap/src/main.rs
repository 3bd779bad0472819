// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use clap::Parser;
use slorun_bootstrap::shutdown::ShutdownCoordinator;
use slorun_bootstrap::{dispatch, install_tracing, result_to_exit_code, Cli};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    install_tracing(cli.verbose);

    let coordinator = ShutdownCoordinator::default();
    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("ctrl-c received, finishing the current task before exit");
            signal_coordinator.initiate_shutdown();
        }
    });

    let result = dispatch(cli, &coordinator.token()).await;
    coordinator.complete_shutdown();
    result_to_exit_code(result)
}
