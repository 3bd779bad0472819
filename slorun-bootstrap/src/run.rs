// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Composition Root
//!
//! Wires a configured [`slorun_domain::repositories::Driver`] and the
//! bootstrap's port implementations into one call to
//! [`slorun_domain::services::engine::run_experiment`], and the `validate`
//! subcommand's parse-only path.

use std::sync::Arc;

use async_trait::async_trait;
use slorun_domain::aggregates::Experiment;
use slorun_domain::entities::task::Task;
use slorun_domain::error::EngineError;
use slorun_domain::repositories::Driver;
use slorun_domain::services::engine;
use slorun_domain::services::ports::RunContext;
use slorun_drivers::{InMemoryDriver, LocalFileDriver};
use tracing::info;

use crate::config::{DriverKind, EngineConfig};
use crate::ports::{ShellScriptRunner, Unimplemented};
use crate::shutdown::CancellationToken;

fn build_driver(config: &EngineConfig) -> Arc<dyn Driver> {
    match config.driver {
        DriverKind::LocalFile => Arc::new(LocalFileDriver::new(config.directory.clone())),
        DriverKind::Memory => Arc::new(InMemoryDriver::new()),
    }
}

/// Wraps a [`Driver`], substituting a fixed revision for the inner driver's
/// own auto-increment. Used when `--revision` is given on the command line.
struct RevisionOverrideDriver {
    inner: Arc<dyn Driver>,
    revision: i64,
}

#[async_trait]
impl Driver for RevisionOverrideDriver {
    async fn read(&self) -> Result<Experiment, EngineError> {
        self.inner.read().await
    }

    async fn write(&self, experiment: &Experiment) -> Result<(), EngineError> {
        self.inner.write(experiment).await
    }

    async fn revision(&self) -> Result<i64, EngineError> {
        Ok(self.revision)
    }
}

/// Runs `config.loops` loops (one, if unset) of the experiment described by
/// `config` against its configured driver, stopping early on task failure
/// or once `cancel` is signaled. Each loop re-reads the driver so an
/// externally-updated spec is picked up between iterations, mirroring how
/// a scheduler re-enters with `reuseResult = true`.
pub async fn run(config: EngineConfig, cancel: &CancellationToken) -> Result<(), EngineError> {
    let driver: Arc<dyn Driver> = match config.revision {
        Some(revision) => Arc::new(RevisionOverrideDriver {
            inner: build_driver(&config),
            revision,
        }),
        None => build_driver(&config),
    };

    let load_generator = Unimplemented;
    let metrics_provider = Unimplemented;
    let readiness_checker = Unimplemented;
    let script_runner = ShellScriptRunner;
    let ctx = RunContext {
        load_generator: &load_generator,
        metrics_provider: &metrics_provider,
        readiness_checker: &readiness_checker,
        script_runner: &script_runner,
    };

    let total_loops = config.loops.unwrap_or(1).max(1);
    let mut reuse_result = config.reuse_result;
    let mut experiment = None;

    for iteration in 0..total_loops {
        if cancel.is_cancelled() {
            info!(iteration, "shutdown requested, stopping before next loop");
            break;
        }

        let current = engine::build(driver.as_ref()).await?;
        let result = engine::run_experiment(current, reuse_result, driver.as_ref(), &ctx).await?;
        info!(
            iteration,
            num_completed_tasks = result.result().map(|r| r.num_completed_tasks).unwrap_or_default(),
            failure = result.result().map(|r| r.failure).unwrap_or_default(),
            "experiment loop finished"
        );

        let failed = !result.has_no_failure();
        experiment = Some(result);
        reuse_result = true;
        if failed {
            break;
        }
    }

    match experiment {
        Some(result) if result.has_no_failure() => Ok(()),
        Some(_) => Err(EngineError::TaskFailed("experiment loop ended with failure = true".to_string())),
        None => Ok(()),
    }
}

/// Parses `file` as a spec document and reports the first parse error, if
/// any, without executing any task.
pub async fn validate(file: &std::path::Path) -> Result<(), EngineError> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .map_err(|err| EngineError::Driver(err.to_string()))?;
    let raw: Vec<serde_json::Value> = serde_yaml::from_str(&contents).map_err(|err| EngineError::Serialization(err.to_string()))?;

    for value in raw {
        Task::parse(value)?;
    }
    info!(file = %file.display(), "spec is valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverKind;
    use crate::shutdown::ShutdownCoordinator;

    fn memory_config(loops: Option<u32>) -> EngineConfig {
        EngineConfig {
            driver: DriverKind::Memory,
            loops,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn default_config_runs_exactly_one_loop() {
        let cancel = ShutdownCoordinator::default().token();
        run(memory_config(None), &cancel).await.unwrap();
    }

    #[tokio::test]
    async fn loops_bound_runs_that_many_times() {
        // Each loop of an empty spec completes with no failure; a `loops`
        // bound of 3 should not error and should not hang.
        let cancel = ShutdownCoordinator::default().token();
        run(memory_config(Some(3)), &cancel).await.unwrap();
    }

    #[tokio::test]
    async fn cancellation_before_first_loop_is_a_clean_no_op() {
        let coordinator = ShutdownCoordinator::default();
        coordinator.initiate_shutdown();
        run(memory_config(Some(5)), &coordinator.token()).await.unwrap();
    }

    #[tokio::test]
    async fn revision_override_is_passed_through_to_the_driver() {
        let driver = RevisionOverrideDriver {
            inner: Arc::new(InMemoryDriver::new()),
            revision: 42,
        };
        assert_eq!(driver.revision().await.unwrap(), 42);
        assert_eq!(driver.revision().await.unwrap(), 42);
    }
}
