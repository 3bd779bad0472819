// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Port Implementations
//!
//! The composition root's implementations of the engine's execution ports
//! (`slorun_domain::services::ports`). [`ShellScriptRunner`] is the one
//! real implementation — inline scripts are in scope. The network load
//! generators, the custom-metrics backend client, and the Kubernetes
//! readiness checker are external collaborators by design (purpose and
//! scope, non-goals); [`Unimplemented`] stands in for all three so a spec
//! that never uses `http`/`grpc`/`custom-metrics`/`ready` tasks still runs
//! end to end.

use async_trait::async_trait;
use slorun_domain::error::EngineError;
use slorun_domain::services::ports::{
    GrpcLoadInputs, HttpLoadInputs, LoadGenerator, LoadGeneratorOutput, MetricQuery, MetricsProvider, ReadinessChecker, ScriptRunner,
};
use slorun_domain::value_objects::MetricValue;
use std::time::Duration;

/// Runs an inline script through the platform shell.
pub struct ShellScriptRunner;

#[async_trait]
impl ScriptRunner for ShellScriptRunner {
    async fn run(&self, script: &str) -> Result<(), EngineError> {
        let shell = if cfg!(windows) { "cmd" } else { "sh" };
        let flag = if cfg!(windows) { "/C" } else { "-c" };

        let status = tokio::process::Command::new(shell)
            .arg(flag)
            .arg(script)
            .status()
            .await
            .map_err(|err| EngineError::TaskFailed(format!("failed to spawn script: {err}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(EngineError::TaskFailed(format!("script exited with {status}")))
        }
    }
}

/// Stands in for a port this deployment hasn't wired up a real
/// implementation for; any call fails the task with a descriptive error
/// rather than panicking.
pub struct Unimplemented;

#[async_trait]
impl LoadGenerator for Unimplemented {
    async fn run_http(&self, _inputs: &HttpLoadInputs) -> Result<LoadGeneratorOutput, EngineError> {
        Err(EngineError::TaskFailed("no HTTP load generator configured for this deployment".to_string()))
    }

    async fn run_grpc(&self, _inputs: &GrpcLoadInputs) -> Result<LoadGeneratorOutput, EngineError> {
        Err(EngineError::TaskFailed("no gRPC load generator configured for this deployment".to_string()))
    }
}

#[async_trait]
impl MetricsProvider for Unimplemented {
    async fn query(&self, backend: &str, _query: &MetricQuery, _version_index: usize) -> Result<MetricValue, EngineError> {
        Err(EngineError::TaskFailed(format!("no metrics provider configured for backend `{backend}`")))
    }
}

#[async_trait]
impl ReadinessChecker for Unimplemented {
    async fn wait_ready(&self, resource: &str, _timeout: Duration) -> Result<(), EngineError> {
        Err(EngineError::TaskFailed(format!("no readiness checker configured for resource `{resource}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shell_runner_succeeds_on_zero_exit() {
        let runner = ShellScriptRunner;
        assert!(runner.run("exit 0").await.is_ok());
    }

    #[tokio::test]
    async fn shell_runner_fails_on_nonzero_exit() {
        let runner = ShellScriptRunner;
        assert!(runner.run("exit 1").await.is_err());
    }
}
