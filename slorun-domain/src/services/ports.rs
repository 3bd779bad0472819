// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Execution Ports
//!
//! The task variants that touch the outside world (load generation,
//! external metric backends, readiness waits, inline scripts) are
//! specified here only by the contract they need; concrete network and
//! process implementations live outside this crate. A `RunContext` bundles
//! one port of each kind and is threaded through `Task::run` so tasks never
//! reach for ambient I/O directly.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::value_objects::{HistogramBucket, MetricMeta};

/// One version's worth of observations produced by a load-generating task:
/// an error-rate gauge reading plus a latency sample vector, keyed by the
/// built-in metric name suffix (e.g. `"error-rate"`, `"latency"`).
#[derive(Debug, Clone, Default)]
pub struct LoadObservations {
    pub error_rate: Option<f64>,
    pub latency_samples: Vec<f64>,
    pub histograms: Vec<(String, Vec<HistogramBucket>)>,
}

/// Result of a load-generation run: one [`LoadObservations`] per version in
/// the order versions were declared.
#[derive(Debug, Clone, Default)]
pub struct LoadGeneratorOutput {
    pub per_version: Vec<LoadObservations>,
}

#[derive(Debug, Clone)]
pub struct HttpLoadInputs {
    pub urls: Vec<String>,
    pub duration: Duration,
    pub concurrency: u32,
    pub payload: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GrpcLoadInputs {
    pub call: String,
    pub host: String,
    pub proto_url: Option<String>,
    pub payload: Option<String>,
    pub concurrency: u32,
    pub total: u64,
}

/// Generates load against one or more application versions and reports
/// back the built-in metrics the `http`/`grpc` tasks register. The network
/// transport is an external collaborator; only this contract is specified.
#[async_trait]
pub trait LoadGenerator: Send + Sync {
    async fn run_http(&self, inputs: &HttpLoadInputs) -> Result<LoadGeneratorOutput, EngineError>;
    async fn run_grpc(&self, inputs: &GrpcLoadInputs) -> Result<LoadGeneratorOutput, EngineError>;
}

/// A single named metric query issued to a `custom-metrics` backend.
#[derive(Debug, Clone)]
pub struct MetricQuery {
    pub name: String,
    pub meta: MetricMeta,
    pub query: String,
}

/// Queries a named external metrics backend (Prometheus and similar) for
/// one version's worth of a declared metric. Authentication beyond simple
/// credential forwarding is out of scope.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn query(&self, backend: &str, query: &MetricQuery, version_index: usize) -> Result<crate::value_objects::MetricValue, EngineError>;
}

/// Blocks until a Kubernetes-style resource reaches readiness, or until
/// `timeout` elapses.
#[async_trait]
pub trait ReadinessChecker: Send + Sync {
    async fn wait_ready(&self, resource: &str, timeout: Duration) -> Result<(), EngineError>;
}

/// Executes an inline shell script, as used by the `run`-only task variant.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &str) -> Result<(), EngineError>;
}

/// Bundles one implementation of each port. Passed by reference into
/// `Task::run` so task variants never reach for ambient I/O.
pub struct RunContext<'a> {
    pub load_generator: &'a dyn LoadGenerator,
    pub metrics_provider: &'a dyn MetricsProvider,
    pub readiness_checker: &'a dyn ReadinessChecker,
    pub script_runner: &'a dyn ScriptRunner,
}
