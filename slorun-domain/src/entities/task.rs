// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Abstraction and Variants
//!
//! A task is parsed into a closed set of variants at deserialization time —
//! there is no open-ended dispatch at runtime. Shared metadata (the `if`
//! predicate) lives on [`Task`] alongside the parsed [`TaskKind`]; the raw
//! `task`/`run`/`with` triple is consumed once during parsing and discarded.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregates::experiment::Experiment;
use crate::error::EngineError;
use crate::services::ports::{GrpcLoadInputs, HttpLoadInputs, MetricQuery, RunContext};
use crate::value_objects::{MetricMeta, MetricType, MetricValue, Slo, SloSet};

fn default_concurrency() -> u32 {
    1
}

fn default_timeout_seconds() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadyInputs {
    pub resource: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomMetricSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomMetricsInputs {
    pub backend: String,
    #[serde(default)]
    pub versions: Vec<usize>,
    pub metrics: Vec<CustomMetricSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpInputs {
    pub urls: Vec<String>,
    pub duration_seconds: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrpcInputs {
    pub call: String,
    pub host: String,
    #[serde(default)]
    pub proto_url: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssessInputs {
    #[serde(rename = "SLOs", default)]
    pub slos: SloSet,
}

/// The closed set of recognized task behaviors. The `run`-only form is its
/// own variant rather than a degenerate case of another.
#[derive(Debug, Clone)]
pub enum TaskKind {
    Ready(ReadyInputs),
    CustomMetrics(CustomMetricsInputs),
    Http(HttpInputs),
    Grpc(GrpcInputs),
    Assess(AssessInputs),
    InlineRun(String),
}

/// Metadata shared across all task variants.
#[derive(Debug, Clone, Default)]
pub struct TaskMeta {
    pub if_predicate: Option<String>,
}

/// A single step of a spec: shared metadata plus a dispatched variant.
#[derive(Debug, Clone)]
pub struct Task {
    pub meta: TaskMeta,
    pub kind: TaskKind,
}

/// Wire shape of a spec entry, consumed once by [`Task::parse`].
#[derive(Debug, Deserialize, Serialize)]
struct RawTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<String>,
    #[serde(rename = "run", skip_serializing_if = "Option::is_none")]
    run_script: Option<String>,
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    if_predicate: Option<String>,
    #[serde(default = "serde_json::Value::default", skip_serializing_if = "serde_json::Value::is_null")]
    with: serde_json::Value,
}

impl Task {
    /// Parses one spec entry, dispatching on the `task` discriminator (or
    /// the `run`-only form) and validating the parsed variant.
    pub fn parse(value: serde_json::Value) -> Result<Task, EngineError> {
        let raw: RawTask = serde_json::from_value(value)?;

        if raw.task.is_some() && raw.run_script.is_some() {
            return Err(EngineError::ConflictingTaskKind);
        }

        let kind = if let Some(script) = raw.run_script {
            TaskKind::InlineRun(script)
        } else {
            match raw.task.as_deref() {
                None => return Err(EngineError::MissingTaskKind),
                Some("ready") => TaskKind::Ready(parse_with(raw.with)?),
                Some("custom-metrics") => TaskKind::CustomMetrics(parse_with(raw.with)?),
                Some("http") => TaskKind::Http(parse_with(raw.with)?),
                Some("grpc") => TaskKind::Grpc(parse_with(raw.with)?),
                Some("assess") => TaskKind::Assess(parse_with(raw.with)?),
                Some(other) => return Err(EngineError::UnknownTask(other.to_string())),
            }
        };

        let task = Task {
            meta: TaskMeta {
                if_predicate: raw.if_predicate,
            },
            kind,
        };
        task.validate_inputs()?;
        Ok(task)
    }

    /// Serializes this task back to the wire shape parsed by [`Task::parse`],
    /// for drivers that round-trip the spec through the artifact format.
    pub fn to_raw_value(&self) -> serde_json::Value {
        let mut raw = RawTask {
            task: None,
            run_script: None,
            if_predicate: self.meta.if_predicate.clone(),
            with: serde_json::Value::Null,
        };
        match &self.kind {
            TaskKind::Ready(inputs) => {
                raw.task = Some("ready".to_string());
                raw.with = serde_json::to_value(inputs).expect("ReadyInputs always serializes");
            }
            TaskKind::CustomMetrics(inputs) => {
                raw.task = Some("custom-metrics".to_string());
                raw.with = serde_json::to_value(inputs).expect("CustomMetricsInputs always serializes");
            }
            TaskKind::Http(inputs) => {
                raw.task = Some("http".to_string());
                raw.with = serde_json::to_value(inputs).expect("HttpInputs always serializes");
            }
            TaskKind::Grpc(inputs) => {
                raw.task = Some("grpc".to_string());
                raw.with = serde_json::to_value(inputs).expect("GrpcInputs always serializes");
            }
            TaskKind::Assess(inputs) => {
                raw.task = Some("assess".to_string());
                raw.with = serde_json::to_value(inputs).expect("AssessInputs always serializes");
            }
            TaskKind::InlineRun(script) => {
                raw.run_script = Some(script.clone());
            }
        }
        serde_json::to_value(raw).expect("RawTask always serializes")
    }

    /// Pure validation of the parsed variant's inputs. Called once at parse
    /// time; never mutates.
    pub fn validate_inputs(&self) -> Result<(), EngineError> {
        match &self.kind {
            TaskKind::Ready(inputs) => {
                if inputs.resource.is_empty() {
                    return Err(EngineError::TaskFailed("ready task requires a non-empty resource reference".to_string()));
                }
            }
            TaskKind::CustomMetrics(inputs) => {
                if inputs.backend.is_empty() || inputs.metrics.is_empty() {
                    return Err(EngineError::TaskFailed(
                        "custom-metrics task requires a backend and at least one metric".to_string(),
                    ));
                }
            }
            TaskKind::Http(inputs) => {
                if inputs.urls.is_empty() {
                    return Err(EngineError::TaskFailed("http task requires at least one URL".to_string()));
                }
            }
            TaskKind::Grpc(inputs) => {
                if inputs.call.is_empty() || inputs.host.is_empty() {
                    return Err(EngineError::TaskFailed("grpc task requires a call and host".to_string()));
                }
            }
            TaskKind::Assess(_) | TaskKind::InlineRun(_) => {}
        }
        Ok(())
    }

    /// Idempotent default-filling, run once before the first `run` call.
    pub fn initialize_defaults(&mut self) {
        if let TaskKind::Http(inputs) = &mut self.kind {
            if inputs.concurrency == 0 {
                inputs.concurrency = default_concurrency();
            }
        }
        if let TaskKind::Grpc(inputs) = &mut self.kind {
            if inputs.concurrency == 0 {
                inputs.concurrency = default_concurrency();
            }
        }
        if let TaskKind::Ready(inputs) = &mut self.kind {
            if inputs.timeout_seconds == 0 {
                inputs.timeout_seconds = default_timeout_seconds();
            }
        }
    }

    /// Executes this task's effect against `experiment`, through the ports
    /// bundled in `ctx`.
    pub async fn run(&self, experiment: &mut Experiment, ctx: &RunContext<'_>) -> Result<(), EngineError> {
        match &self.kind {
            TaskKind::Ready(inputs) => {
                ctx.readiness_checker
                    .wait_ready(&inputs.resource, Duration::from_secs(inputs.timeout_seconds))
                    .await
            }
            TaskKind::CustomMetrics(inputs) => run_custom_metrics(experiment, ctx, inputs).await,
            TaskKind::Http(inputs) => run_http(experiment, ctx, inputs).await,
            TaskKind::Grpc(inputs) => run_grpc(experiment, ctx, inputs).await,
            TaskKind::Assess(inputs) => run_assess(experiment, inputs),
            TaskKind::InlineRun(script) => ctx.script_runner.run(script).await,
        }
    }
}

fn parse_with<T: serde::de::DeserializeOwned>(with: serde_json::Value) -> Result<T, EngineError> {
    serde_json::from_value(with).map_err(EngineError::from)
}

async fn run_custom_metrics(experiment: &mut Experiment, ctx: &RunContext<'_>, inputs: &CustomMetricsInputs) -> Result<(), EngineError> {
    let num_versions = inputs.versions.iter().max().map(|&max_index| max_index + 1).unwrap_or(0);
    experiment.insights_mut().init_with_num_versions(num_versions)?;

    for &version_index in &inputs.versions {
        for metric in &inputs.metrics {
            let query = MetricQuery {
                name: metric.name.clone(),
                meta: MetricMeta {
                    description: metric.description.clone(),
                    units: metric.units.clone(),
                    metric_type: metric.metric_type,
                },
                query: metric.query.clone(),
            };
            let value = ctx.metrics_provider.query(&inputs.backend, &query, version_index).await?;
            let meta = MetricMeta {
                description: metric.description.clone(),
                units: metric.units.clone(),
                metric_type: metric.metric_type,
            };
            let canonical_name = format!("{}/{}", inputs.backend, metric.name);
            experiment.insights_mut().update_metric(&canonical_name, meta, version_index, value)?;
        }
    }
    Ok(())
}

async fn run_http(experiment: &mut Experiment, ctx: &RunContext<'_>, inputs: &HttpInputs) -> Result<(), EngineError> {
    let load_inputs = HttpLoadInputs {
        urls: inputs.urls.clone(),
        duration: Duration::from_secs(inputs.duration_seconds),
        concurrency: inputs.concurrency,
        payload: inputs.payload.clone(),
    };
    let output = ctx.load_generator.run_http(&load_inputs).await?;
    record_load_output(experiment, "http", output)
}

async fn run_grpc(experiment: &mut Experiment, ctx: &RunContext<'_>, inputs: &GrpcInputs) -> Result<(), EngineError> {
    let load_inputs = GrpcLoadInputs {
        call: inputs.call.clone(),
        host: inputs.host.clone(),
        proto_url: inputs.proto_url.clone(),
        payload: inputs.payload.clone(),
        concurrency: inputs.concurrency,
        total: inputs.total,
    };
    let output = ctx.load_generator.run_grpc(&load_inputs).await?;
    record_load_output(experiment, "grpc", output)
}

fn record_load_output(experiment: &mut Experiment, backend: &str, output: crate::services::ports::LoadGeneratorOutput) -> Result<(), EngineError> {
    let insights = experiment.insights_mut();
    insights.init_with_num_versions(output.per_version.len())?;
    for (version_index, observations) in output.per_version.iter().enumerate() {
        if let Some(error_rate) = observations.error_rate {
            insights.update_metric(
                &format!("{backend}/error-rate"),
                MetricMeta::new(format!("{backend} load error rate"), MetricType::Gauge),
                version_index,
                MetricValue::Scalar(error_rate),
            )?;
        }
        if !observations.latency_samples.is_empty() {
            insights.update_metric(
                &format!("{backend}/latency"),
                MetricMeta::new(format!("{backend} load latency"), MetricType::Sample),
                version_index,
                MetricValue::Sample(observations.latency_samples.clone()),
            )?;
        }
        for (name, buckets) in &observations.histograms {
            insights.update_metric(
                &format!("{backend}/{name}"),
                MetricMeta::new(format!("{backend} {name} histogram"), MetricType::Histogram),
                version_index,
                MetricValue::Histogram(buckets.clone()),
            )?;
        }
    }
    Ok(())
}

fn run_assess(experiment: &mut Experiment, inputs: &AssessInputs) -> Result<(), EngineError> {
    let insights = experiment.insights_mut();
    insights.set_slos(inputs.slos.clone())?;
    insights.allocate_slo_satisfaction();

    let (upper, lower): (Vec<Slo>, Vec<Slo>) = insights.slo_definitions();
    let num_versions = insights.num_versions();

    for (slo_index, slo) in upper.iter().enumerate() {
        for version_index in 0..num_versions {
            let value = insights.scalar_metric_value(version_index, &slo.metric)?;
            let satisfied = value.map(|v| v <= slo.limit).unwrap_or(false);
            insights.set_upper_satisfied(slo_index, version_index, satisfied);
        }
    }
    for (slo_index, slo) in lower.iter().enumerate() {
        for version_index in 0..num_versions {
            let value = insights.scalar_metric_value(version_index, &slo.metric)?;
            let satisfied = value.map(|v| v >= slo.limit).unwrap_or(false);
            insights.set_lower_satisfied(slo_index, version_index, satisfied);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_discriminator_is_fatal() {
        let value = serde_json::json!({ "task": "teleport" });
        let err = Task::parse(value).unwrap_err();
        assert!(matches!(err, EngineError::UnknownTask(_)));
    }

    #[test]
    fn missing_both_task_and_run_is_fatal() {
        let value = serde_json::json!({ "if": "SLOs()" });
        let err = Task::parse(value).unwrap_err();
        assert!(matches!(err, EngineError::MissingTaskKind));
    }

    #[test]
    fn conflicting_task_and_run_is_fatal() {
        let value = serde_json::json!({ "task": "ready", "run": "echo hi", "with": { "resource": "deploy/app" } });
        let err = Task::parse(value).unwrap_err();
        assert!(matches!(err, EngineError::ConflictingTaskKind));
    }

    #[test]
    fn inline_run_parses_without_with() {
        let value = serde_json::json!({ "run": "echo ok", "if": "SLOs()" });
        let task = Task::parse(value).unwrap();
        assert!(matches!(task.kind, TaskKind::InlineRun(ref s) if s == "echo ok"));
        assert_eq!(task.meta.if_predicate.as_deref(), Some("SLOs()"));
    }

    #[test]
    fn assess_parses_slo_limits() {
        let value = serde_json::json!({
            "task": "assess",
            "with": { "SLOs": { "upper": [{ "metric": "http/error-rate", "limit": 0.0 }] } }
        });
        let task = Task::parse(value).unwrap();
        match task.kind {
            TaskKind::Assess(inputs) => assert_eq!(inputs.slos.upper.len(), 1),
            _ => panic!("expected assess"),
        }
    }
}
