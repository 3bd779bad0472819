// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Experiment Engine
//!
//! Drives one revision of an experiment to completion: builds the
//! experiment from a driver, increments and persists the loop counter,
//! then walks the spec task by task — evaluating each task's `if`
//! predicate, running or skipping it, and persisting after every step. A
//! task failure latches `failure = true`, persists once more, and aborts
//! the remainder of this invocation; the external scheduler decides
//! whether and when to re-enter with `reuseResult = true`.

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::aggregates::experiment::Experiment;
use crate::error::EngineError;
use crate::repositories::driver::Driver;
use crate::services::ports::RunContext;
use crate::services::predicate;

/// Reads the current experiment artifact from `driver`.
pub async fn build(driver: &dyn Driver) -> Result<Experiment, EngineError> {
    driver.read().await
}

/// Runs `experiment` through one loop of its spec, persisting after the
/// loop-counter increment and after every task. Returns the final
/// experiment state, including on task failure (the caller inspects
/// `experiment.has_no_failure()` / `experiment.is_complete()`).
#[instrument(skip(experiment, driver, ctx), fields(revision))]
pub async fn run_experiment(
    mut experiment: Experiment,
    reuse_result: bool,
    driver: &dyn Driver,
    ctx: &RunContext<'_>,
) -> Result<Experiment, EngineError> {
    if !reuse_result {
        experiment.result = None;
    }

    let revision = driver.revision().await?;
    tracing::Span::current().record("revision", revision);
    experiment.init_results(revision, Utc::now());

    if let Some(result) = experiment.result_mut() {
        result.num_loops += 1;
    }
    driver.write(&experiment).await?;
    info!(num_loops = experiment.result().map(|r| r.num_loops).unwrap_or_default(), "loop started");

    let tasks = experiment.spec.tasks.clone();
    for (index, task) in tasks.iter().enumerate() {
        let should_run = match &task.meta.if_predicate {
            Some(raw_predicate) => predicate::evaluate(raw_predicate, &experiment)?,
            None => true,
        };

        if !should_run {
            info!(task_index = index, "task skipped by predicate");
            bump_completed_and_persist(&mut experiment, driver).await?;
            continue;
        }

        let mut runnable = task.clone();
        runnable.initialize_defaults();

        match runnable.run(&mut experiment, ctx).await {
            Ok(()) => {
                bump_completed_and_persist(&mut experiment, driver).await?;
            }
            Err(err) => {
                warn!(task_index = index, error = %err, "task failed");
                if let Some(result) = experiment.result_mut() {
                    result.failure = true;
                }
                driver.write(&experiment).await?;
                return Err(err);
            }
        }
    }

    info!(
        num_completed_tasks = experiment.result().map(|r| r.num_completed_tasks).unwrap_or_default(),
        "loop finished"
    );
    Ok(experiment)
}

async fn bump_completed_and_persist(experiment: &mut Experiment, driver: &dyn Driver) -> Result<(), EngineError> {
    if let Some(result) = experiment.result_mut() {
        result.num_completed_tasks += 1;
    }
    driver.write(experiment).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::experiment::Spec;
    use crate::entities::task::Task;
    use crate::services::ports::{
        GrpcLoadInputs, HttpLoadInputs, LoadGenerator, LoadGeneratorOutput, MetricQuery, MetricsProvider, ReadinessChecker, ScriptRunner,
    };
    use crate::value_objects::MetricValue;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    pub(super) struct InMemoryDriver {
        pub(super) revision: i64,
        pub(super) writes: Mutex<Vec<Experiment>>,
    }

    #[async_trait]
    impl Driver for InMemoryDriver {
        async fn read(&self) -> Result<Experiment, EngineError> {
            Ok(self.writes.lock().unwrap().last().cloned().unwrap_or_default())
        }
        async fn write(&self, experiment: &Experiment) -> Result<(), EngineError> {
            self.writes.lock().unwrap().push(experiment.clone());
            Ok(())
        }
        async fn revision(&self) -> Result<i64, EngineError> {
            Ok(self.revision)
        }
    }

    pub(super) struct NoopLoadGenerator;
    #[async_trait]
    impl LoadGenerator for NoopLoadGenerator {
        async fn run_http(&self, _inputs: &HttpLoadInputs) -> Result<LoadGeneratorOutput, EngineError> {
            Ok(LoadGeneratorOutput::default())
        }
        async fn run_grpc(&self, _inputs: &GrpcLoadInputs) -> Result<LoadGeneratorOutput, EngineError> {
            Ok(LoadGeneratorOutput::default())
        }
    }

    pub(super) struct NoopMetricsProvider;
    #[async_trait]
    impl MetricsProvider for NoopMetricsProvider {
        async fn query(&self, _backend: &str, _query: &MetricQuery, _version_index: usize) -> Result<MetricValue, EngineError> {
            Ok(MetricValue::Scalar(0.0))
        }
    }

    pub(super) struct NoopReadinessChecker;
    #[async_trait]
    impl ReadinessChecker for NoopReadinessChecker {
        async fn wait_ready(&self, _resource: &str, _timeout: Duration) -> Result<(), EngineError> {
            Ok(())
        }
    }

    pub(super) struct CountingScriptRunner {
        pub(super) runs: AtomicI64,
        pub(super) fail: bool,
    }
    #[async_trait]
    impl ScriptRunner for CountingScriptRunner {
        async fn run(&self, _script: &str) -> Result<(), EngineError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(EngineError::TaskFailed("script exited non-zero".to_string()))
            } else {
                Ok(())
            }
        }
    }

    pub(super) fn ctx<'a>(
        load_generator: &'a NoopLoadGenerator,
        metrics_provider: &'a NoopMetricsProvider,
        readiness_checker: &'a NoopReadinessChecker,
        script_runner: &'a CountingScriptRunner,
    ) -> RunContext<'a> {
        RunContext {
            load_generator,
            metrics_provider,
            readiness_checker,
            script_runner,
        }
    }

    #[tokio::test]
    async fn clean_run_completes_every_task() {
        let spec = Spec {
            tasks: vec![
                Task::parse(serde_json::json!({ "run": "echo one" })).unwrap(),
                Task::parse(serde_json::json!({ "run": "echo two" })).unwrap(),
            ],
        };
        let experiment = Experiment::new(spec);
        let driver = InMemoryDriver {
            revision: 1,
            writes: Mutex::new(vec![]),
        };
        let lg = NoopLoadGenerator;
        let mp = NoopMetricsProvider;
        let rc = NoopReadinessChecker;
        let sr = CountingScriptRunner {
            runs: AtomicI64::new(0),
            fail: false,
        };
        let run_ctx = ctx(&lg, &mp, &rc, &sr);

        let result = run_experiment(experiment, false, &driver, &run_ctx).await.unwrap();
        assert_eq!(result.result().unwrap().num_completed_tasks, 2);
        assert!(result.has_no_failure());
        assert!(result.is_complete());
        assert_eq!(sr.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn task_failure_latches_and_aborts() {
        let spec = Spec {
            tasks: vec![
                Task::parse(serde_json::json!({ "run": "false" })).unwrap(),
                Task::parse(serde_json::json!({ "run": "echo never" })).unwrap(),
            ],
        };
        let experiment = Experiment::new(spec);
        let driver = InMemoryDriver {
            revision: 1,
            writes: Mutex::new(vec![]),
        };
        let lg = NoopLoadGenerator;
        let mp = NoopMetricsProvider;
        let rc = NoopReadinessChecker;
        let sr = CountingScriptRunner {
            runs: AtomicI64::new(0),
            fail: true,
        };
        let run_ctx = ctx(&lg, &mp, &rc, &sr);

        let err = run_experiment(experiment, false, &driver, &run_ctx).await;
        assert!(err.is_err());
        assert_eq!(sr.runs.load(Ordering::SeqCst), 1);
        let last_write = driver.writes.lock().unwrap().last().cloned().unwrap();
        assert!(last_write.result().unwrap().failure);
        assert_eq!(last_write.result().unwrap().num_completed_tasks, 0);
    }

    #[tokio::test]
    async fn predicate_skip_still_counts_as_completed() {
        let spec = Spec {
            tasks: vec![Task::parse(serde_json::json!({ "run": "echo ok", "if": "SLOs()" })).unwrap()],
        };
        let experiment = Experiment::new(spec);
        let driver = InMemoryDriver {
            revision: 1,
            writes: Mutex::new(vec![]),
        };
        let lg = NoopLoadGenerator;
        let mp = NoopMetricsProvider;
        let rc = NoopReadinessChecker;
        let sr = CountingScriptRunner {
            runs: AtomicI64::new(0),
            fail: false,
        };
        let run_ctx = ctx(&lg, &mp, &rc, &sr);

        // no prior insights => SLOs() is false => task is skipped, not run.
        let result = run_experiment(experiment, false, &driver, &run_ctx).await.unwrap();
        assert_eq!(result.result().unwrap().num_completed_tasks, 1);
        assert_eq!(sr.runs.load(Ordering::SeqCst), 0);
    }
}
