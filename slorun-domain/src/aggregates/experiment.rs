// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Experiment Aggregate
//!
//! `Experiment` owns a spec (ordered tasks) and a result (loop counters,
//! failure flag, insights). A driver reference is attached at run start by
//! the engine and is never part of the serialized artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::insights::Insights;
use crate::entities::task::Task;

/// The mutable run state of an experiment within one revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub revision: i64,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "numLoops", default)]
    pub num_loops: u64,
    #[serde(rename = "numCompletedTasks", default)]
    pub num_completed_tasks: u64,
    #[serde(default)]
    pub failure: bool,
    #[serde(rename = "iter8Version")]
    pub iter8_version: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub insights: Option<Insights>,
}

impl ExperimentResult {
    pub fn new(revision: i64, start_time: DateTime<Utc>) -> Self {
        Self {
            revision,
            start_time,
            num_loops: 0,
            num_completed_tasks: 0,
            failure: false,
            iter8_version: env!("CARGO_PKG_VERSION").to_string(),
            insights: None,
        }
    }
}

/// Parsed spec: an ordered sequence of tasks, read once from the artifact.
#[derive(Debug, Clone, Default)]
pub struct Spec {
    pub tasks: Vec<Task>,
}

/// The experiment aggregate: a spec plus the mutable result it accumulates
/// as the engine runs it. Not itself serialized — [`crate::repositories::driver::Driver`]
/// implementations are responsible for the spec/result artifact split.
#[derive(Debug, Clone, Default)]
pub struct Experiment {
    pub spec: Spec,
    pub result: Option<ExperimentResult>,
}

impl Experiment {
    pub fn new(spec: Spec) -> Self {
        Self { spec, result: None }
    }

    /// Creates the result record for `revision` if one doesn't already
    /// exist (first run), or leaves it untouched when `reuseResult` carried
    /// a prior result forward across loops.
    pub fn init_results(&mut self, revision: i64, now: DateTime<Utc>) {
        if self.result.is_none() {
            self.result = Some(ExperimentResult::new(revision, now));
        }
    }

    pub fn result(&self) -> Option<&ExperimentResult> {
        self.result.as_ref()
    }

    pub fn result_mut(&mut self) -> Option<&mut ExperimentResult> {
        self.result.as_mut()
    }

    pub fn insights(&self) -> Option<&Insights> {
        self.result.as_ref().and_then(|r| r.insights.as_ref())
    }

    /// Mutable insights accessor, allocating an empty `Insights` the first
    /// time a task needs to write to it. Panics if called before
    /// `init_results` — the engine always calls `init_results` before
    /// running any task.
    pub fn insights_mut(&mut self) -> &mut Insights {
        let result = self.result.as_mut().expect("init_results must run before any task");
        result.insights.get_or_insert_with(Insights::new)
    }

    /// `SLOs()` as called from predicates and the assess no-failure check:
    /// delegates to the insights store, defaulting to `false` with no
    /// insights allocated yet (equivalent to zero versions).
    pub fn slos_satisfied_overall(&self) -> bool {
        self.insights().map(|i| i.slos_satisfied_overall()).unwrap_or(false)
    }

    /// `len(spec) == numCompletedTasks` completion predicate.
    pub fn is_complete(&self) -> bool {
        self.result
            .as_ref()
            .map(|r| r.num_completed_tasks as usize == self.spec.tasks.len())
            .unwrap_or(false)
    }

    /// `result != nil && !failure` no-failure predicate.
    pub fn has_no_failure(&self) -> bool {
        self.result.as_ref().map(|r| !r.failure).unwrap_or(false)
    }
}
