// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single hierarchical error type for the engine, following the error
//! kinds laid out for the system: parse errors, invariant violations,
//! predicate errors, and driver errors. Numeric errors (empty sample
//! aggregation, unparseable percentiles) are represented as `Option::None`
//! at the call site rather than as an `EngineError` variant, since the spec
//! treats them as absent values rather than failures.

use thiserror::Error;

/// Domain-specific errors for the experiment engine.
///
/// Each variant corresponds to one of the error kinds: parse errors are
/// fatal with no mutation, invariant violations fail the current task and
/// set `failure = true`, predicate errors are fatal for the whole
/// experiment, and driver errors are propagated unchanged.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Unknown task discriminator in a spec file.
    #[error("unknown task discriminator: {0}")]
    UnknownTask(String),

    /// A task declared neither `task` nor `run`.
    #[error("task must declare either `task` or `run`")]
    MissingTaskKind,

    /// A task declared both `task` and `run`.
    #[error("task cannot declare both `task` and `run`")]
    ConflictingTaskKind,

    /// A metric name could not be parsed or canonicalized.
    #[error("invalid metric name `{0}`: {1}")]
    InvalidMetricName(String, String),

    /// `updateMetric` was called with a value whose shape doesn't match the
    /// metric's registered (or implied) type.
    #[error("metric `{name}` has type {registered:?} but value implies {observed:?}")]
    MetricTypeMismatch {
        name: String,
        registered: crate::value_objects::MetricType,
        observed: crate::value_objects::MetricType,
    },

    /// A metric was registered twice with structurally different metadata.
    #[error("metric `{0}` re-registered with conflicting metadata")]
    MetricMetaConflict(String),

    /// `updateMetric` addressed a version index outside `0..numVersions`.
    #[error("version index {index} out of range (numVersions = {num_versions})")]
    VersionIndexOutOfRange { index: usize, num_versions: usize },

    /// `initInsightsWithNumVersions` was called twice with differing `n`.
    #[error("numVersions already set to {existing}, cannot reinitialize with {requested}")]
    VersionCountMismatch { existing: usize, requested: usize },

    /// `setSLOs` was called twice with structurally different limits.
    #[error("SLOs already set with conflicting limits")]
    SloConflict,

    /// A qualified metric name in an SLO or `scalarMetricValue` query did not
    /// resolve to a 2- or 3-segment canonical form, or resolved to a metric
    /// whose registered type is incompatible with how it was referenced.
    #[error("invalid qualified metric name `{0}`")]
    InvalidQualifiedName(String),

    /// `getMetricsInfo` was asked about a metric that was never registered.
    #[error("metric `{0}` not found")]
    MetricNotFound(String),

    /// Predicate compilation failed.
    #[error("predicate compile error: {0}")]
    PredicateCompile(String),

    /// Predicate evaluation failed, or did not produce a boolean.
    #[error("predicate evaluation error: {0}")]
    PredicateEval(String),

    /// A task's `run` returned failure (inline script non-zero exit, load
    /// generator error, readiness timeout, etc).
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// Propagated from the persistence driver, unchanged in meaning.
    #[error("driver error: {0}")]
    Driver(String),

    /// Serialization/deserialization of the artifact failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl EngineError {
    /// True for errors that are fatal for the whole experiment (predicate
    /// errors, parse errors) rather than scoped to the current task.
    pub fn is_experiment_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::PredicateCompile(_)
                | EngineError::PredicateEval(_)
                | EngineError::UnknownTask(_)
                | EngineError::MissingTaskKind
                | EngineError::ConflictingTaskKind
        )
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
