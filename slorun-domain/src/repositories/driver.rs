// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Persistence Driver Contract
//!
//! The engine reads and writes experiments through this trait only; it
//! never constructs a concrete driver. Implementations own artifact layout
//! and versioning — a local filesystem pair, a pair of cluster secret
//! keys, or an in-memory double for tests all satisfy the same contract.

use async_trait::async_trait;

use crate::aggregates::experiment::Experiment;
use crate::error::EngineError;

/// Persistence boundary for an experiment's spec+result artifact.
///
/// The engine calls `write` at minimum after incrementing the loop counter
/// and after each task completes (run, skip, or failure), regardless of
/// which — see the persist-after-each-task discipline in the engine loop.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Reads the current experiment artifact.
    async fn read(&self) -> Result<Experiment, EngineError>;

    /// Persists `experiment`, overwriting any prior artifact.
    async fn write(&self, experiment: &Experiment) -> Result<(), EngineError>;

    /// The current revision, stamped into a freshly created result.
    async fn revision(&self) -> Result<i64, EngineError>;
}
