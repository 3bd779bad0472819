// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Driver
//!
//! A test double that records every write for later assertion, and serves
//! `read()` from the most recently written state (or an empty experiment
//! if nothing has been written yet).

use std::sync::Mutex;

use async_trait::async_trait;
use slorun_domain::aggregates::Experiment;
use slorun_domain::error::EngineError;
use slorun_domain::repositories::Driver;

use crate::artifact::Artifact;

/// Round-trips through [`Artifact`] on every write, the same as the file
/// and cluster drivers, so its tests exercise the identical encode/decode
/// path used in production.
pub struct InMemoryDriver {
    state: Mutex<Vec<Artifact>>,
    revision: Mutex<i64>,
}

impl InMemoryDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Vec::new()),
            revision: Mutex::new(0),
        }
    }

    /// All artifacts ever written, oldest first, for test assertions.
    pub fn writes(&self) -> Vec<Experiment> {
        self.state
            .lock()
            .unwrap()
            .iter()
            .map(|artifact| Artifact {
                spec: artifact.spec.clone(),
                result: artifact.result.clone(),
            })
            .map(|artifact| artifact.into_experiment().expect("round-tripped artifact always parses"))
            .collect()
    }
}

impl Default for InMemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for InMemoryDriver {
    async fn read(&self) -> Result<Experiment, EngineError> {
        let state = self.state.lock().unwrap();
        match state.last() {
            Some(artifact) => Artifact {
                spec: artifact.spec.clone(),
                result: artifact.result.clone(),
            }
            .into_experiment(),
            None => Ok(Experiment::default()),
        }
    }

    async fn write(&self, experiment: &Experiment) -> Result<(), EngineError> {
        self.state.lock().unwrap().push(Artifact::from_experiment(experiment));
        Ok(())
    }

    async fn revision(&self) -> Result<i64, EngineError> {
        let mut revision = self.revision.lock().unwrap();
        *revision += 1;
        Ok(*revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slorun_domain::aggregates::Spec;

    #[tokio::test]
    async fn records_every_write() {
        let driver = InMemoryDriver::new();
        let mut experiment = Experiment::new(Spec::default());
        let revision = driver.revision().await.unwrap();
        experiment.init_results(revision, chrono::Utc::now());

        driver.write(&experiment).await.unwrap();
        if let Some(result) = experiment.result_mut() {
            result.num_loops += 1;
        }
        driver.write(&experiment).await.unwrap();

        assert_eq!(driver.writes().len(), 2);
        assert_eq!(driver.writes()[1].result().unwrap().num_loops, 1);
    }

    #[tokio::test]
    async fn read_before_any_write_is_empty() {
        let driver = InMemoryDriver::new();
        let experiment = driver.read().await.unwrap();
        assert!(experiment.spec.tasks.is_empty());
    }
}
