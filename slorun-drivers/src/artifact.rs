// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Artifact Shape
//!
//! The wire schema shared by every driver: a `spec` (list of raw task
//! values, each dispatched through [`Task::parse`]) and an optional
//! `result`. This is the one place format-specific (de)serialization
//! crosses into the domain's `Task`/`Experiment` types — the domain crate
//! itself stays agnostic of whether the bytes came from YAML or JSON.

use serde::{Deserialize, Serialize};
use slorun_domain::aggregates::{Experiment, ExperimentResult, Spec};
use slorun_domain::entities::task::Task;
use slorun_domain::error::EngineError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub spec: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<ExperimentResult>,
}

impl Artifact {
    pub fn from_experiment(experiment: &Experiment) -> Self {
        Artifact {
            spec: experiment.spec.tasks.iter().map(Task::to_raw_value).collect(),
            result: experiment.result.clone(),
        }
    }

    pub fn into_experiment(self) -> Result<Experiment, EngineError> {
        let tasks = self.spec.into_iter().map(Task::parse).collect::<Result<Vec<_>, _>>()?;
        Ok(Experiment {
            spec: Spec { tasks },
            result: self.result,
        })
    }
}
