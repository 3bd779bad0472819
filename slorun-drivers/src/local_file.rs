// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Local Filesystem Driver
//!
//! Conventional layout: `experiment.yaml` holds the spec (a YAML/JSON list
//! of raw task values), `result.yaml` holds the result object, and
//! `revision` holds a single integer counter bumped on every call to
//! `revision()` — standing in for whatever stamps a new invocation cohort
//! in a scheduled deployment. Reads accept either YAML or JSON (JSON is a
//! YAML subset, so a single `serde_yaml` pass handles both); writes always
//! emit canonical YAML.
//!
//! When `experiment.yaml` is absent, `read` falls back to a single combined
//! `artifact.yaml` holding both `spec` and `result` — the same shape
//! [`Artifact`] already round-trips, just in one file instead of two. This
//! is a read-only convenience for artifacts produced elsewhere; `write`
//! always emits the conventional pair.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use slorun_domain::aggregates::Experiment;
use slorun_domain::error::EngineError;
use slorun_domain::repositories::Driver;
use tracing::debug;

use crate::artifact::Artifact;

const SPEC_FILE: &str = "experiment.yaml";
const RESULT_FILE: &str = "result.yaml";
const REVISION_FILE: &str = "revision";
const ARTIFACT_FILE: &str = "artifact.yaml";

/// A [`Driver`] backed by a directory of conventional files.
pub struct LocalFileDriver {
    dir: PathBuf,
}

impl LocalFileDriver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

async fn read_yaml_or_json<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T, EngineError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => serde_yaml::from_str(&contents).map_err(|err| EngineError::Serialization(err.to_string())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(err) => Err(EngineError::Driver(err.to_string())),
    }
}

#[async_trait]
impl Driver for LocalFileDriver {
    async fn read(&self) -> Result<Experiment, EngineError> {
        let spec_path = self.path(SPEC_FILE);
        if !matches!(tokio::fs::try_exists(&spec_path).await, Ok(true)) {
            let artifact_path = self.path(ARTIFACT_FILE);
            if matches!(tokio::fs::try_exists(&artifact_path).await, Ok(true)) {
                let artifact: Artifact = read_yaml_or_json(&artifact_path).await?;
                debug!(dir = %self.dir.display(), "read combined experiment artifact");
                return artifact.into_experiment();
            }
        }

        let spec: Vec<serde_json::Value> = read_yaml_or_json(&spec_path).await?;
        let result = read_yaml_or_json(&self.path(RESULT_FILE)).await?;
        debug!(dir = %self.dir.display(), "read experiment artifact");
        Artifact { spec, result }.into_experiment()
    }

    async fn write(&self, experiment: &Experiment) -> Result<(), EngineError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| EngineError::Driver(err.to_string()))?;

        let artifact = Artifact::from_experiment(experiment);
        let spec_yaml = serde_yaml::to_string(&artifact.spec).map_err(|err| EngineError::Serialization(err.to_string()))?;
        tokio::fs::write(self.path(SPEC_FILE), spec_yaml)
            .await
            .map_err(|err| EngineError::Driver(err.to_string()))?;

        if let Some(result) = &artifact.result {
            let result_yaml = serde_yaml::to_string(result).map_err(|err| EngineError::Serialization(err.to_string()))?;
            tokio::fs::write(self.path(RESULT_FILE), result_yaml)
                .await
                .map_err(|err| EngineError::Driver(err.to_string()))?;
        }

        debug!(dir = %self.dir.display(), "wrote experiment artifact");
        Ok(())
    }

    async fn revision(&self) -> Result<i64, EngineError> {
        let path = self.path(REVISION_FILE);
        let current: i64 = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents.trim().parse().unwrap_or(0),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => 0,
            Err(err) => return Err(EngineError::Driver(err.to_string())),
        };
        let next = current + 1;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| EngineError::Driver(err.to_string()))?;
        tokio::fs::write(&path, next.to_string())
            .await
            .map_err(|err| EngineError::Driver(err.to_string()))?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slorun_domain::aggregates::Spec;
    use slorun_domain::entities::task::Task;

    #[tokio::test]
    async fn round_trips_spec_and_result() {
        let dir = tempfile::tempdir().unwrap();
        let driver = LocalFileDriver::new(dir.path());

        let revision = driver.revision().await.unwrap();
        assert_eq!(revision, 1);

        let mut experiment = Experiment::new(Spec {
            tasks: vec![Task::parse(serde_json::json!({ "run": "echo hi" })).unwrap()],
        });
        experiment.init_results(revision, chrono::Utc::now());
        driver.write(&experiment).await.unwrap();

        let reloaded = driver.read().await.unwrap();
        assert_eq!(reloaded.spec.tasks.len(), 1);
        assert_eq!(reloaded.result().unwrap().revision, 1);
    }

    #[tokio::test]
    async fn read_on_empty_directory_is_empty_experiment() {
        let dir = tempfile::tempdir().unwrap();
        let driver = LocalFileDriver::new(dir.path());
        let experiment = driver.read().await.unwrap();
        assert!(experiment.spec.tasks.is_empty());
        assert!(experiment.result().is_none());
    }

    #[tokio::test]
    async fn accepts_json_input_on_read() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(SPEC_FILE), r#"[{"run": "echo hi"}]"#).await.unwrap();
        let driver = LocalFileDriver::new(dir.path());
        let experiment = driver.read().await.unwrap();
        assert_eq!(experiment.spec.tasks.len(), 1);
    }

    #[tokio::test]
    async fn reads_combined_artifact_when_conventional_pair_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join(ARTIFACT_FILE),
            r#"spec:
  - run: echo hi
result:
  revision: 3
  startTime: "2025-01-01T00:00:00Z"
  numLoops: 1
  numCompletedTasks: 1
  failure: false
  iter8Version: "0.1.0"
"#,
        )
        .await
        .unwrap();

        let driver = LocalFileDriver::new(dir.path());
        let experiment = driver.read().await.unwrap();
        assert_eq!(experiment.spec.tasks.len(), 1);
        assert_eq!(experiment.result().unwrap().revision, 3);
    }

    #[tokio::test]
    async fn conventional_pair_takes_priority_over_combined_artifact() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(SPEC_FILE), r#"[{"run": "echo conventional"}]"#)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join(ARTIFACT_FILE), "spec:\n  - run: echo combined\n").await.unwrap();

        let driver = LocalFileDriver::new(dir.path());
        let experiment = driver.read().await.unwrap();
        assert_eq!(experiment.spec.tasks.len(), 1);
    }

    #[tokio::test]
    async fn revision_increments_on_each_call() {
        let dir = tempfile::tempdir().unwrap();
        let driver = LocalFileDriver::new(dir.path());
        assert_eq!(driver.revision().await.unwrap(), 1);
        assert_eq!(driver.revision().await.unwrap(), 2);
        assert_eq!(driver.revision().await.unwrap(), 3);
    }
}
