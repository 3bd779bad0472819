// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cluster Secret Driver (contract stub)
//!
//! The concrete Kubernetes adaptor — storing `spec`/`result` as a pair of
//! secret keys — is an external collaborator, out of scope for this
//! crate (see the purpose-and-scope non-goals). This stub documents the
//! shape a real implementation would take without depending on a
//! Kubernetes client.

use async_trait::async_trait;
use slorun_domain::aggregates::Experiment;
use slorun_domain::error::EngineError;
use slorun_domain::repositories::Driver;

/// Identifies the secret a [`ClusterDriver`] would read/write.
#[derive(Debug, Clone)]
pub struct SecretRef {
    pub namespace: String,
    pub name: String,
}

/// Contract stub for a cluster-secret-backed driver. Every method returns
/// [`EngineError::Driver`] — wiring this up to a real Kubernetes client is
/// out of scope here; this type exists so callers can depend on the same
/// [`Driver`] trait regardless of backing store.
pub struct ClusterDriver {
    secret: SecretRef,
}

impl ClusterDriver {
    pub fn new(secret: SecretRef) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl Driver for ClusterDriver {
    async fn read(&self) -> Result<Experiment, EngineError> {
        Err(EngineError::Driver(format!(
            "cluster driver not implemented: {}/{}",
            self.secret.namespace, self.secret.name
        )))
    }

    async fn write(&self, _experiment: &Experiment) -> Result<(), EngineError> {
        Err(EngineError::Driver(format!(
            "cluster driver not implemented: {}/{}",
            self.secret.namespace, self.secret.name
        )))
    }

    async fn revision(&self) -> Result<i64, EngineError> {
        Err(EngineError::Driver(format!(
            "cluster driver not implemented: {}/{}",
            self.secret.namespace, self.secret.name
        )))
    }
}
