// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Metric type and metadata value objects.

use serde::{Deserialize, Serialize};

/// The four metric shapes the insights store understands.
///
/// `Counter` and `Gauge` metrics store a single float observation per
/// update; `Sample` metrics store a vector of observations that the
/// aggregator (§4.3) summarizes; `Histogram` metrics store bucket counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    Sample,
    Histogram,
}

/// Metadata registered for a canonical metric name the first time it is
/// observed. Subsequent registrations must be structurally equal to this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricMeta {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
}

impl MetricMeta {
    pub fn new(description: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            description: description.into(),
            units: None,
            metric_type,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }
}
