// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Observation shapes a task can hand to the insights store.

use serde::{Deserialize, Serialize};

use super::MetricType;

/// A single bucket of a histogram-typed metric observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// The dynamic shape of a value a task reports for a metric.
///
/// `updateMetric` (§4.1) infers the implied `MetricType` from this shape
/// and checks it against the metric's registered type: a scalar float
/// implies counter-or-gauge, a float vector implies sample, and a bucket
/// vector implies histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Sample(Vec<f64>),
    Histogram(Vec<HistogramBucket>),
}

impl MetricValue {
    /// The metric types this value's shape is compatible with. A scalar is
    /// compatible with either counter or gauge; the caller's registered (or
    /// newly-declared) type disambiguates between the two.
    pub fn compatible_types(&self) -> &'static [MetricType] {
        match self {
            MetricValue::Scalar(_) => &[MetricType::Counter, MetricType::Gauge],
            MetricValue::Sample(_) => &[MetricType::Sample],
            MetricValue::Histogram(_) => &[MetricType::Histogram],
        }
    }

    pub fn matches_type(&self, metric_type: MetricType) -> bool {
        self.compatible_types().contains(&metric_type)
    }
}
