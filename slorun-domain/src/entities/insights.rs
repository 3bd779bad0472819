// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Insights Store
//!
//! `Insights` is the tree-shaped aggregate that holds everything a
//! sequence of tasks has observed about an experiment: registered metric
//! metadata, per-version observation vectors, SLO limits, and the SLO
//! satisfaction matrices an `assess` task fills in. It has no cycles and no
//! shared ownership — the owning `Experiment` is its sole owner, and every
//! method either returns an owned/borrowed value or mutates `self` in
//! place.
//!
//! ## Invariants enforced here
//!
//! 1. `nonHistMetricValues.len() == histMetricValues.len() == numVersions`
//!    once metrics are initialized.
//! 2. A metric name appears in exactly one of the two value stores,
//!    consistent with its registered type.
//! 3. Percentile-bearing metric names are stored in canonical form.
//! 4. `SLOsSatisfied` rows match `SLOs` row counts and column counts match
//!    `numVersions`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::services::aggregator;
use crate::value_objects::{
    canonicalize, parse_qualified, HistogramBucket, MetricMeta, MetricType, MetricValue, QualifiedMetricName, Slo, SloSet,
};

/// Per-SLO, per-version satisfaction matrices filled in by the `assess`
/// task. `upper[k][j]` is whether version `j` satisfies upper SLO `k`;
/// symmetrically for `lower`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SloSatisfaction {
    #[serde(default)]
    pub upper: Vec<Vec<bool>>,
    #[serde(default)]
    pub lower: Vec<Vec<bool>>,
}

/// The accumulated metrics, SLOs, and satisfaction state for an experiment
/// run. See the module docs for the invariants this type enforces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Insights {
    #[serde(rename = "numVersions", default)]
    num_versions: usize,
    #[serde(rename = "metricsInfo", default)]
    metrics_info: HashMap<String, MetricMeta>,
    #[serde(rename = "nonHistMetricValues", default)]
    non_hist_metric_values: Vec<HashMap<String, Vec<f64>>>,
    #[serde(rename = "histMetricValues", default)]
    hist_metric_values: Vec<HashMap<String, Vec<HistogramBucket>>>,
    #[serde(rename = "SLOs", skip_serializing_if = "Option::is_none", default)]
    slos: Option<SloSet>,
    #[serde(rename = "SLOsSatisfied", skip_serializing_if = "Option::is_none", default)]
    slos_satisfied: Option<SloSatisfaction>,
}

impl Insights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_versions(&self) -> usize {
        self.num_versions
    }

    pub fn metrics_info(&self) -> &HashMap<String, MetricMeta> {
        &self.metrics_info
    }

    pub fn slos(&self) -> Option<&SloSet> {
        self.slos.as_ref()
    }

    pub fn slos_satisfied(&self) -> Option<&SloSatisfaction> {
        self.slos_satisfied.as_ref()
    }

    /// Allocates the per-version value stores. Idempotent when called again
    /// with the same `n`; an error when called with a differing `n`.
    pub fn init_with_num_versions(&mut self, n: usize) -> Result<(), EngineError> {
        if self.num_versions == 0 {
            self.num_versions = n;
            self.non_hist_metric_values = vec![HashMap::new(); n];
            self.hist_metric_values = vec![HashMap::new(); n];
            return Ok(());
        }
        if self.num_versions != n {
            return Err(EngineError::VersionCountMismatch {
                existing: self.num_versions,
                requested: n,
            });
        }
        Ok(())
    }

    fn check_version_index(&self, index: usize) -> Result<(), EngineError> {
        if index >= self.num_versions {
            return Err(EngineError::VersionIndexOutOfRange {
                index,
                num_versions: self.num_versions,
            });
        }
        Ok(())
    }

    /// Registers (or validates) `meta` for `name` and appends `value` to the
    /// appropriate per-version container for `version_index`.
    pub fn update_metric(
        &mut self,
        name: &str,
        meta: MetricMeta,
        version_index: usize,
        value: MetricValue,
    ) -> Result<(), EngineError> {
        self.check_version_index(version_index)?;

        let canonical = canonicalize(name)?;
        let qualified = parse_qualified(&canonical)?;
        let key = match qualified {
            QualifiedMetricName::Registered { backend, name } => format!("{backend}/{name}"),
            QualifiedMetricName::Aggregated { .. } => {
                return Err(EngineError::InvalidMetricName(
                    name.to_string(),
                    "updateMetric requires a 2-segment registered name".to_string(),
                ))
            }
        };

        if !value.matches_type(meta.metric_type) {
            return Err(EngineError::MetricTypeMismatch {
                name: key,
                registered: meta.metric_type,
                observed: value.compatible_types()[0],
            });
        }

        match self.metrics_info.get(&key) {
            Some(existing) if *existing != meta => return Err(EngineError::MetricMetaConflict(key)),
            Some(_) => {}
            None => {
                self.metrics_info.insert(key.clone(), meta.clone());
            }
        }

        match value {
            MetricValue::Scalar(v) => {
                self.non_hist_metric_values[version_index].entry(key).or_default().push(v);
            }
            MetricValue::Sample(vs) => {
                self.non_hist_metric_values[version_index].entry(key).or_default().extend(vs);
            }
            MetricValue::Histogram(buckets) => {
                self.hist_metric_values[version_index].entry(key).or_default().extend(buckets);
            }
        }

        Ok(())
    }

    /// Idempotent setter for the experiment's SLO limits. A later call with
    /// differing limits is a conflict error.
    pub fn set_slos(&mut self, limits: SloSet) -> Result<(), EngineError> {
        match &self.slos {
            None => {
                self.slos = Some(limits);
                Ok(())
            }
            Some(existing) if *existing == limits => Ok(()),
            Some(_) => Err(EngineError::SloConflict),
        }
    }

    /// Allocates `SLOsSatisfied` to match the shape of the currently set
    /// `SLOs`, called by the `assess` task before filling in cells.
    pub fn allocate_slo_satisfaction(&mut self) {
        let slos = self.slos.clone().unwrap_or_default();
        self.slos_satisfied = Some(SloSatisfaction {
            upper: vec![vec![false; self.num_versions]; slos.upper.len()],
            lower: vec![vec![false; self.num_versions]; slos.lower.len()],
        });
    }

    pub fn set_upper_satisfied(&mut self, slo_index: usize, version_index: usize, satisfied: bool) {
        if let Some(s) = &mut self.slos_satisfied {
            s.upper[slo_index][version_index] = satisfied;
        }
    }

    pub fn set_lower_satisfied(&mut self, slo_index: usize, version_index: usize, satisfied: bool) {
        if let Some(s) = &mut self.slos_satisfied {
            s.lower[slo_index][version_index] = satisfied;
        }
    }

    /// Resolves a scalar reading for `qualified_name` at `version_index`,
    /// per the resolution rules: a 2-segment name returns the last
    /// appended observation of a counter/gauge metric; a 3-segment name
    /// delegates to the sample aggregator over its 2-segment base.
    ///
    /// Returns `Ok(None)` when the metric was never registered or has no
    /// observations yet (an "absent" value per the numeric-errors policy,
    /// not a failure). Returns `Err` when the name is structurally
    /// incompatible with how it's being referenced (e.g. a 2-segment read
    /// of a sample metric).
    pub fn scalar_metric_value(&self, version_index: usize, qualified_name: &str) -> Result<Option<f64>, EngineError> {
        self.check_version_index(version_index)?;
        match parse_qualified(qualified_name)? {
            QualifiedMetricName::Registered { backend, name } => {
                let key = format!("{backend}/{name}");
                let Some(meta) = self.metrics_info.get(&key) else {
                    return Ok(None);
                };
                if !matches!(meta.metric_type, MetricType::Counter | MetricType::Gauge) {
                    return Err(EngineError::InvalidQualifiedName(qualified_name.to_string()));
                }
                Ok(self.non_hist_metric_values[version_index].get(&key).and_then(|v| v.last().copied()))
            }
            QualifiedMetricName::Aggregated { backend, name, aggregator: agg } => {
                let key = format!("{backend}/{name}");
                let Some(meta) = self.metrics_info.get(&key) else {
                    return Ok(None);
                };
                if meta.metric_type != MetricType::Sample {
                    return Err(EngineError::InvalidQualifiedName(qualified_name.to_string()));
                }
                let empty = Vec::new();
                let observations = self.non_hist_metric_values[version_index].get(&key).unwrap_or(&empty);
                Ok(aggregator::aggregate(observations, &agg))
            }
        }
    }

    /// Resolves metadata for `name`, which may be a 2-segment registered
    /// name or a 3-segment aggregated name. The aggregated form synthesizes
    /// a virtual meta: type `counter` when the aggregator is `count`,
    /// otherwise `gauge`, with a description derived from the base metric.
    pub fn get_metrics_info(&self, name: &str) -> Result<MetricMeta, EngineError> {
        match parse_qualified(name)? {
            QualifiedMetricName::Registered { backend, name } => {
                let key = format!("{backend}/{name}");
                self.metrics_info.get(&key).cloned().ok_or_else(|| EngineError::MetricNotFound(key))
            }
            QualifiedMetricName::Aggregated { backend, name, aggregator: agg } => {
                let key = format!("{backend}/{name}");
                let base = self
                    .metrics_info
                    .get(&key)
                    .ok_or_else(|| EngineError::MetricNotFound(key.clone()))?;
                let metric_type = if agg == "count" { MetricType::Counter } else { MetricType::Gauge };
                Ok(MetricMeta {
                    description: format!("{agg} of {}", base.description),
                    units: base.units.clone(),
                    metric_type,
                })
            }
        }
    }

    /// `SLOs()` as callable from predicates: `true` iff every version
    /// satisfies every configured SLO. Zero versions or no SLOs configured
    /// have the explicit contract documented on the method.
    pub fn slos_satisfied_overall(&self) -> bool {
        if self.num_versions == 0 {
            return false;
        }
        let Some(slos) = &self.slos else {
            return true;
        };
        if slos.is_empty() {
            return true;
        }
        let Some(satisfaction) = &self.slos_satisfied else {
            return false;
        };
        satisfaction.upper.iter().all(|row| row.iter().all(|&b| b))
            && satisfaction.lower.iter().all(|row| row.iter().all(|&b| b))
    }

    /// Raw accessor used by the `assess` task to iterate SLO definitions
    /// alongside their index for `set_upper_satisfied`/`set_lower_satisfied`.
    pub fn slo_definitions(&self) -> (Vec<Slo>, Vec<Slo>) {
        match &self.slos {
            Some(s) => (s.upper.clone(), s.lower.clone()),
            None => (Vec::new(), Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauge(desc: &str) -> MetricMeta {
        MetricMeta::new(desc, MetricType::Gauge)
    }

    #[test]
    fn init_with_num_versions_is_idempotent() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(2).unwrap();
        insights.init_with_num_versions(2).unwrap();
        assert_eq!(insights.num_versions(), 2);
    }

    #[test]
    fn init_with_differing_num_versions_errors() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(2).unwrap();
        assert!(insights.init_with_num_versions(3).is_err());
    }

    #[test]
    fn update_metric_then_scalar_read_round_trips() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(1).unwrap();
        insights
            .update_metric("http/error-rate", gauge("error rate"), 0, MetricValue::Scalar(0.02))
            .unwrap();
        assert_eq!(insights.scalar_metric_value(0, "http/error-rate").unwrap(), Some(0.02));
    }

    #[test]
    fn percentile_normalization_round_trip() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(1).unwrap();
        insights
            .update_metric("http/latency-p95.00", gauge("p95 latency"), 0, MetricValue::Scalar(12.5))
            .unwrap();
        assert_eq!(insights.scalar_metric_value(0, "http/latency-p95").unwrap(), Some(12.5));
    }

    #[test]
    fn conflicting_meta_is_an_error() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(1).unwrap();
        insights
            .update_metric("prom/requests", MetricMeta::new("reqs", MetricType::Counter), 0, MetricValue::Scalar(1.0))
            .unwrap();
        let err = insights.update_metric(
            "prom/requests",
            MetricMeta::new("reqs", MetricType::Gauge),
            0,
            MetricValue::Scalar(1.0),
        );
        assert!(err.is_err());
    }

    #[test]
    fn aggregated_read_over_sample_metric() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(1).unwrap();
        insights
            .update_metric(
                "grpc/latency",
                MetricMeta::new("latency", MetricType::Sample),
                0,
                MetricValue::Sample(vec![10.0, 20.0, 30.0]),
            )
            .unwrap();
        assert_eq!(insights.scalar_metric_value(0, "grpc/latency/mean").unwrap(), Some(20.0));
    }

    #[test]
    fn missing_metric_is_absent_not_error() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(1).unwrap();
        assert_eq!(insights.scalar_metric_value(0, "nope/nothing").unwrap(), None);
        assert_eq!(insights.scalar_metric_value(0, "nope/nothing/mean").unwrap(), None);
    }

    #[test]
    fn slos_zero_versions_is_false() {
        let insights = Insights::new();
        assert!(!insights.slos_satisfied_overall());
    }

    #[test]
    fn slos_no_slos_configured_is_true() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(1).unwrap();
        assert!(insights.slos_satisfied_overall());
    }

    #[test]
    fn set_slos_is_idempotent_but_conflict_errors() {
        let mut insights = Insights::new();
        let slos = SloSet {
            upper: vec![Slo {
                metric: "http/error-rate".to_string(),
                limit: 0.0,
            }],
            lower: vec![],
        };
        insights.set_slos(slos.clone()).unwrap();
        insights.set_slos(slos).unwrap();

        let different = SloSet {
            upper: vec![Slo {
                metric: "http/error-rate".to_string(),
                limit: 0.01,
            }],
            lower: vec![],
        };
        assert!(insights.set_slos(different).is_err());
    }

    #[test]
    fn get_metrics_info_aggregated_form() {
        let mut insights = Insights::new();
        insights.init_with_num_versions(1).unwrap();
        insights
            .update_metric(
                "prom/requests",
                MetricMeta::new("request count", MetricType::Sample),
                0,
                MetricValue::Sample(vec![1.0]),
            )
            .unwrap();
        let meta = insights.get_metrics_info("prom/requests/count").unwrap();
        assert_eq!(meta.metric_type, MetricType::Counter);
        let meta = insights.get_metrics_info("prom/requests/mean").unwrap();
        assert_eq!(meta.metric_type, MetricType::Gauge);
    }
}
