// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metric Name Normalizer
//!
//! A canonical metric name is `backend/name` for a registered metric, or
//! `backend/name/aggregator` for a virtual aggregated reading over a sample
//! metric. This module canonicalizes percentile-suffixed builtin names and
//! splits qualified names into their registered-vs-aggregated forms.

use crate::error::EngineError;

const HTTP_PERCENTILE_PREFIX: &str = "http/latency-p";
const GRPC_PERCENTILE_PREFIX: &str = "grpc/latency/p";

/// A name that has been through percentile canonicalization, split into
/// either its registered 2-segment form or its 3-segment aggregated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifiedMetricName {
    /// `backend/name` — a directly registered metric.
    Registered { backend: String, name: String },
    /// `backend/name/aggregator` — a virtual reading computed on demand
    /// over the sample metric `backend/name`.
    Aggregated {
        backend: String,
        name: String,
        aggregator: String,
    },
}

impl QualifiedMetricName {
    /// The 2-segment canonical form of the base metric, dropping the
    /// aggregator segment if present.
    pub fn canonical_base(&self) -> String {
        match self {
            QualifiedMetricName::Registered { backend, name } => format!("{backend}/{name}"),
            QualifiedMetricName::Aggregated { backend, name, .. } => format!("{backend}/{name}"),
        }
    }
}

/// Canonicalizes a raw metric name by reformatting a builtin percentile
/// suffix without trailing zeros (`p95.00` -> `p95`). Names that don't carry
/// one of the two recognized percentile prefixes pass through unchanged.
///
/// Un-parseable trailing tokens on a recognized prefix are a fatal parse
/// error.
pub fn canonicalize(name: &str) -> Result<String, EngineError> {
    if let Some(rest) = name.strip_prefix(HTTP_PERCENTILE_PREFIX) {
        let formatted = format_percentile(name, rest)?;
        return Ok(format!("{HTTP_PERCENTILE_PREFIX}{formatted}"));
    }
    if let Some(rest) = name.strip_prefix(GRPC_PERCENTILE_PREFIX) {
        let formatted = format_percentile(name, rest)?;
        return Ok(format!("{GRPC_PERCENTILE_PREFIX}{formatted}"));
    }
    Ok(name.to_string())
}

fn format_percentile(original: &str, trailing: &str) -> Result<String, EngineError> {
    let value: f64 = trailing
        .parse()
        .map_err(|_| EngineError::InvalidMetricName(original.to_string(), format!("unparseable percentile `{trailing}`")))?;
    Ok(trim_float(value))
}

/// Formats a float without trailing zeros, e.g. `95.0 -> "95"`, `95.5 ->
/// "95.5"`.
fn trim_float(value: f64) -> String {
    format!("{value}")
}

/// Splits a canonicalized qualified name into its registered or aggregated
/// form. Names with any segment count other than 2 or 3 are a fatal parse
/// error.
pub fn parse_qualified(name: &str) -> Result<QualifiedMetricName, EngineError> {
    let canonical = canonicalize(name)?;
    let segments: Vec<&str> = canonical.split('/').collect();
    match segments.as_slice() {
        [backend, metric_name] => Ok(QualifiedMetricName::Registered {
            backend: backend.to_string(),
            name: metric_name.to_string(),
        }),
        [backend, metric_name, aggregator] => Ok(QualifiedMetricName::Aggregated {
            backend: backend.to_string(),
            name: metric_name.to_string(),
            aggregator: aggregator.to_string(),
        }),
        _ => Err(EngineError::InvalidQualifiedName(name.to_string())),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn http_percentile_normalization_is_idempotent(p in 0.01..100.0f64) {
            let name = format!("http/latency-p{p}");
            let once = canonicalize(&name).unwrap();
            let twice = canonicalize(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn grpc_percentile_normalization_is_idempotent(p in 0.01..100.0f64) {
            let name = format!("grpc/latency/p{p}");
            let once = canonicalize(&name).unwrap();
            let twice = canonicalize(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn passthrough_names_are_idempotent(backend in "[a-z]{2,8}", name in "[a-z_]{2,12}") {
            let raw = format!("{backend}/{name}");
            let once = canonicalize(&raw).unwrap();
            let twice = canonicalize(&once).unwrap();
            prop_assert_eq!(once.clone(), twice);
            prop_assert_eq!(once, raw);
        }
    }
}
