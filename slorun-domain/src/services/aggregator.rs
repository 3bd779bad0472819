// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sample Aggregator
//!
//! Computes scalar summaries (`mean`, `stddev`, `min`, `max`, `count`, `pXX`)
//! over a sample metric's observation vector. An empty sample always yields
//! `None` ("absent"); a single-observation sample collapses every
//! positional aggregator to that one value.
//!
//! The `max` aggregator is computed as a true maximum. The source this
//! system is derived from is known to route `max` through the same code
//! path as `mean` — that's a bug in the source, not a behavior to
//! reproduce.

/// Computes the named aggregator over `observations`.
///
/// Returns `None` when `observations` is empty, or when `aggregator` names
/// a percentile whose trailing token doesn't parse as a float.
pub fn aggregate(observations: &[f64], aggregator: &str) -> Option<f64> {
    if observations.is_empty() {
        return None;
    }

    if observations.len() == 1 {
        // Every positional aggregator collapses to the single observation;
        // `count` is the one exception, since it isn't positional.
        if aggregator == "count" {
            return Some(1.0);
        }
        if is_percentile(aggregator).is_some() || matches!(aggregator, "mean" | "stddev" | "min" | "max") {
            return Some(observations[0]);
        }
    }

    match aggregator {
        "mean" => Some(mean(observations)),
        "stddev" => Some(stddev(observations)),
        "min" => observations.iter().copied().fold(f64::INFINITY, f64::min).into(),
        "max" => observations.iter().copied().fold(f64::NEG_INFINITY, f64::max).into(),
        "count" => Some(observations.len() as f64),
        other => is_percentile(other).map(|p| percentile(observations, p)),
    }
}

fn mean(observations: &[f64]) -> f64 {
    observations.iter().sum::<f64>() / observations.len() as f64
}

fn stddev(observations: &[f64]) -> f64 {
    let m = mean(observations);
    let variance = observations.iter().map(|v| (v - m).powi(2)).sum::<f64>() / observations.len() as f64;
    variance.sqrt()
}

/// Parses a `p<X>` aggregator token into its percentage, `0 < X <= 100`.
/// Returns `None` if the token isn't a percentile aggregator at all (no `p`
/// prefix), leaving the caller free to treat it as an unknown aggregator.
fn is_percentile(aggregator: &str) -> Option<f64> {
    let trailing = aggregator.strip_prefix('p')?;
    let value: f64 = trailing.parse().ok()?;
    if value > 0.0 && value <= 100.0 {
        Some(value)
    } else {
        None
    }
}

/// Nearest-rank percentile over a sorted copy of `observations`.
fn percentile(observations: &[f64], percent: f64) -> f64 {
    let mut sorted = observations.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("NaN observation"));

    if percent >= 100.0 {
        return *sorted.last().unwrap();
    }
    if percent <= 0.0 {
        return sorted[0];
    }

    let rank = (percent / 100.0 * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_is_absent() {
        assert_eq!(aggregate(&[], "mean"), None);
        assert_eq!(aggregate(&[], "p95"), None);
    }

    #[test]
    fn single_observation_collapses() {
        assert_eq!(aggregate(&[42.0], "mean"), Some(42.0));
        assert_eq!(aggregate(&[42.0], "max"), Some(42.0));
        assert_eq!(aggregate(&[42.0], "p99"), Some(42.0));
        assert_eq!(aggregate(&[42.0], "count"), Some(1.0));
    }

    #[test]
    fn mean_matches_definition() {
        let vs = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(aggregate(&vs, "mean"), Some(2.5));
    }

    #[test]
    fn max_is_true_max_not_mean() {
        let vs = [1.0, 2.0, 100.0];
        assert_eq!(aggregate(&vs, "max"), Some(100.0));
    }

    #[test]
    fn percentile_bounds() {
        let vs = [5.0, 1.0, 9.0, 3.0, 7.0];
        let p100 = aggregate(&vs, "p100").unwrap();
        let p0 = aggregate(&vs, "p0").unwrap();
        let max = vs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = vs.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(p100 >= max);
        assert!(p0 <= min);
    }

    #[test]
    fn count_is_integer_as_float() {
        let vs = [1.0, 2.0, 3.0];
        assert_eq!(aggregate(&vs, "count"), Some(3.0));
    }

    #[test]
    fn unparseable_percentile_is_absent() {
        assert_eq!(aggregate(&[1.0, 2.0], "pfoo"), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn finite_observations() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-1_000_000.0..1_000_000.0f64, 1..50)
    }

    proptest! {
        #[test]
        fn mean_matches_sum_over_len(vs in finite_observations()) {
            let mean = aggregate(&vs, "mean").unwrap();
            let expected = vs.iter().sum::<f64>() / vs.len() as f64;
            prop_assert!((mean - expected).abs() < 1e-6);
        }

        #[test]
        fn p100_is_at_least_max_and_p0_at_most_min(vs in finite_observations()) {
            let max = vs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = vs.iter().copied().fold(f64::INFINITY, f64::min);
            let p100 = aggregate(&vs, "p100").unwrap();
            let p0 = aggregate(&vs, "p0").unwrap();
            prop_assert!(p100 >= max);
            prop_assert!(p0 <= min);
        }

        #[test]
        fn max_is_never_less_than_any_observation(vs in finite_observations()) {
            let max = aggregate(&vs, "max").unwrap();
            for v in &vs {
                prop_assert!(max >= *v);
            }
        }
    }
}
