// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SLO limit value objects.

use serde::{Deserialize, Serialize};

/// A single limit on a scalar metric, evaluated per version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slo {
    pub metric: String,
    pub limit: f64,
}

/// The upper and lower SLO limits configured for an experiment. Once set on
/// an `Insights`, a later `setSLOs` call must supply a structurally equal
/// set or it is a conflict error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SloSet {
    #[serde(default)]
    pub upper: Vec<Slo>,
    #[serde(default)]
    pub lower: Vec<Slo>,
}

impl SloSet {
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty() && self.lower.is_empty()
    }
}
