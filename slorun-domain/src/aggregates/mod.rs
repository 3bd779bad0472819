// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Aggregates: the top-level owned objects the engine operates on.

pub mod experiment;

pub use experiment::{Experiment, ExperimentResult, Spec};
