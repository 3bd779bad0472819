// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # slorun-domain
//!
//! The experiment engine at the core of slorun: task sequencing, the
//! insights data model, SLO evaluation, the embedded predicate language,
//! and the abstract persistence driver contract. This crate has no
//! knowledge of YAML/TOML artifact formats, network transports, or
//! process execution — those live at the edges, in `slorun-drivers` and
//! whatever ports a caller supplies to [`services::engine::run_experiment`].

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use aggregates::{Experiment, ExperimentResult, Spec};
pub use entities::{Insights, Task, TaskKind, TaskMeta};
pub use error::EngineError;
pub use repositories::Driver;
