// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Configuration
//!
//! Layered configuration for the `run` subcommand: an optional config
//! file (YAML/TOML/JSON, detected by extension), overridden by `SLORUN_*`
//! environment variables, overridden last by explicit CLI flags. The
//! layering itself is handled by the `config` crate; this module only
//! defines the shape and the merge entry point.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which [`slorun_domain::repositories::Driver`] implementation to wire up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    LocalFile,
    Memory,
}

impl Default for DriverKind {
    fn default() -> Self {
        DriverKind::LocalFile
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

/// Resolved configuration for one `run` invocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub driver: DriverKind,
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default)]
    pub reuse_result: bool,
    /// Overrides the driver's own revision counter when set, instead of
    /// letting it auto-increment.
    #[serde(default)]
    pub revision: Option<i64>,
    /// How many loops to run before exiting; `None` means one loop, the
    /// same behavior as before this field existed.
    #[serde(default)]
    pub loops: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::default(),
            directory: default_directory(),
            reuse_result: false,
            revision: None,
            loops: None,
        }
    }
}

/// Loads configuration from an optional file plus the `SLORUN_` environment
/// prefix. A missing config file is not an error — defaults apply.
pub fn load(config_file: Option<&std::path::Path>) -> Result<EngineConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = config_file {
        builder = builder.add_source(config::File::from(path).required(true));
    } else {
        builder = builder.add_source(config::File::with_name("slorun").required(false));
    }

    builder
        .add_source(config::Environment::with_prefix("SLORUN").separator("_"))
        .build()?
        .try_deserialize()
}
