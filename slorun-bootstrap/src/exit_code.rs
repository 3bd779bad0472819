// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Mapping
//!
//! Maps [`EngineError`] and CLI-level failures onto the `sysexits.h`
//! convention so a scheduler invoking `slorun` as a process can distinguish
//! "bad input" from "environment problem" from "internal bug" without
//! parsing stderr.

use slorun_domain::EngineError;

/// A `sysexits.h`-style process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// EX_DATAERR: malformed input data (parse errors, bad spec).
    DataErr = 65,
    /// EX_UNAVAILABLE: a required external service didn't respond in time.
    Unavailable = 69,
    /// EX_SOFTWARE: an internal invariant was violated.
    Software = 70,
    /// EX_IOERR: the persistence driver failed.
    IoErr = 74,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Maps an [`EngineError`] to the exit code a scheduler should observe.
///
/// `is_experiment_fatal` is the one source of truth for which variants
/// abort the whole experiment rather than just the current task; this
/// function only adds exit-code granularity on top of that split.
pub fn map_engine_error(err: &EngineError) -> ExitCode {
    if err.is_experiment_fatal() {
        return match err {
            EngineError::PredicateCompile(_) | EngineError::PredicateEval(_) => ExitCode::Software,
            _ => ExitCode::DataErr,
        };
    }

    match err {
        EngineError::InvalidMetricName(_, _) | EngineError::InvalidQualifiedName(_) | EngineError::MetricNotFound(_) | EngineError::Serialization(_) => {
            ExitCode::DataErr
        }

        EngineError::MetricTypeMismatch { .. }
        | EngineError::MetricMetaConflict(_)
        | EngineError::VersionIndexOutOfRange { .. }
        | EngineError::VersionCountMismatch { .. }
        | EngineError::SloConflict => ExitCode::Software,

        EngineError::TaskFailed(_) => ExitCode::Unavailable,
        EngineError::Driver(_) => ExitCode::IoErr,

        EngineError::UnknownTask(_) | EngineError::MissingTaskKind | EngineError::ConflictingTaskKind | EngineError::PredicateCompile(_) | EngineError::PredicateEval(_) => {
            unreachable!("handled by the is_experiment_fatal branch above")
        }
    }
}

/// Converts a `Result<(), EngineError>` to a process exit code for `main`.
pub fn result_to_exit_code(result: Result<(), EngineError>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(err) => map_engine_error(&err).into(),
    }
}
