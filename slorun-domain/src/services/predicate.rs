// /////////////////////////////////////////////////////////////////////////////
// slorun
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Conditional Task Predicate Evaluator
//!
//! Compiles and evaluates the `if` string carried by a task against a
//! read-only view of the experiment, using `rhai` as the embedded
//! expression language. `SLOs()` is exposed as a native function; the
//! experiment's other readable fields are exposed as scope variables.
//! Compile and evaluation failures are both fatal for the experiment —
//! a predicate that can't be understood must never be silently treated as
//! `false`.

use rhai::{Engine, Scope};

use crate::aggregates::experiment::Experiment;
use crate::error::EngineError;

/// Evaluates `predicate` against `experiment`'s current state.
pub fn evaluate(predicate: &str, experiment: &Experiment) -> Result<bool, EngineError> {
    let mut engine = Engine::new();

    let slos_satisfied = experiment.slos_satisfied_overall();
    engine.register_fn("SLOs", move || slos_satisfied);

    let ast = engine
        .compile(predicate)
        .map_err(|err| EngineError::PredicateCompile(err.to_string()))?;

    let mut scope = Scope::new();
    let num_versions = experiment.insights().map(|i| i.num_versions()).unwrap_or(0) as i64;
    let (num_loops, num_completed_tasks, failure) = match experiment.result() {
        Some(result) => (result.num_loops as i64, result.num_completed_tasks as i64, result.failure),
        None => (0, 0, false),
    };
    scope.push("numVersions", num_versions);
    scope.push("numLoops", num_loops);
    scope.push("numCompletedTasks", num_completed_tasks);
    scope.push("failure", failure);

    engine
        .eval_ast_with_scope::<bool>(&mut scope, &ast)
        .map_err(|err| EngineError::PredicateEval(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::experiment::{Experiment, ExperimentResult, Spec};
    use chrono::Utc;

    fn experiment_with_result() -> Experiment {
        let mut experiment = Experiment::new(Spec::default());
        experiment.result = Some(ExperimentResult::new(1, Utc::now()));
        experiment
    }

    #[test]
    fn slos_call_reflects_overall_satisfaction() {
        let experiment = experiment_with_result();
        // zero versions => SLOs() is false per the documented contract.
        assert!(!evaluate("SLOs()", &experiment).unwrap());
    }

    #[test]
    fn field_reads_are_supported() {
        let experiment = experiment_with_result();
        assert!(evaluate("numCompletedTasks == 0 && !failure", &experiment).unwrap());
    }

    #[test]
    fn compile_failure_is_fatal() {
        let experiment = experiment_with_result();
        let err = evaluate("this is not valid rhai &&&", &experiment).unwrap_err();
        assert!(matches!(err, EngineError::PredicateCompile(_)));
    }

    #[test]
    fn non_boolean_result_is_an_eval_error() {
        let experiment = experiment_with_result();
        let err = evaluate("numCompletedTasks", &experiment).unwrap_err();
        assert!(matches!(err, EngineError::PredicateEval(_)));
    }
}
