use log::debug;
use thiserror::Error;

use crate::parser::Parser;
use steplex_solver::{
    Problem, ProblemState, Sense, SimplexEngine, Snapshot, SolveReport, SolveState, Tableau,
    Trace, dualize, report, standardize,
};

/// Classification of a failed solve, the `error_kind` of the wire format.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveErrorKind {
    Parse,
    Standardization,
    Unbounded,
    Infeasible,
    IterationLimitExceeded,
    EmptyProblem,
}

/// A failed solve. Carries whatever trace was accumulated before the
/// failure so callers can still render the partial derivation, plus the
/// original problem snapshot when parsing got far enough to produce one.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct SolveFailure {
    pub kind: SolveErrorKind,
    pub message: String,
    pub trace: Trace,
    pub problem: Option<ProblemState>,
}

/// One solve submission: a textual objective, the optimization sense, the
/// constraint strings, and whether to transform the problem into its dual
/// before solving.
///
/// Each run owns its problem, tableau and trace; a request can be run any
/// number of times without shared state.
#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub objective: String,
    pub sense: Sense,
    pub constraints: Vec<String>,
    pub apply_duality: bool,
}

impl SolveRequest {
    pub fn new(objective: impl Into<String>, sense: Sense) -> Self {
        Self {
            objective: objective.into(),
            sense,
            constraints: Vec::new(),
            apply_duality: false,
        }
    }

    pub fn constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn with_duality(mut self) -> Self {
        self.apply_duality = true;
        self
    }

    /// Run the full pipeline with default engine settings.
    pub fn run(&self) -> Result<SolveReport, SolveFailure> {
        self.run_with(&SimplexEngine::new())
    }

    /// Parse, optionally dualize, standardize, pivot to a terminal state
    /// and report.
    pub fn run_with(&self, engine: &SimplexEngine) -> Result<SolveReport, SolveFailure> {
        let mut trace = Trace::new();

        let lines: Vec<&str> = self
            .constraints
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(SolveFailure {
                kind: SolveErrorKind::EmptyProblem,
                message: "at least one constraint is required".to_string(),
                trace,
                problem: None,
            });
        }

        let mut problem = Problem::new(self.sense);
        match Parser::expression(&self.objective) {
            Ok(objective) => problem.set_objective(objective),
            Err(e) => {
                return Err(SolveFailure {
                    kind: SolveErrorKind::Parse,
                    message: format!("objective '{}': {e}", self.objective.trim()),
                    trace,
                    problem: None,
                });
            }
        }
        for line in &lines {
            match Parser::constraint(line) {
                Ok(constraint) => problem.push_constraint(constraint),
                Err(e) => {
                    return Err(SolveFailure {
                        kind: SolveErrorKind::Parse,
                        message: format!("constraint '{line}': {e}"),
                        trace,
                        problem: None,
                    });
                }
            }
        }
        debug!(
            "parsed problem: {} variables, {} constraints, sense {}",
            problem.num_variables(),
            problem.num_constraints(),
            problem.sense
        );

        let original = problem.state();
        trace.push(Snapshot::Original(original.clone()));

        let problem = if self.apply_duality {
            dualize(problem, &mut trace)
        } else {
            problem
        };

        let form = match standardize(&problem, engine.penalty(), &mut trace) {
            Ok(form) => form,
            Err(e) => {
                return Err(SolveFailure {
                    kind: SolveErrorKind::Standardization,
                    message: e.to_string(),
                    trace,
                    problem: Some(original),
                });
            }
        };

        let mut tableau = Tableau::new(&form);
        match engine.run(&mut tableau, &mut trace) {
            SolveState::Optimal => Ok(report(&tableau, trace, original)),
            SolveState::Unbounded => Err(SolveFailure {
                kind: SolveErrorKind::Unbounded,
                message: "the problem is unbounded: the objective can improve without limit"
                    .to_string(),
                trace,
                problem: Some(original),
            }),
            SolveState::Infeasible => Err(SolveFailure {
                kind: SolveErrorKind::Infeasible,
                message: "no feasible solution satisfies every constraint".to_string(),
                trace,
                problem: Some(original),
            }),
            SolveState::IterationLimitExceeded => Err(SolveFailure {
                kind: SolveErrorKind::IterationLimitExceeded,
                message: "iteration limit reached before optimality".to_string(),
                trace,
                problem: Some(original),
            }),
        }
    }
}
