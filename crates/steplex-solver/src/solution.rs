use crate::problem::{ProblemState, Sense};
use crate::standard::VariableCounts;
use crate::tableau::Tableau;
use crate::trace::Trace;

/// A named variable and its value in the terminal solution.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VariableValue {
    pub name: String,
    pub value: f64,
}

/// Everything a presentation layer needs to render a solved problem.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Basic variables with their right-hand-side values
    pub basic_variables: Vec<VariableValue>,
    /// Every non-basic variable, all at value 0
    pub non_basic_variables: Vec<VariableValue>,
    pub objective_value: f64,
    pub sense: Sense,
    pub dual_derived: bool,
    pub counts: VariableCounts,
    /// The full derivation, original problem through terminal tableau
    pub trace: Trace,
    /// The problem as originally submitted
    pub problem: ProblemState,
}

/// Extract the solution from a tableau the engine declared optimal.
pub fn report(tableau: &Tableau, trace: Trace, problem: ProblemState) -> SolveReport {
    let basic_variables = tableau
        .basis()
        .iter()
        .enumerate()
        .map(|(row, &col)| VariableValue {
            name: tableau.variable_name(col),
            value: round4(tableau.rhs(row)),
        })
        .collect();

    let non_basic_variables = (0..tableau.num_cols())
        .filter(|col| !tableau.basis().contains(col))
        .map(|col| VariableValue {
            name: tableau.variable_name(col),
            value: 0.0,
        })
        .collect();

    SolveReport {
        basic_variables,
        non_basic_variables,
        objective_value: round4(tableau.compute_objective_value()),
        sense: tableau.sense(),
        dual_derived: tableau.dual_derived(),
        counts: tableau.counts(),
        trace,
        problem,
    }
}

/// Display name for a variable column: decision variables are `X` by
/// 1-based index (`Y` when the model is dual-derived), slack and surplus
/// variables share the `S` block, artificials are `A`. Purely cosmetic;
/// never consulted while solving.
pub fn variable_name(counts: &VariableCounts, dual_derived: bool, index: usize) -> String {
    if index < counts.original {
        let letter = if dual_derived { 'Y' } else { 'X' };
        return format!("{letter}{}", index + 1);
    }
    let offset = index - counts.original;
    let s_block = counts.slack + counts.surplus;
    if offset < s_block {
        format!("S{}", offset + 1)
    } else {
        format!("A{}", offset - s_block + 1)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
