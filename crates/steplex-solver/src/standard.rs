use log::debug;
use thiserror::Error;

use crate::problem::{ConstraintOp, Problem, Sense};
use crate::trace::{Snapshot, StandardizedState, Trace};

/// Penalty attached to artificial variables. Large enough to dominate the
/// objective magnitudes of small hand-entered problems; known to lose
/// precision when objective coefficients approach it.
pub const DEFAULT_PENALTY: f64 = 1000.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StandardizationError {
    #[error("initial basis holds {basic} variables for {rows} constraint rows")]
    BasisMismatch { basic: usize, rows: usize },
}

/// How many variables of each kind the standardized model holds.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariableCounts {
    pub original: usize,
    pub slack: usize,
    pub surplus: usize,
    pub artificial: usize,
}

impl VariableCounts {
    pub fn total(&self) -> usize {
        self.original + self.slack + self.surplus + self.artificial
    }
}

/// A problem in standard equality form, ready for the initial tableau.
///
/// Columns are blocked in order: original variables, slack, surplus,
/// artificial. Each constraint row owns exactly one initial basic variable
/// whose column is a unit vector.
#[derive(Debug, Clone)]
pub struct StandardForm {
    pub matrix: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
    /// Standardized objective over all columns, artificial penalties included
    pub cost: Vec<f64>,
    /// Initial basic variable per row
    pub basis: Vec<usize>,
    pub counts: VariableCounts,
    pub sense: Sense,
    pub dual_derived: bool,
    pub penalty: f64,
}

/// Convert a problem into standard equality form.
///
/// Slack (`<=`), surplus plus artificial (`>=`) or artificial (`=`)
/// variables are allocated per constraint. Rows whose right-hand side is
/// negative (possible after dualization) are negated with their operator
/// flipped before columns are assigned. Rows left without a clean unit
/// column by that accounting get an extra artificial column synthesized for
/// them; the repair is idempotent and does not alter feasibility.
pub fn standardize(
    problem: &Problem,
    penalty: f64,
    trace: &mut Trace,
) -> Result<StandardForm, StandardizationError> {
    let rows = problem.num_constraints();
    let originals = problem.num_variables();

    let mut counts = VariableCounts {
        original: originals,
        ..VariableCounts::default()
    };
    for constraint in &problem.constraints {
        match constraint.op {
            ConstraintOp::Le => counts.slack += 1,
            ConstraintOp::Ge => {
                counts.surplus += 1;
                counts.artificial += 1;
            }
            ConstraintOp::Eq => counts.artificial += 1,
        }
    }
    debug!(
        "standardize: {} rows need {} slack, {} surplus, {} artificial",
        rows, counts.slack, counts.surplus, counts.artificial
    );

    // Normalize rows with a negative right-hand side. Equalities are
    // negated without changing the operator.
    let mut normalized: Vec<(Vec<f64>, ConstraintOp, f64)> = Vec::with_capacity(rows);
    for (i, constraint) in problem.constraints.iter().enumerate() {
        if constraint.rhs < 0.0 {
            let negated = constraint.negated();
            debug!(
                "standardize: row {} has negative rhs, negated to {} {}",
                i + 1,
                negated.op,
                negated.rhs
            );
            normalized.push((negated.coefficients, negated.op, negated.rhs));
        } else {
            normalized.push((
                constraint.coefficients.clone(),
                constraint.op,
                constraint.rhs,
            ));
        }
    }

    let total = counts.total();
    let artificial_cost = match problem.sense {
        Sense::Max => -penalty,
        Sense::Min => penalty,
    };

    let mut cost = vec![0.0; total];
    cost[..originals].copy_from_slice(&problem.objective);
    for j in (originals + counts.slack + counts.surplus)..total {
        cost[j] = artificial_cost;
    }

    let mut matrix: Vec<Vec<f64>> = Vec::with_capacity(rows);
    let mut rhs: Vec<f64> = Vec::with_capacity(rows);
    let mut basis: Vec<Option<usize>> = vec![None; rows];

    let slack_base = originals;
    let surplus_base = originals + counts.slack;
    let artificial_base = originals + counts.slack + counts.surplus;
    let mut next_slack = 0;
    let mut next_surplus = 0;
    let mut next_artificial = 0;

    for (i, (coefficients, op, b)) in normalized.iter().enumerate() {
        let mut row = vec![0.0; total];
        row[..originals].copy_from_slice(coefficients);

        // Counts were taken before rhs normalization, so a flipped row can
        // run out of slots here; such rows are left for the repair pass.
        match op {
            ConstraintOp::Le => {
                if next_slack < counts.slack {
                    let col = slack_base + next_slack;
                    row[col] = 1.0;
                    basis[i] = Some(col);
                }
                next_slack += 1;
            }
            ConstraintOp::Ge => {
                if next_surplus < counts.surplus {
                    row[surplus_base + next_surplus] = -1.0;
                }
                next_surplus += 1;
                if next_artificial < counts.artificial {
                    let col = artificial_base + next_artificial;
                    row[col] = 1.0;
                    basis[i] = Some(col);
                }
                next_artificial += 1;
            }
            ConstraintOp::Eq => {
                if next_artificial < counts.artificial {
                    let col = artificial_base + next_artificial;
                    row[col] = 1.0;
                    basis[i] = Some(col);
                }
                next_artificial += 1;
            }
        }

        matrix.push(row);
        rhs.push(*b);
    }

    // Defensive repair: synthesize an artificial column for any row left
    // without a unit column of its own.
    for i in 0..rows {
        if basis[i].is_some() {
            continue;
        }
        let col = cost.len();
        for row in &mut matrix {
            row.push(0.0);
        }
        matrix[i][col] = 1.0;
        cost.push(artificial_cost);
        basis[i] = Some(col);
        counts.artificial += 1;
        debug!("standardize: synthesized artificial column {col} for row {}", i + 1);
    }

    let basis: Vec<usize> = basis.into_iter().flatten().collect();
    if basis.len() != rows {
        return Err(StandardizationError::BasisMismatch {
            basic: basis.len(),
            rows,
        });
    }

    trace.push(Snapshot::Standardized(StandardizedState {
        objective: cost.clone(),
        matrix: matrix.clone(),
        rhs: rhs.clone(),
        sense: problem.sense,
        counts,
    }));

    Ok(StandardForm {
        matrix,
        rhs,
        cost,
        basis,
        counts,
        sense: problem.sense,
        dual_derived: problem.dual_derived,
        penalty,
    })
}
