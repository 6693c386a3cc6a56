use log::debug;

use crate::problem::Sense;
use crate::standard::{StandardForm, VariableCounts};
use crate::trace::{IterationState, PivotInfo, Snapshot, Trace};

pub const DEFAULT_TOLERANCE: f64 = 1e-10;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Terminal state of a simplex run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimitExceeded,
}

/// Dense simplex tableau.
///
/// `(constraints + 1)` rows by `(variables + 1)` columns; the last row holds
/// the reduced costs (Cj - Zj), the last column the current right-hand
/// sides, with the objective value in the bottom-right cell. After every
/// pivot the column of each basic variable is a unit column.
#[derive(Debug, Clone)]
pub struct Tableau {
    rows: Vec<Vec<f64>>,
    basis: Vec<usize>,
    cost: Vec<f64>,
    sense: Sense,
    counts: VariableCounts,
    dual_derived: bool,
    penalty: f64,
}

impl Tableau {
    pub fn new(form: &StandardForm) -> Self {
        let m = form.matrix.len();
        let n = form.cost.len();
        let mut rows = vec![vec![0.0; n + 1]; m + 1];

        for i in 0..m {
            rows[i][..n].copy_from_slice(&form.matrix[i]);
            rows[i][n] = form.rhs[i];
        }

        let mut tableau = Self {
            rows,
            basis: form.basis.clone(),
            cost: form.cost.clone(),
            sense: form.sense,
            counts: form.counts,
            dual_derived: form.dual_derived,
            penalty: form.penalty,
        };

        // Reduced-cost row and objective cell for the initial basis.
        let reduced = tableau.compute_reduced_costs();
        tableau.rows[m][..n].copy_from_slice(&reduced);
        tableau.rows[m][n] = tableau.compute_objective_value();
        tableau
    }

    /// Number of constraint rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len() - 1
    }

    /// Number of variable columns.
    pub fn num_cols(&self) -> usize {
        self.cost.len()
    }

    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.rows[row][self.num_cols()]
    }

    pub fn reduced_cost(&self, col: usize) -> f64 {
        self.rows[self.num_rows()][col]
    }

    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    pub fn counts(&self) -> VariableCounts {
        self.counts
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn dual_derived(&self) -> bool {
        self.dual_derived
    }

    /// Cj - Zj recomputed from the cost vector and the current basis, as
    /// recorded into trace snapshots. Matches the stored reduced-cost row
    /// up to floating error.
    pub fn compute_reduced_costs(&self) -> Vec<f64> {
        (0..self.num_cols())
            .map(|j| {
                let zj: f64 = (0..self.num_rows())
                    .map(|i| self.cost[self.basis[i]] * self.rows[i][j])
                    .sum();
                self.cost[j] - zj
            })
            .collect()
    }

    /// Objective value at the current basic solution.
    pub fn compute_objective_value(&self) -> f64 {
        (0..self.num_rows())
            .map(|i| self.cost[self.basis[i]] * self.rhs(i))
            .sum()
    }

    /// Display name for a variable column.
    pub fn variable_name(&self, index: usize) -> String {
        crate::solution::variable_name(&self.counts, self.dual_derived, index)
    }

    fn snapshot(&self, iteration: usize, optimal: bool, pivot: Option<PivotInfo>) -> IterationState {
        IterationState {
            iteration,
            tableau: self.rows.clone(),
            basis: self.basis.clone(),
            reduced_costs: self.compute_reduced_costs(),
            objective_value: self.compute_objective_value(),
            optimal,
            pivot,
        }
    }
}

/// The iterative pivoting engine.
///
/// Ties in the entering and leaving selections break by first occurrence;
/// there is no anti-cycling rule beyond the iteration cap, which is
/// acceptable for the small hand-entered problems this solver targets.
#[derive(Debug, Clone)]
pub struct SimplexEngine {
    max_iterations: usize,
    tolerance: f64,
    penalty: f64,
}

impl Default for SimplexEngine {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            penalty: crate::standard::DEFAULT_PENALTY,
        }
    }
}

impl SimplexEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Big-M penalty used when standardizing and when classifying a
    /// terminal basis as infeasible.
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Walk the tableau to a terminal state, appending one trace snapshot
    /// for the initial tableau and one per pivot.
    pub fn run(&self, tableau: &mut Tableau, trace: &mut Trace) -> SolveState {
        let mut iteration = 0;
        trace.push(Snapshot::Iteration(tableau.snapshot(
            iteration,
            self.is_optimal(tableau),
            None,
        )));

        while !self.is_optimal(tableau) && iteration < self.max_iterations {
            iteration += 1;

            // No qualifying column coincides with optimality; treated as
            // such rather than propagated as an error.
            let Some(col) = self.entering_column(tableau) else {
                break;
            };
            if self.column_is_unbounded(tableau, col) {
                debug!("iteration {iteration}: column {col} admits no leaving row, unbounded");
                return SolveState::Unbounded;
            }
            let Some(row) = self.leaving_row(tableau, col) else {
                return SolveState::Unbounded;
            };

            let pivot = PivotInfo {
                row,
                column: col,
                entering: tableau.variable_name(col),
                leaving: tableau.variable_name(tableau.basis[row]),
            };
            debug!(
                "iteration {iteration}: {} enters, {} leaves (pivot at row {row}, column {col})",
                pivot.entering, pivot.leaving
            );
            self.pivot(tableau, row, col);

            trace.push(Snapshot::Iteration(tableau.snapshot(
                iteration,
                self.is_optimal(tableau),
                Some(pivot),
            )));
        }

        if iteration >= self.max_iterations {
            return SolveState::IterationLimitExceeded;
        }
        if self.penalized_variable_in_basis(tableau) {
            return SolveState::Infeasible;
        }
        SolveState::Optimal
    }

    /// Maximizing: optimal when no reduced cost is above tolerance.
    /// Minimizing: optimal when none is below the negative tolerance.
    fn is_optimal(&self, tableau: &Tableau) -> bool {
        let reduced = &tableau.rows[tableau.num_rows()];
        match tableau.sense {
            Sense::Max => reduced[..tableau.num_cols()]
                .iter()
                .all(|&v| v <= self.tolerance),
            Sense::Min => reduced[..tableau.num_cols()]
                .iter()
                .all(|&v| v >= -self.tolerance),
        }
    }

    /// Most improving reduced cost, first occurrence on ties. `None` when
    /// no column qualifies.
    fn entering_column(&self, tableau: &Tableau) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..tableau.num_cols() {
            let value = tableau.reduced_cost(j);
            let qualifies = match tableau.sense {
                Sense::Max => value > self.tolerance,
                Sense::Min => value < -self.tolerance,
            };
            if !qualifies {
                continue;
            }
            let better = match (tableau.sense, best) {
                (_, None) => true,
                (Sense::Max, Some((_, b))) => value > b,
                (Sense::Min, Some((_, b))) => value < b,
            };
            if better {
                best = Some((j, value));
            }
        }
        best.map(|(j, _)| j)
    }

    /// True when the entering column has no strictly positive entry, so no
    /// finite leaving ratio exists.
    fn column_is_unbounded(&self, tableau: &Tableau, col: usize) -> bool {
        (0..tableau.num_rows()).all(|i| tableau.entry(i, col) <= self.tolerance)
    }

    /// Minimum-ratio test over rows with a strictly positive entry in the
    /// entering column, first occurrence on ties.
    fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;
        for i in 0..tableau.num_rows() {
            let entry = tableau.entry(i, col);
            if entry > self.tolerance {
                let ratio = tableau.rhs(i) / entry;
                if ratio >= -self.tolerance && ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }
        min_row
    }

    /// Scale the pivot row to make the pivot entry 1, eliminate the
    /// entering column everywhere else (objective row included), and swap
    /// the entering variable into the basis.
    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let width = tableau.num_cols() + 1;
        let pivot_value = tableau.rows[row][col];
        for j in 0..width {
            tableau.rows[row][j] /= pivot_value;
        }
        for i in 0..tableau.rows.len() {
            if i == row {
                continue;
            }
            let factor = tableau.rows[i][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..width {
                tableau.rows[i][j] -= factor * tableau.rows[row][j];
            }
        }
        tableau.basis[row] = col;
    }

    /// Big-M feasibility check: an artificial variable still basic at a
    /// strictly positive level means the original problem has no feasible
    /// solution.
    fn penalized_variable_in_basis(&self, tableau: &Tableau) -> bool {
        (0..tableau.num_rows()).any(|i| {
            let cb = tableau.cost[tableau.basis[i]];
            cb.abs() >= tableau.penalty - 1.0 && tableau.rhs(i) > self.tolerance
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Constraint, ConstraintOp, Problem};
    use crate::standard::{standardize, DEFAULT_PENALTY};

    fn run(problem: &Problem) -> (Tableau, Trace, SolveState) {
        let mut trace = Trace::new();
        let form = standardize(problem, DEFAULT_PENALTY, &mut trace).unwrap();
        let mut tableau = Tableau::new(&form);
        let state = SimplexEngine::new().run(&mut tableau, &mut trace);
        (tableau, trace, state)
    }

    #[test]
    fn test_textbook_maximization() {
        // max 3x1 + 5x2
        //   x1 <= 4, 2x2 <= 12, 3x1 + 2x2 <= 18
        // Optimal z = 36 at x1 = 2, x2 = 6.
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![3.0, 5.0]);
        problem.push_constraint(Constraint::new(vec![1.0, 0.0], ConstraintOp::Le, 4.0));
        problem.push_constraint(Constraint::new(vec![0.0, 2.0], ConstraintOp::Le, 12.0));
        problem.push_constraint(Constraint::new(vec![3.0, 2.0], ConstraintOp::Le, 18.0));

        let (tableau, _, state) = run(&problem);
        assert_eq!(state, SolveState::Optimal);
        assert!((tableau.compute_objective_value() - 36.0).abs() < 1e-6);

        let mut values = vec![0.0; 2];
        for (i, &b) in tableau.basis().iter().enumerate() {
            if b < 2 {
                values[b] = tableau.rhs(i);
            }
        }
        assert!((values[0] - 2.0).abs() < 1e-6, "x1 = {}", values[0]);
        assert!((values[1] - 6.0).abs() < 1e-6, "x2 = {}", values[1]);
    }

    #[test]
    fn test_unbounded_maximization() {
        // max x1 with only x1 >= 0: no finite leaving ratio once x1 enters.
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![1.0]);
        problem.push_constraint(Constraint::new(vec![1.0], ConstraintOp::Ge, 0.0));

        let (_, _, state) = run(&problem);
        assert_eq!(state, SolveState::Unbounded);
    }

    #[test]
    fn test_minimization_with_equality() {
        // min 2x1 + 3x2 with x1 + x2 = 1: optimal z = 2 at x1 = 1.
        let mut problem = Problem::new(Sense::Min);
        problem.set_objective(vec![2.0, 3.0]);
        problem.push_constraint(Constraint::new(vec![1.0, 1.0], ConstraintOp::Eq, 1.0));

        let (tableau, _, state) = run(&problem);
        assert_eq!(state, SolveState::Optimal);
        assert!((tableau.compute_objective_value() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_contradictory_equalities_are_infeasible() {
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![1.0]);
        problem.push_constraint(Constraint::new(vec![1.0], ConstraintOp::Eq, 1.0));
        problem.push_constraint(Constraint::new(vec![1.0], ConstraintOp::Eq, 2.0));

        let (_, _, state) = run(&problem);
        assert_eq!(state, SolveState::Infeasible);
    }

    #[test]
    fn test_pivot_keeps_unit_columns_and_single_basis_swap() {
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![3.0, 5.0]);
        problem.push_constraint(Constraint::new(vec![1.0, 0.0], ConstraintOp::Le, 4.0));
        problem.push_constraint(Constraint::new(vec![0.0, 2.0], ConstraintOp::Le, 12.0));
        problem.push_constraint(Constraint::new(vec![3.0, 2.0], ConstraintOp::Le, 18.0));

        let (_, trace, state) = run(&problem);
        assert_eq!(state, SolveState::Optimal);

        let iterations: Vec<_> = trace
            .steps()
            .iter()
            .filter_map(|s| match s {
                crate::trace::Snapshot::Iteration(it) => Some(it),
                _ => None,
            })
            .collect();
        assert!(iterations.len() >= 2);

        for pair in iterations.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let changed = prev
                .basis
                .iter()
                .zip(&next.basis)
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(changed, 1, "each pivot must swap exactly one basic variable");

            let pivot = next.pivot.as_ref().unwrap();
            for (i, row) in next.tableau[..next.basis.len()].iter().enumerate() {
                let expected = if i == pivot.row { 1.0 } else { 0.0 };
                assert!(
                    (row[pivot.column] - expected).abs() < 1e-9,
                    "entering column must be a unit column after the pivot"
                );
            }
        }
    }

    #[test]
    fn test_iteration_cap_reports_limit() {
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![3.0, 5.0]);
        problem.push_constraint(Constraint::new(vec![1.0, 0.0], ConstraintOp::Le, 4.0));
        problem.push_constraint(Constraint::new(vec![0.0, 2.0], ConstraintOp::Le, 12.0));
        problem.push_constraint(Constraint::new(vec![3.0, 2.0], ConstraintOp::Le, 18.0));

        let mut trace = Trace::new();
        let form = standardize(&problem, DEFAULT_PENALTY, &mut trace).unwrap();
        let mut tableau = Tableau::new(&form);
        let state = SimplexEngine::new()
            .with_max_iterations(1)
            .run(&mut tableau, &mut trace);
        assert_eq!(state, SolveState::IterationLimitExceeded);
    }

    #[test]
    fn test_variable_names_follow_blocks() {
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![1.0, 1.0]);
        problem.push_constraint(Constraint::new(vec![1.0, 0.0], ConstraintOp::Le, 1.0));
        problem.push_constraint(Constraint::new(vec![0.0, 1.0], ConstraintOp::Ge, 1.0));

        let mut trace = Trace::new();
        let form = standardize(&problem, DEFAULT_PENALTY, &mut trace).unwrap();
        let tableau = Tableau::new(&form);

        assert_eq!(tableau.variable_name(0), "X1");
        assert_eq!(tableau.variable_name(1), "X2");
        assert_eq!(tableau.variable_name(2), "S1");
        assert_eq!(tableau.variable_name(3), "S2");
        assert_eq!(tableau.variable_name(4), "A1");
    }
}
