use log::debug;

use crate::problem::{Constraint, ConstraintOp, Problem, Sense};
use crate::trace::{Snapshot, Trace};

/// Rewrite a problem into its dual.
///
/// The primal is first normalized to the single canonical direction duality
/// requires (`<=` rows when maximizing, `>=` rows when minimizing). An
/// equality splits into two opposed rows to preserve equivalence; a row
/// pointing the wrong way is negated instead. The dual then swaps the
/// objective with the right-hand sides over the transposed matrix and flips
/// the optimization sense.
///
/// Two trace entries are recorded, the normalized primal and the resulting
/// dual. The returned problem is marked dual-derived, which affects variable
/// display naming only.
pub fn dualize(problem: Problem, trace: &mut Trace) -> Problem {
    let canonical = match problem.sense {
        Sense::Max => ConstraintOp::Le,
        Sense::Min => ConstraintOp::Ge,
    };

    let mut normalized: Vec<Constraint> = Vec::with_capacity(problem.constraints.len());
    for constraint in &problem.constraints {
        match constraint.op {
            ConstraintOp::Eq => {
                normalized.push(Constraint::new(
                    constraint.coefficients.clone(),
                    canonical,
                    constraint.rhs,
                ));
                let negated = constraint.negated();
                normalized.push(Constraint::new(negated.coefficients, canonical, negated.rhs));
            }
            op if op == canonical => normalized.push(constraint.clone()),
            _ => {
                let negated = constraint.negated();
                normalized.push(negated);
            }
        }
    }
    debug!(
        "duality: normalized {} primal rows into {} {} rows",
        problem.constraints.len(),
        normalized.len(),
        canonical
    );

    let mut primal = Problem::new(problem.sense);
    primal.set_objective(problem.objective.clone());
    for constraint in normalized {
        primal.push_constraint(constraint);
    }
    trace.push(Snapshot::DualityStep1(primal.state()));

    // Transpose: one dual variable per normalized primal row, one dual
    // constraint per primal variable.
    let rows = primal.num_constraints();
    let cols = primal.num_variables();
    let dual_op = match problem.sense {
        Sense::Max => ConstraintOp::Ge,
        Sense::Min => ConstraintOp::Le,
    };

    let mut dual = Problem::new(match problem.sense {
        Sense::Max => Sense::Min,
        Sense::Min => Sense::Max,
    });
    dual.set_objective(primal.constraints.iter().map(|c| c.rhs).collect());
    for j in 0..cols {
        let coefficients = (0..rows)
            .map(|i| primal.constraints[i].coefficients[j])
            .collect();
        dual.push_constraint(Constraint::new(coefficients, dual_op, primal.objective[j]));
    }
    dual.dual_derived = true;

    debug!(
        "duality: {} {} variables become {} {} constraints",
        cols, problem.sense, cols, dual.sense
    );
    trace.push(Snapshot::DualityStep2(dual.state()));

    dual
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_problem() -> Problem {
        // max 3x1 + 5x2
        //   x1 <= 4
        //   2x2 <= 12
        //   3x1 + 2x2 <= 18
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![3.0, 5.0]);
        problem.push_constraint(Constraint::new(vec![1.0, 0.0], ConstraintOp::Le, 4.0));
        problem.push_constraint(Constraint::new(vec![0.0, 2.0], ConstraintOp::Le, 12.0));
        problem.push_constraint(Constraint::new(vec![3.0, 2.0], ConstraintOp::Le, 18.0));
        problem
    }

    #[test]
    fn test_dual_of_canonical_max() {
        let mut trace = Trace::new();
        let dual = dualize(max_problem(), &mut trace);

        assert_eq!(dual.sense, Sense::Min);
        assert!(dual.dual_derived);
        assert_eq!(dual.objective, vec![4.0, 12.0, 18.0]);
        assert_eq!(dual.num_constraints(), 2);
        assert_eq!(dual.constraints[0].coefficients, vec![1.0, 0.0, 3.0]);
        assert_eq!(dual.constraints[0].op, ConstraintOp::Ge);
        assert_eq!(dual.constraints[0].rhs, 3.0);
        assert_eq!(dual.constraints[1].coefficients, vec![0.0, 2.0, 2.0]);
        assert_eq!(dual.constraints[1].rhs, 5.0);
        assert_eq!(trace.len(), 2);
    }

    #[test]
    fn test_equality_splits_into_two_rows() {
        // max x1, x1 = 1
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![1.0]);
        problem.push_constraint(Constraint::new(vec![1.0], ConstraintOp::Eq, 1.0));

        let mut trace = Trace::new();
        let dual = dualize(problem, &mut trace);

        // The normalized primal has two rows, x1 <= 1 and -x1 <= -1.
        let Snapshot::DualityStep1(normalized) = &trace.steps()[0] else {
            panic!("expected a duality_step_1 snapshot");
        };
        assert_eq!(normalized.matrix, vec![vec![1.0], vec![-1.0]]);
        assert_eq!(normalized.rhs, vec![1.0, -1.0]);
        assert!(normalized.operators.iter().all(|op| *op == ConstraintOp::Le));

        assert_eq!(dual.objective, vec![1.0, -1.0]);
        assert_eq!(dual.constraints[0].coefficients, vec![1.0, -1.0]);
    }

    #[test]
    fn test_wrong_direction_row_is_negated_not_split() {
        // max x1 + x2, x1 + x2 >= 2
        let mut problem = Problem::new(Sense::Max);
        problem.set_objective(vec![1.0, 1.0]);
        problem.push_constraint(Constraint::new(vec![1.0, 1.0], ConstraintOp::Ge, 2.0));

        let mut trace = Trace::new();
        let _ = dualize(problem, &mut trace);

        let Snapshot::DualityStep1(normalized) = &trace.steps()[0] else {
            panic!("expected a duality_step_1 snapshot");
        };
        assert_eq!(normalized.matrix, vec![vec![-1.0, -1.0]]);
        assert_eq!(normalized.rhs, vec![-2.0]);
    }

    #[test]
    fn test_min_primal_normalizes_to_ge() {
        // min 2x1 + 3x2, x1 + x2 <= 5
        let mut problem = Problem::new(Sense::Min);
        problem.set_objective(vec![2.0, 3.0]);
        problem.push_constraint(Constraint::new(vec![1.0, 1.0], ConstraintOp::Le, 5.0));

        let mut trace = Trace::new();
        let dual = dualize(problem, &mut trace);

        let Snapshot::DualityStep1(normalized) = &trace.steps()[0] else {
            panic!("expected a duality_step_1 snapshot");
        };
        assert_eq!(normalized.operators, vec![ConstraintOp::Ge]);
        assert_eq!(normalized.rhs, vec![-5.0]);
        assert_eq!(dual.sense, Sense::Max);
        assert!(dual.constraints.iter().all(|c| c.op == ConstraintOp::Le));
    }
}
