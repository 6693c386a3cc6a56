/// Optimization direction of a linear program
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Max,
    Min,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Max => write!(f, "max"),
            Sense::Min => write!(f, "min"),
        }
    }
}

impl std::str::FromStr for Sense {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" | "maximize" => Ok(Sense::Max),
            "min" | "minimize" => Ok(Sense::Min),
            other => Err(format!("unknown optimization sense '{other}'")),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    /// The opposite inequality direction. Equalities stay equalities.
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

impl std::fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Coefficients for each decision variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> Self {
        Self { coefficients, op, rhs }
    }

    /// The same constraint multiplied by -1 on both sides.
    pub fn negated(&self) -> Self {
        Self {
            coefficients: self.coefficients.iter().map(|c| -c).collect(),
            op: self.op.flipped(),
            rhs: -self.rhs,
        }
    }
}

/// A linear program over non-negative variables.
///
/// All coefficient vectors are kept padded to the same length, the total
/// number of decision variables seen so far.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective function coefficients
    pub objective: Vec<f64>,
    /// Whether to maximize or minimize
    pub sense: Sense,
    /// Constraints, in submission order
    pub constraints: Vec<Constraint>,
    /// Set when this problem was produced by the duality transformer.
    /// Affects variable display names only.
    pub dual_derived: bool,
}

impl Problem {
    pub fn new(sense: Sense) -> Self {
        Self {
            objective: Vec::new(),
            sense,
            constraints: Vec::new(),
            dual_derived: false,
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>) {
        self.objective = coefficients;
        self.pad();
    }

    pub fn push_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
        self.pad();
    }

    /// Number of decision variables, i.e. the common padded length.
    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Extend the objective and every constraint row with zeros so all
    /// coefficient vectors share the length of the longest one.
    fn pad(&mut self) {
        let width = self
            .constraints
            .iter()
            .map(|c| c.coefficients.len())
            .chain(std::iter::once(self.objective.len()))
            .max()
            .unwrap_or(0);
        self.objective.resize(width, 0.0);
        for constraint in &mut self.constraints {
            constraint.coefficients.resize(width, 0.0);
        }
    }

    /// Immutable snapshot of the current model for the solution trace.
    pub fn state(&self) -> ProblemState {
        ProblemState {
            objective: self.objective.clone(),
            matrix: self
                .constraints
                .iter()
                .map(|c| c.coefficients.clone())
                .collect(),
            rhs: self.constraints.iter().map(|c| c.rhs).collect(),
            operators: self.constraints.iter().map(|c| c.op).collect(),
            sense: self.sense,
        }
    }
}

/// A frozen copy of a problem's matrices, captured into the trace before
/// each transformation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemState {
    pub objective: Vec<f64>,
    pub matrix: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
    pub operators: Vec<ConstraintOp>,
    pub sense: Sense,
}

/// Render a coefficient vector as a linear expression such as
/// `3x1 + 2x2 - x3`. Zero coefficients are skipped unless the whole
/// vector is zero.
pub fn render_expression(coefficients: &[f64]) -> String {
    let mut out = String::new();
    for (i, &coef) in coefficients.iter().enumerate() {
        if coef == 0.0 {
            continue;
        }
        let magnitude = coef.abs();
        if out.is_empty() {
            if coef < 0.0 {
                out.push('-');
            }
        } else if coef < 0.0 {
            out.push_str(" - ");
        } else {
            out.push_str(" + ");
        }
        if magnitude != 1.0 {
            out.push_str(&trim_number(magnitude));
        }
        out.push_str(&format!("x{}", i + 1));
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
