use crate::problem::ProblemState;
use crate::standard::VariableCounts;

/// Ordered, append-only record of every derivation step of a solve.
///
/// The trace is purely observational. The algorithm never reads it back;
/// it exists so a caller can render the full step-by-step derivation,
/// including on failure.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    steps: Vec<Snapshot>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.steps.push(snapshot);
    }

    pub fn steps(&self) -> &[Snapshot] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of pivot iterations recorded so far, the initial tableau
    /// included.
    pub fn iterations(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Snapshot::Iteration(_)))
            .count()
    }
}

/// One labeled derivation step. The serde tag layout is the wire format
/// consumed by rendering layers and must stay stable field-for-field.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// The problem exactly as submitted
    Original(ProblemState),
    /// Primal with all constraints normalized to the canonical direction
    #[cfg_attr(feature = "serde", serde(rename = "duality_step_1"))]
    DualityStep1(ProblemState),
    /// The resulting dual problem
    #[cfg_attr(feature = "serde", serde(rename = "duality_step_2"))]
    DualityStep2(ProblemState),
    /// Standard equality form with slack, surplus and artificial variables
    Standardized(StandardizedState),
    /// One simplex tableau, either the initial one or the state after a pivot
    Iteration(IterationState),
}

impl Snapshot {
    /// Human-readable title for rendering.
    pub fn title(&self) -> String {
        match self {
            Snapshot::Original(_) => "Original problem".to_string(),
            Snapshot::DualityStep1(_) => {
                "Duality step 1: canonical constraint directions".to_string()
            }
            Snapshot::DualityStep2(_) => "Duality step 2: dual problem".to_string(),
            Snapshot::Standardized(_) => "Standardized model".to_string(),
            Snapshot::Iteration(state) if state.iteration == 0 => {
                "Initial tableau".to_string()
            }
            Snapshot::Iteration(state) => format!("Iteration {}", state.iteration),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedState {
    /// Standardized objective, artificial penalties included
    pub objective: Vec<f64>,
    /// Augmented coefficient matrix
    pub matrix: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
    pub sense: crate::problem::Sense,
    pub counts: VariableCounts,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IterationState {
    /// 0 for the freshly built tableau, then 1 per pivot
    pub iteration: usize,
    /// Full tableau, reduced-cost row last, rhs column last
    pub tableau: Vec<Vec<f64>>,
    /// Basic variable index per constraint row
    pub basis: Vec<usize>,
    /// Cj - Zj per variable column
    pub reduced_costs: Vec<f64>,
    pub objective_value: f64,
    pub optimal: bool,
    /// Absent on the initial tableau
    pub pivot: Option<PivotInfo>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PivotInfo {
    pub row: usize,
    pub column: usize,
    /// Display name of the variable entering the basis
    pub entering: String,
    /// Display name of the variable leaving the basis
    pub leaving: String,
}
