use std::fmt::{Display, Formatter};

use crate::formulation::variable::VarId;

/// Values above this count as "set" when reading back binaries.
pub const BINARY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

impl Sense {
    pub fn holds(&self, activity: i64, rhs: i64) -> bool {
        match self {
            Sense::LessEqual => activity <= rhs,
            Sense::GreaterEqual => activity >= rhs,
            Sense::Equal => activity == rhs,
        }
    }
}

impl Display for Sense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::LessEqual => write!(f, "<="),
            Sense::GreaterEqual => write!(f, ">="),
            Sense::Equal => write!(f, "=="),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectiveSense {
    Maximize,
    Minimize,
}

/// Which rule of the model a constraint instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintFamily {
    /// (1) one session per interpreter per block
    BlockExclusivity,
    /// (2) a directly covered pair needs an eligible interpreter present
    CoverageRequiresPresence,
    /// (3) an assigned interpreter covers at most one pair
    OnePairPerInterpreter,
    /// (4) z <= x
    CoverImpliesAssignment,
    /// (5) y <= sum z
    DirectImpliesCover,
    /// (6) t <= y, or t <= u when bridging
    FullImpliesCovered,
    /// (7) at most one interpreter credited per pair
    UniqueTranslator,
    /// (8)
    Workload,
    /// (9)
    ConsecutiveBlocks,
    /// (10) u <= y + sum w
    CoveredImpliesDirectOrBridge,
    /// (11) one translation role per interpreter per session
    SingleParticipation,
    /// (12) w <= x for both endpoints
    BridgeRequiresPresence,
    /// y >= z
    DirectRecognition,
    /// u >= y, u >= w
    CoveredRecognition,
    /// t >= sum of pair indicators - (pairs - 1)
    FullRecognition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub var: VarId,
    pub coefficient: i32,
}

impl Term {
    pub fn new(var: VarId, coefficient: i32) -> Self {
        Self { var, coefficient }
    }
}

/// `sum(terms) <sense> rhs` over binary variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub family: ConstraintFamily,
    pub terms: Vec<Term>,
    pub sense: Sense,
    pub rhs: i32,
}

impl Constraint {
    /// Left-hand side evaluated on rounded solved values.
    pub fn activity(&self, values: &[f64]) -> i64 {
        self.terms
            .iter()
            .filter(|t| values.get(t.var.index()).is_some_and(|v| *v > BINARY_THRESHOLD))
            .map(|t| i64::from(t.coefficient))
            .sum()
    }

    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        self.sense.holds(self.activity(values), i64::from(self.rhs))
    }

    pub fn involves(&self, var: VarId) -> bool {
        self.terms.iter().any(|t| t.var == var)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearObjective {
    pub sense: ObjectiveSense,
    pub terms: Vec<Term>,
}

impl LinearObjective {
    /// Best value any assignment could reach, ignoring all constraints.
    pub fn trivial_bound(&self) -> f64 {
        let (positive, negative): (Vec<i64>, Vec<i64>) = self
            .terms
            .iter()
            .map(|t| i64::from(t.coefficient))
            .partition(|c| *c > 0);
        let bound = match self.sense {
            ObjectiveSense::Maximize => positive.iter().sum::<i64>(),
            ObjectiveSense::Minimize => negative.iter().sum::<i64>(),
        };
        bound as f64
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .filter(|t| values.get(t.var.index()).is_some_and(|v| *v > BINARY_THRESHOLD))
            .map(|t| f64::from(t.coefficient))
            .sum()
    }
}
