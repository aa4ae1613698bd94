use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IspError;
use crate::formulation::constraint::{Constraint, ConstraintFamily, LinearObjective};
use crate::formulation::pair::LanguagePair;
use crate::formulation::variable::{VarId, VarKey};

pub mod base;
pub mod bridge;
pub mod builder;
pub(crate) mod common;
pub mod constraint;
pub mod pair;
pub mod variable;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Objective {
    /// Maximize the number of covered language pairs.
    #[serde(rename = "OF1")]
    CoveredPairs,
    /// Maximize the number of fully covered sessions.
    #[serde(rename = "OF2")]
    CoveredSessions,
}

impl FromStr for Objective {
    type Err = IspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OF1" => Ok(Objective::CoveredPairs),
            "OF2" => Ok(Objective::CoveredSessions),
            other => Err(IspError::UnknownObjective(other.to_string())),
        }
    }
}

impl Display for Objective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Objective::CoveredPairs => write!(f, "OF1"),
            Objective::CoveredSessions => write!(f, "OF2"),
        }
    }
}

/// Which bridge languages may relay a pair.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeLanguages {
    /// Any language both interpreters speak, other than the pair itself.
    #[default]
    Any,
    /// Only languages the session itself requires.
    Session,
}

/// Policy constants of the optional workload and fatigue constraints.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OperationalLimits {
    pub max_sessions: u32,
    pub window_blocks: usize,
    pub max_sessions_per_window: u32,
}

impl Default for OperationalLimits {
    fn default() -> Self {
        Self {
            max_sessions: 15,
            window_blocks: 4,
            max_sessions_per_window: 3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormulationKind {
    Base,
    Bridging,
}

impl Display for FormulationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormulationKind::Base => write!(f, "ISP"),
            FormulationKind::Bridging => write!(f, "ISP-Bridge"),
        }
    }
}

/// A fully built model: variable index set, constraint list and objective.
/// Produced once by [`base::build`] or [`bridge::build`] and never mutated.
#[derive(Debug, Clone)]
pub struct Formulation {
    pub(crate) kind: FormulationKind,
    pub(crate) objective: Objective,
    pub(crate) variables: Vec<VarKey>,
    pub(crate) index: HashMap<VarKey, VarId>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) objective_function: LinearObjective,
}

impl Formulation {
    pub fn kind(&self) -> FormulationKind {
        self.kind
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn variables(&self) -> &[VarKey] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective_function(&self) -> &LinearObjective {
        &self.objective_function
    }

    pub fn var(&self, key: &VarKey) -> Option<VarId> {
        self.index.get(key).copied()
    }

    pub fn require(&self, key: &VarKey) -> Result<VarId, IspError> {
        self.var(key)
            .ok_or_else(|| IspError::UnknownVariable(key.to_string()))
    }

    pub fn key(&self, id: VarId) -> Result<&VarKey, IspError> {
        self.variables
            .get(id.index())
            .ok_or_else(|| IspError::UnknownVariable(format!("#{}", id.index())))
    }

    pub fn keys_with_symbol(&self, symbol: char) -> impl Iterator<Item = (VarId, &VarKey)> {
        self.variables
            .iter()
            .enumerate()
            .filter(move |(_, k)| k.symbol() == symbol)
            .map(|(i, k)| (VarId(i), k))
    }

    pub fn constraints_of(&self, family: ConstraintFamily) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    /// The variable that says whether a pair counts as covered: `y` in the
    /// base model, `u` once bridges are allowed.
    pub fn coverage_key(&self, session: &str, pair: &LanguagePair) -> VarKey {
        match self.kind {
            FormulationKind::Base => VarKey::direct(session, pair),
            FormulationKind::Bridging => VarKey::covered(session, pair),
        }
    }

    /// Constraints violated by a set of solved values.
    pub fn violations(&self, values: &[f64]) -> Vec<&Constraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::error::IspError;
    use crate::formulation::Objective;
    use crate::formulation::builder::FormulationParams;
    use crate::formulation::variable::{VarId, VarKey};
    use crate::instance::tests::scenario;

    #[test]
    fn objective_names() {
        assert_eq!(Objective::from_str("OF1").unwrap(), Objective::CoveredPairs);
        assert_eq!(Objective::from_str("OF2").unwrap(), Objective::CoveredSessions);
        assert_eq!(Objective::CoveredSessions.to_string(), "OF2");
        assert!(matches!(
            Objective::from_str("OF3"),
            Err(IspError::UnknownObjective(name)) if name == "OF3"
        ));
    }

    #[test]
    fn foreign_ids_are_errors() {
        let formulation = FormulationParams::default().build(&scenario()).unwrap();
        assert_eq!(formulation.key(VarId(0)).unwrap(), &VarKey::assign("I1", "S1"));
        assert!(matches!(
            formulation.key(VarId(formulation.variables().len())),
            Err(IspError::UnknownVariable(_))
        ));
    }
}
