use derive_builder::Builder;

use crate::error::IspError;
use crate::formulation::{BridgeLanguages, Formulation, Objective, OperationalLimits, base, bridge};
use crate::instance::Instance;

/// Everything that selects which model gets built for an instance.
#[derive(Clone, Debug, Builder)]
#[builder(default)]
pub struct FormulationParams {
    pub objective: Objective,
    pub bridging: bool,
    pub bridge_languages: BridgeLanguages,
    /// `None` leaves out the workload and consecutive-block constraints.
    pub operational: Option<OperationalLimits>,
    /// Adds the lower-bound links that make `y`, `u` and `t` exact.
    pub tight_indicators: bool,
    /// Ties every bridge to the presence of both its interpreters, so
    /// bridges are subject to block exclusivity.
    pub bridge_presence: bool,
}

impl Default for FormulationParams {
    fn default() -> Self {
        Self {
            objective: Objective::CoveredPairs,
            bridging: false,
            bridge_languages: BridgeLanguages::Any,
            operational: None,
            tight_indicators: true,
            bridge_presence: false,
        }
    }
}

impl FormulationParams {
    pub fn build(&self, instance: &Instance) -> Result<Formulation, IspError> {
        match self.bridging {
            true => bridge::build(instance, self),
            false => base::build(instance, self),
        }
    }

    /// Same params with a different objective.
    pub fn with_objective(&self, objective: Objective) -> Self {
        Self {
            objective,
            ..self.clone()
        }
    }

    pub fn with_bridging(&self, bridging: bool) -> Self {
        Self {
            bridging,
            ..self.clone()
        }
    }
}
