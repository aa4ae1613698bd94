use serde::{Deserialize, Serialize};

use crate::formulation::{BridgeLanguages, Objective, OperationalLimits};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub objective: Objective,
    pub bridging: bool,
    pub bridge_languages: BridgeLanguages,
    pub tight_indicators: bool,
    pub bridge_presence: bool,
    /// Present only when the workload and fatigue constraints are wanted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operational: Option<OperationalLimits>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            objective: Objective::CoveredPairs,
            bridging: false,
            bridge_languages: BridgeLanguages::Any,
            tight_indicators: true,
            bridge_presence: false,
            operational: None,
        }
    }
}
