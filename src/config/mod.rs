use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::meta::MetaConfig;
use crate::config::model::ModelConfig;
use crate::config::solver::SolverConfig;
use crate::error::IspError;
use crate::formulation::builder::{FormulationParams, FormulationParamsBuilder};
use crate::instance::Instance;

pub mod error;
pub mod meta;
pub mod model;
pub mod solver;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstanceConfig {
    pub path: PathBuf,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("instance.json"),
        }
    }
}

/// This struct represents the serializable configuration found in an
/// `isp.toml` file. Once parsed from a file or constructed programmatically,
/// it produces the [FormulationParams] that pick and build a model, and
/// points at the instance to build it for.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IspConfig {
    #[serde(default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub instance: InstanceConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl IspConfig {
    pub fn resolve(&self) -> Result<FormulationParams, IspError> {
        let mut b = FormulationParamsBuilder::default();
        b.objective(self.model.objective)
            .bridging(self.model.bridging)
            .bridge_languages(self.model.bridge_languages)
            .tight_indicators(self.model.tight_indicators)
            .bridge_presence(self.model.bridge_presence);
        b.operational(self.model.operational);
        let params = b.build()?;
        Ok(params)
    }

    pub fn load_instance(&self) -> Result<Instance, IspError> {
        Instance::load(&self.instance.path)
    }
}

#[cfg(feature = "toml")]
impl IspConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, IspError> {
        let config = toml_edit::de::from_str(s).map_err(error::IspConfigError::from)?;
        Ok(config)
    }

    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self, IspError> {
        let s = std::fs::read_to_string(path).map_err(error::IspConfigError::from)?;
        Self::from_toml_str(&s)
    }

    pub fn to_toml_string(&self) -> Result<String, IspError> {
        let s = toml_edit::ser::to_string_pretty(self).map_err(error::IspConfigError::from)?;
        Ok(s)
    }
}
