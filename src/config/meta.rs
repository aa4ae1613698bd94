use std::str::FromStr;

use rand::random;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::config::error::IspConfigError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IspLogLevel {
    Trace,
    Debug,
    Warn,
    #[default]
    Info,
    Error,
}

impl From<IspLogLevel> for Level {
    fn from(value: IspLogLevel) -> Self {
        match value {
            IspLogLevel::Trace => Level::TRACE,
            IspLogLevel::Debug => Level::DEBUG,
            IspLogLevel::Warn => Level::WARN,
            IspLogLevel::Info => Level::INFO,
            IspLogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for IspLogLevel {
    type Err = IspConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(IspLogLevel::Trace),
            "DEBUG" => Ok(IspLogLevel::Debug),
            "WARN" => Ok(IspLogLevel::Warn),
            "INFO" => Ok(IspLogLevel::Info),
            "ERROR" => Ok(IspLogLevel::Error),
            _ => Err(IspConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MetaConfig {
    /// Seed for instance generation. Kept to 32 bits so it fits a TOML integer.
    #[serde(default = "random")]
    pub seed: u32,
    #[serde(default)]
    pub log_level: IspLogLevel,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            seed: random(),
            log_level: IspLogLevel::Info,
        }
    }
}
