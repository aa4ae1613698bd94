use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::solver::DEFAULT_TIME_LIMIT;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    pub time_limit_secs: u64,
}

impl SolverConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_limit_secs: DEFAULT_TIME_LIMIT.as_secs(),
        }
    }
}
