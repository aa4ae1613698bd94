use thiserror::Error;

use crate::config::error::IspConfigError;
use crate::formulation::builder::FormulationParamsBuilderError;
use crate::solver::SolveStatus;

#[derive(Debug, Error)]
pub enum IspError {
    #[error("Objective function must be either 'OF1' or 'OF2', got: {0}")]
    UnknownObjective(String),
    #[error("Block {block} references session {session}, which is not a known session")]
    UnknownSession { block: String, session: String },
    #[error("No languages are listed for {0}")]
    MissingLanguages(String),
    #[error("Block {0} has no entry in Sessions_b")]
    MissingBlock(String),
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),
    #[error("Variable {0} is not part of this formulation")]
    UnknownVariable(String),
    #[error("Model has not been optimized yet. Call optimize() first.")]
    NotSolved,
    #[error("Solver finished with status {0} and no solution to read")]
    NoSolution(SolveStatus),
    #[error("Z3 failed to return a model for a satisfiable problem")]
    ModelGenerationError,
    #[error("Error reading instance file")]
    Io(#[from] std::io::Error),
    #[error("Malformed instance: {0}")]
    InstanceFormat(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] IspConfigError),
    #[error("Invalid formulation params")]
    FormulationParams(#[from] FormulationParamsBuilderError),
}
