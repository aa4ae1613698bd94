pub mod config;
pub mod error;
pub mod formulation;
pub mod instance;
pub mod report;
pub mod solver;
