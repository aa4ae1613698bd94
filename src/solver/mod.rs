use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::{Level, event, instrument};

use crate::error::IspError;
use crate::formulation::Formulation;
use crate::formulation::constraint::{BINARY_THRESHOLD, ObjectiveSense, Sense};
use crate::formulation::variable::VarKey;

pub mod optimize;

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    /// Stopped by the time limit with an incumbent that is not proven optimal.
    TimeLimit,
    TimeLimitNoSolution,
    Infeasible,
    Unbounded,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::TimeLimit)
    }
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::TimeLimit => write!(f, "time limit"),
            SolveStatus::TimeLimitNoSolution => write!(f, "time limit, no solution"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// The capability the formulations need from a MILP engine. A backend is
/// loaded once, optimized once, then only queried.
pub trait MilpBackend {
    type Var: Clone;

    fn add_binary(&mut self, name: &str) -> Self::Var;

    fn add_constraint(&mut self, name: &str, terms: &[(Self::Var, i32)], sense: Sense, rhs: i32);

    fn set_objective(&mut self, terms: &[(Self::Var, i32)], sense: ObjectiveSense);

    /// Blocks until optimal, infeasible, or `time_limit` has passed.
    fn optimize(&mut self, time_limit: Duration) -> Result<SolveStatus, IspError>;

    fn status(&self) -> Result<SolveStatus, IspError>;

    fn value(&self, var: &Self::Var) -> Result<f64, IspError>;

    fn objective_value(&self) -> Result<f64, IspError>;

    fn runtime(&self) -> Result<Duration, IspError>;

    /// Relative distance between the incumbent and the best known bound.
    fn mip_gap(&self) -> Result<f64, IspError>;
}

/// `|bound - incumbent| / |incumbent|`, with the denominator floored at
/// 1e-10 so a zero incumbent gives a huge gap instead of a division by zero.
pub fn relative_gap(bound: f64, incumbent: f64) -> f64 {
    (bound - incumbent).abs() / incumbent.abs().max(1e-10)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveStatistics {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub gap: Option<f64>,
    pub runtime: Duration,
}

/// Solved values of one formulation, indexed like its variables.
#[derive(Debug, Clone)]
pub struct Solution {
    pub statistics: SolveStatistics,
    values: Option<Vec<f64>>,
}

impl Solution {
    pub fn new(statistics: SolveStatistics, values: Option<Vec<f64>>) -> Self {
        Self { statistics, values }
    }

    pub fn status(&self) -> SolveStatus {
        self.statistics.status
    }

    pub fn values(&self) -> Result<&[f64], IspError> {
        self.values
            .as_deref()
            .ok_or(IspError::NoSolution(self.statistics.status))
    }

    /// Fails with `UnknownVariable` when `formulation` is not the one this
    /// solution was produced for and has no slot for `key`.
    pub fn value(&self, formulation: &Formulation, key: &VarKey) -> Result<f64, IspError> {
        let id = formulation.require(key)?;
        self.values()?
            .get(id.index())
            .copied()
            .ok_or_else(|| IspError::UnknownVariable(key.to_string()))
    }

    /// Whether a binary is set; keys outside the formulation count as unset.
    pub fn is_set(&self, formulation: &Formulation, key: &VarKey) -> Result<bool, IspError> {
        match formulation.var(key) {
            Some(_) => Ok(self.value(formulation, key)? > BINARY_THRESHOLD),
            None => Ok(false),
        }
    }

    /// Keys of every binary set in the solution.
    pub fn set_keys<'f>(&self, formulation: &'f Formulation) -> Result<Vec<&'f VarKey>, IspError> {
        let values = self.values()?;
        Ok(formulation
            .variables()
            .iter()
            .zip(values)
            .filter(|(_, v)| **v > BINARY_THRESHOLD)
            .map(|(k, _)| k)
            .collect())
    }
}

/// Loads `formulation` into `backend`, optimizes within `time_limit` and
/// snapshots the result. Time-limited and infeasible outcomes are returned
/// as they are.
#[instrument(skip_all, fields(kind = %formulation.kind(), objective = %formulation.objective()))]
pub fn solve<B: MilpBackend>(
    mut backend: B,
    formulation: &Formulation,
    time_limit: Duration,
) -> Result<Solution, IspError> {
    let vars: Vec<B::Var> = formulation
        .variables()
        .iter()
        .map(|key| backend.add_binary(&key.to_string()))
        .collect();
    for constraint in formulation.constraints() {
        let terms: Vec<(B::Var, i32)> = constraint
            .terms
            .iter()
            .map(|t| (vars[t.var.index()].clone(), t.coefficient))
            .collect();
        backend.add_constraint(&constraint.name, &terms, constraint.sense, constraint.rhs);
    }
    let objective = formulation.objective_function();
    let terms: Vec<(B::Var, i32)> = objective
        .terms
        .iter()
        .map(|t| (vars[t.var.index()].clone(), t.coefficient))
        .collect();
    backend.set_objective(&terms, objective.sense);
    event!(
        Level::DEBUG,
        "Loaded {} variables, {} constraints, objective bound {}",
        vars.len(),
        formulation.constraints().len(),
        objective.trivial_bound()
    );

    let status = backend.optimize(time_limit)?;
    let runtime = backend.runtime()?;
    event!(Level::INFO, "Solver finished: {} after {:?}", status, runtime);
    if !status.has_solution() {
        return Ok(Solution {
            statistics: SolveStatistics {
                status,
                objective: None,
                gap: None,
                runtime,
            },
            values: None,
        });
    }
    let values = vars
        .iter()
        .map(|v| backend.value(v))
        .collect::<Result<Vec<_>, _>>()?;
    let violated = formulation.violations(&values);
    if !violated.is_empty() {
        event!(
            Level::WARN,
            "Solution violates {} constraints, first: {}",
            violated.len(),
            violated[0].name
        );
    }
    let objective_value = backend.objective_value()?;
    if (objective.evaluate(&values) - objective_value).abs() > 1e-6 {
        event!(
            Level::WARN,
            "Backend objective {} differs from the recomputed {}",
            objective_value,
            objective.evaluate(&values)
        );
    }
    Ok(Solution {
        statistics: SolveStatistics {
            status,
            objective: Some(objective_value),
            gap: Some(backend.mip_gap()?),
            runtime,
        },
        values: Some(values),
    })
}
