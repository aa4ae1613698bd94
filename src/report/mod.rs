use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::Serialize;

use crate::error::IspError;
use crate::formulation::pair::LanguagePair;
use crate::formulation::variable::VarKey;
use crate::formulation::{Formulation, FormulationKind, Objective};
use crate::instance::Instance;
use crate::solver::{Solution, SolveStatus};

pub mod display;

/// Fraction of each session's language pairs that the solution covers.
/// Sessions with fewer than two languages have nothing to cover and get 0.
pub fn coverage_ratios(
    instance: &Instance,
    formulation: &Formulation,
    solution: &Solution,
) -> Result<BTreeMap<String, f64>, IspError> {
    let mut ratios = BTreeMap::new();
    for session in &instance.sessions {
        let pairs = instance.session_pairs(session)?;
        let ratio = if pairs.is_empty() {
            0.0
        } else {
            let mut covered = 0;
            for pair in &pairs {
                if solution.is_set(formulation, &formulation.coverage_key(session, pair))? {
                    covered += 1;
                }
            }
            covered as f64 / pairs.len() as f64
        };
        ratios.insert(session.clone(), ratio);
    }
    Ok(ratios)
}

/// One line of the solution report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Assignment {
    Direct {
        interpreter: String,
        session: String,
        pair: LanguagePair,
    },
    Bridge {
        first: String,
        second: String,
        session: String,
        pair: LanguagePair,
        via: String,
    },
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Assignment::Direct {
                interpreter,
                session,
                pair,
            } => write!(f, "{interpreter} assigned to {session} covers pair {pair}."),
            Assignment::Bridge {
                first,
                second,
                session,
                pair,
                via,
            } => write!(
                f,
                "{first} and {second} cover the pair {pair} in {session} via bridge language {via}."
            ),
        }
    }
}

/// Every set `z`, then every set `w`, in variable order.
pub fn assignments(
    formulation: &Formulation,
    solution: &Solution,
) -> Result<Vec<Assignment>, IspError> {
    let mut direct = vec![];
    let mut bridges = vec![];
    for key in solution.set_keys(formulation)? {
        match key {
            VarKey::Covers {
                interpreter,
                session,
                pair,
            } => direct.push(Assignment::Direct {
                interpreter: interpreter.clone(),
                session: session.clone(),
                pair: pair.clone(),
            }),
            VarKey::Bridge {
                first,
                second,
                session,
                pair,
                via,
            } => bridges.push(Assignment::Bridge {
                first: first.clone(),
                second: second.clone(),
                session: session.clone(),
                pair: pair.clone(),
                via: via.clone(),
            }),
            _ => {}
        }
    }
    direct.extend(bridges);
    Ok(direct)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SolveSummary {
    pub kind: FormulationKind,
    pub objective: Objective,
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    /// Relative gap in percent.
    pub gap_percent: Option<f64>,
    pub runtime: Duration,
}

impl SolveSummary {
    pub fn new(formulation: &Formulation, solution: &Solution) -> Self {
        let stats = &solution.statistics;
        Self {
            kind: formulation.kind(),
            objective: formulation.objective(),
            status: stats.status,
            objective_value: stats.objective,
            gap_percent: stats.gap.map(|g| g * 100.0),
            runtime: stats.runtime,
        }
    }
}

impl Display for SolveSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} ({}): {}", self.kind, self.objective, self.status)?;
        match self.objective_value {
            Some(v) => writeln!(f, "Objective value: {v}")?,
            None => writeln!(f, "Objective value: -")?,
        }
        match self.gap_percent {
            Some(g) => writeln!(f, "Gap: {g:.2}%")?,
            None => writeln!(f, "Gap: -")?,
        }
        write!(f, "Runtime: {:.3}s", self.runtime.as_secs_f64())
    }
}

/// Per-session coverage ratios of two solved runs side by side.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageComparison {
    pub left: String,
    pub right: String,
    pub rows: Vec<(String, f64, f64)>,
}

impl CoverageComparison {
    pub fn new(
        left: &str,
        left_ratios: &BTreeMap<String, f64>,
        right: &str,
        right_ratios: &BTreeMap<String, f64>,
    ) -> Self {
        let rows = left_ratios
            .iter()
            .map(|(session, l)| {
                let r = right_ratios.get(session).copied().unwrap_or(0.0);
                (session.clone(), *l, r)
            })
            .collect();
        Self {
            left: left.to_string(),
            right: right.to_string(),
            rows,
        }
    }

    /// Mean ratio of the left and right run.
    pub fn means(&self) -> (f64, f64) {
        if self.rows.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.rows.len() as f64;
        let (l, r) = self
            .rows
            .iter()
            .fold((0.0, 0.0), |(l, r), (_, a, b)| (l + a, r + b));
        (l / n, r / n)
    }
}
