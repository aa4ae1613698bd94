use std::time::{Duration, Instant};

use tracing::{Level, event};
use z3::ast::{Ast, Bool};
use z3::{Model, Optimize, Params, SatResult};

use crate::error::IspError;
use crate::error::IspError::{ModelGenerationError, NotSolved};
use crate::formulation::constraint::{ObjectiveSense, Sense};
use crate::solver::{MilpBackend, SolveStatus, relative_gap};

#[derive(Debug)]
struct Outcome {
    status: SolveStatus,
    model: Option<Model>,
    runtime: Duration,
}

/// [`MilpBackend`] on top of the Z3 `Optimize` engine. Linear constraints
/// become pseudo-boolean constraints and the objective becomes weighted
/// soft constraints.
#[derive(Debug)]
pub struct OptimizationBackend {
    solver: Optimize,
    hard: Vec<Bool>,
    objective: Vec<(Bool, i32)>,
    sense: ObjectiveSense,
    outcome: Option<Outcome>,
}

impl Default for OptimizationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationBackend {
    pub fn new() -> Self {
        Self {
            solver: Optimize::new(),
            hard: vec![],
            objective: vec![],
            sense: ObjectiveSense::Maximize,
            outcome: None,
        }
    }

    fn outcome(&self) -> Result<&Outcome, IspError> {
        self.outcome.as_ref().ok_or(NotSolved)
    }

    fn model(&self) -> Result<&Model, IspError> {
        let outcome = self.outcome()?;
        outcome
            .model
            .as_ref()
            .ok_or(IspError::NoSolution(outcome.status))
    }

    /// Negative coefficients are moved onto the negated literal so that
    /// Z3 only sees non-negative weights: `c*b = c + |c|*!b`.
    fn pseudo_boolean(terms: &[(Bool, i32)], sense: Sense, rhs: i32) -> Bool {
        if terms.is_empty() {
            return Bool::from_bool(sense.holds(0, i64::from(rhs)));
        }
        let mut bound = rhs;
        let literals: Vec<(Bool, i32)> = terms
            .iter()
            .map(|(var, coefficient)| {
                if *coefficient < 0 {
                    bound -= coefficient;
                    (var.not(), -coefficient)
                } else {
                    (var.clone(), *coefficient)
                }
            })
            .collect();
        let pbs: Vec<(&Bool, i32)> = literals.iter().map(|(b, c)| (b, *c)).collect();
        match sense {
            Sense::LessEqual => Bool::pb_le(&pbs, bound),
            Sense::GreaterEqual => Bool::pb_ge(&pbs, bound),
            Sense::Equal => Bool::pb_eq(&pbs, bound),
        }
    }

    fn holds(model: &Model, constraint: &Bool) -> bool {
        model
            .eval(constraint, true)
            .and_then(|b| b.as_bool())
            .unwrap_or(false)
    }
}

impl MilpBackend for OptimizationBackend {
    type Var = Bool;

    fn add_binary(&mut self, name: &str) -> Bool {
        Bool::new_const(name.to_string())
    }

    fn add_constraint(&mut self, name: &str, terms: &[(Bool, i32)], sense: Sense, rhs: i32) {
        event!(Level::TRACE, "Asserting {}", name);
        let constraint = Self::pseudo_boolean(terms, sense, rhs);
        self.solver.assert(&constraint);
        self.hard.push(constraint);
    }

    fn set_objective(&mut self, terms: &[(Bool, i32)], sense: ObjectiveSense) {
        self.sense = sense;
        self.objective = terms.to_vec();
        for (var, coefficient) in terms {
            let rewarded = match (sense, *coefficient > 0) {
                (ObjectiveSense::Maximize, true) | (ObjectiveSense::Minimize, false) => var.clone(),
                _ => var.not(),
            };
            if *coefficient != 0 {
                self.solver
                    .assert_soft(&rewarded, coefficient.unsigned_abs() as usize, None);
            }
        }
    }

    fn optimize(&mut self, time_limit: Duration) -> Result<SolveStatus, IspError> {
        let mut params = Params::new();
        params.set_u32(
            "timeout",
            u32::try_from(time_limit.as_millis()).unwrap_or(u32::MAX),
        );
        self.solver.set_params(&params);
        let start = Instant::now();
        let result = self.solver.check(&[]);
        let runtime = start.elapsed();
        let (status, model) = match result {
            SatResult::Sat => {
                let model = self.solver.get_model().ok_or(ModelGenerationError)?;
                (SolveStatus::Optimal, Some(model))
            }
            SatResult::Unsat => (SolveStatus::Infeasible, None),
            SatResult::Unknown => match self.solver.get_model() {
                Some(model) if self.hard.iter().all(|c| Self::holds(&model, c)) => {
                    (SolveStatus::TimeLimit, Some(model))
                }
                _ => (SolveStatus::TimeLimitNoSolution, None),
            },
        };
        self.outcome = Some(Outcome {
            status,
            model,
            runtime,
        });
        Ok(status)
    }

    fn status(&self) -> Result<SolveStatus, IspError> {
        Ok(self.outcome()?.status)
    }

    fn value(&self, var: &Bool) -> Result<f64, IspError> {
        let set = self
            .model()?
            .eval(var, true)
            .and_then(|b| b.as_bool())
            .ok_or(ModelGenerationError)?;
        Ok(if set { 1.0 } else { 0.0 })
    }

    fn objective_value(&self) -> Result<f64, IspError> {
        let mut total = 0.0;
        for (var, coefficient) in &self.objective {
            total += self.value(var)? * f64::from(*coefficient);
        }
        Ok(total)
    }

    fn runtime(&self) -> Result<Duration, IspError> {
        Ok(self.outcome()?.runtime)
    }

    fn mip_gap(&self) -> Result<f64, IspError> {
        if self.outcome()?.status == SolveStatus::Optimal {
            return Ok(0.0);
        }
        let incumbent = self.objective_value()?;
        // Z3 reports no dual bound, so the gap is taken against the best
        // value the objective could reach at all.
        let bound: f64 = self
            .objective
            .iter()
            .map(|(_, c)| f64::from(*c))
            .filter(|c| match self.sense {
                ObjectiveSense::Maximize => *c > 0.0,
                ObjectiveSense::Minimize => *c < 0.0,
            })
            .sum();
        Ok(relative_gap(bound, incumbent))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::error::IspError;
    use crate::formulation::constraint::{ObjectiveSense, Sense};
    use crate::solver::optimize::OptimizationBackend;
    use crate::solver::{MilpBackend, SolveStatus};

    #[test]
    fn queries_before_optimize_are_usage_errors() {
        let mut backend = OptimizationBackend::new();
        let a = backend.add_binary("a");
        assert!(matches!(backend.status(), Err(IspError::NotSolved)));
        assert!(matches!(backend.value(&a), Err(IspError::NotSolved)));
        assert!(matches!(backend.runtime(), Err(IspError::NotSolved)));
        assert!(matches!(backend.objective_value(), Err(IspError::NotSolved)));
        assert!(matches!(backend.mip_gap(), Err(IspError::NotSolved)));
    }

    #[test]
    fn negative_coefficients_are_respected() {
        let mut backend = OptimizationBackend::new();
        let a = backend.add_binary("a");
        let b = backend.add_binary("b");
        // b <= a, a + b <= 1
        backend.add_constraint("b_impl_a", &[(b.clone(), 1), (a.clone(), -1)], Sense::LessEqual, 0);
        backend.add_constraint("at_most_one", &[(a.clone(), 1), (b.clone(), 1)], Sense::LessEqual, 1);
        backend.set_objective(&[(b.clone(), 1)], ObjectiveSense::Maximize);
        let status = backend.optimize(Duration::from_secs(10)).unwrap();
        assert_eq!(status, SolveStatus::Optimal);
        assert_eq!(backend.value(&b).unwrap(), 0.0);
        assert_eq!(backend.objective_value().unwrap(), 0.0);
        assert_eq!(backend.mip_gap().unwrap(), 0.0);
    }

    #[test]
    fn maximizes_weighted_terms() {
        let mut backend = OptimizationBackend::new();
        let a = backend.add_binary("a");
        let b = backend.add_binary("b");
        backend.add_constraint("choose", &[(a.clone(), 1), (b.clone(), 1)], Sense::Equal, 1);
        backend.set_objective(&[(a.clone(), 1), (b.clone(), 3)], ObjectiveSense::Maximize);
        backend.optimize(Duration::from_secs(10)).unwrap();
        assert_eq!(backend.value(&b).unwrap(), 1.0);
        assert_eq!(backend.objective_value().unwrap(), 3.0);
    }

    #[test]
    fn infeasible_models_have_no_values() {
        let mut backend = OptimizationBackend::new();
        let a = backend.add_binary("a");
        backend.add_constraint("on", &[(a.clone(), 1)], Sense::GreaterEqual, 1);
        backend.add_constraint("off", &[(a.clone(), 1)], Sense::LessEqual, 0);
        backend.set_objective(&[(a.clone(), 1)], ObjectiveSense::Maximize);
        assert_eq!(backend.optimize(Duration::from_secs(10)).unwrap(), SolveStatus::Infeasible);
        assert!(matches!(
            backend.value(&a),
            Err(IspError::NoSolution(SolveStatus::Infeasible))
        ));
    }

    #[test]
    fn empty_constraints_become_constants() {
        let mut backend = OptimizationBackend::new();
        backend.add_constraint("impossible", &[], Sense::GreaterEqual, 1);
        assert_eq!(backend.optimize(Duration::from_secs(10)).unwrap(), SolveStatus::Infeasible);
    }
}
