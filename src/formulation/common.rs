use std::collections::HashMap;

use tracing::{Level, event};

use crate::error::IspError;
use crate::formulation::constraint::{
    Constraint, ConstraintFamily, LinearObjective, ObjectiveSense, Sense, Term,
};
use crate::formulation::pair::LanguagePair;
use crate::formulation::variable::{VarId, VarKey};
use crate::formulation::{Formulation, FormulationKind, Objective, OperationalLimits};
use crate::instance::Instance;

/// Mutable scratch space while a formulation is being assembled.
pub(crate) struct Draft<'a> {
    pub(crate) instance: &'a Instance,
    variables: Vec<VarKey>,
    index: HashMap<VarKey, VarId>,
    constraints: Vec<Constraint>,
}

impl<'a> Draft<'a> {
    pub(crate) fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            variables: vec![],
            index: HashMap::new(),
            constraints: vec![],
        }
    }

    pub(crate) fn binary(&mut self, key: VarKey) -> VarId {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = VarId(self.variables.len());
        self.index.insert(key.clone(), id);
        self.variables.push(key);
        id
    }

    pub(crate) fn id(&self, key: &VarKey) -> Result<VarId, IspError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| IspError::UnknownVariable(key.to_string()))
    }

    /// Records `sum(terms) <sense> rhs`; constraints without terms that
    /// hold anyway are dropped.
    pub(crate) fn constrain(
        &mut self,
        name: String,
        family: ConstraintFamily,
        terms: Vec<Term>,
        sense: Sense,
        rhs: i32,
    ) {
        if terms.is_empty() && sense.holds(0, i64::from(rhs)) {
            return;
        }
        self.constraints.push(Constraint {
            name,
            family,
            terms,
            sense,
            rhs,
        });
    }

    pub(crate) fn finish(
        self,
        kind: FormulationKind,
        objective: Objective,
        objective_terms: Vec<Term>,
    ) -> Formulation {
        event!(
            Level::INFO,
            "{} built with {} variables and {} constraints",
            kind,
            self.variables.len(),
            self.constraints.len()
        );
        Formulation {
            kind,
            objective,
            variables: self.variables,
            index: self.index,
            constraints: self.constraints,
            objective_function: LinearObjective {
                sense: ObjectiveSense::Maximize,
                terms: objective_terms,
            },
        }
    }
}

/// Ids of the variables shared by both formulations, grouped the way the
/// constraints consume them.
pub(crate) struct CoreVariables {
    /// Required pairs per session, in instance session order.
    pub(crate) session_pairs: Vec<(String, Vec<LanguagePair>)>,
    /// `z` ids per `(interpreter, session)`.
    pub(crate) covers_by_assignment: HashMap<(String, String), Vec<VarId>>,
    /// `z` ids per `(session, pair)`.
    pub(crate) covers_by_pair: HashMap<(String, LanguagePair), Vec<VarId>>,
}

impl CoreVariables {
    pub(crate) fn covers_of(&self, interpreter: &str, session: &str) -> &[VarId] {
        self.covers_by_assignment
            .get(&(interpreter.to_string(), session.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn covers_for(&self, session: &str, pair: &LanguagePair) -> &[VarId] {
        self.covers_by_pair
            .get(&(session.to_string(), pair.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn pairs(&self) -> impl Iterator<Item = (&str, &LanguagePair)> {
        self.session_pairs
            .iter()
            .flat_map(|(s, pairs)| pairs.iter().map(move |p| (s.as_str(), p)))
    }
}

/// Creates `x`, `y`, `z` and `t`.
pub(crate) fn core_variables(draft: &mut Draft) -> Result<CoreVariables, IspError> {
    let instance = draft.instance;
    let mut session_pairs = Vec::with_capacity(instance.sessions.len());
    let mut covers_by_assignment: HashMap<(String, String), Vec<VarId>> = HashMap::new();
    let mut covers_by_pair: HashMap<(String, LanguagePair), Vec<VarId>> = HashMap::new();

    for interpreter in &instance.interpreters {
        for session in &instance.sessions {
            draft.binary(VarKey::assign(interpreter, session));
        }
    }
    for session in &instance.sessions {
        let pairs = instance.session_pairs(session)?;
        for pair in &pairs {
            draft.binary(VarKey::direct(session, pair));
        }
        session_pairs.push((session.clone(), pairs));
    }
    for interpreter in &instance.interpreters {
        let spoken = instance.interpreter_languages(interpreter)?;
        for session in &instance.sessions {
            let required = instance.session_languages(session)?;
            let shared: Vec<&String> = spoken.intersection(required).collect();
            for pair in LanguagePair::combinations(shared) {
                let id = draft.binary(VarKey::covers(interpreter, session, &pair));
                covers_by_assignment
                    .entry((interpreter.clone(), session.clone()))
                    .or_default()
                    .push(id);
                covers_by_pair
                    .entry((session.clone(), pair))
                    .or_default()
                    .push(id);
            }
        }
    }
    for session in &instance.sessions {
        draft.binary(VarKey::full(session));
    }
    Ok(CoreVariables {
        session_pairs,
        covers_by_assignment,
        covers_by_pair,
    })
}

/// Constraints (1)-(5) and (7), identical in both formulations.
pub(crate) fn core_constraints(draft: &mut Draft, core: &CoreVariables) -> Result<(), IspError> {
    let instance = draft.instance;

    // (1)
    for block in &instance.blocks {
        let sessions = instance.sessions_in_block(block)?;
        for interpreter in &instance.interpreters {
            let mut terms = Vec::with_capacity(sessions.len());
            for session in sessions {
                let x = draft
                    .id(&VarKey::assign(interpreter, session))
                    .map_err(|_| IspError::UnknownSession {
                        block: block.clone(),
                        session: session.clone(),
                    })?;
                terms.push(Term::new(x, 1));
            }
            draft.constrain(
                format!("one_session_per_interpreter_{interpreter}_{block}"),
                ConstraintFamily::BlockExclusivity,
                terms,
                Sense::LessEqual,
                1,
            );
        }
    }

    for (session, pair) in core.pairs() {
        let y = draft.id(&VarKey::direct(session, pair))?;

        // (2)
        let mut terms = vec![Term::new(y, -1)];
        for interpreter in &instance.interpreters {
            if instance.speaks(interpreter, pair.first())?
                && instance.speaks(interpreter, pair.second())?
            {
                terms.push(Term::new(draft.id(&VarKey::assign(interpreter, session))?, 1));
            }
        }
        draft.constrain(
            format!("cover_pair_{session}_{}_{}", pair.first(), pair.second()),
            ConstraintFamily::CoverageRequiresPresence,
            terms,
            Sense::GreaterEqual,
            0,
        );

        let covers = core.covers_for(session, pair);

        // (5)
        let mut terms: Vec<Term> = covers.iter().map(|z| Term::new(*z, 1)).collect();
        terms.push(Term::new(y, -1));
        draft.constrain(
            format!("y_impl_z_{session}_{}_{}", pair.first(), pair.second()),
            ConstraintFamily::DirectImpliesCover,
            terms,
            Sense::GreaterEqual,
            0,
        );

        // (7)
        draft.constrain(
            format!("unique_translator_{session}_{}_{}", pair.first(), pair.second()),
            ConstraintFamily::UniqueTranslator,
            covers.iter().map(|z| Term::new(*z, 1)).collect(),
            Sense::LessEqual,
            1,
        );
    }

    for interpreter in &instance.interpreters {
        for session in &instance.sessions {
            let x = draft.id(&VarKey::assign(interpreter, session))?;
            let covers = core.covers_of(interpreter, session);

            // (3)
            let mut terms: Vec<Term> = covers.iter().map(|z| Term::new(*z, 1)).collect();
            terms.push(Term::new(x, -1));
            draft.constrain(
                format!("one_translation_per_session_{interpreter}_{session}"),
                ConstraintFamily::OnePairPerInterpreter,
                terms,
                Sense::LessEqual,
                0,
            );

            // (4)
            for z in covers {
                let name = format!("z_impl_x_{}", draft_key_suffix(draft, *z));
                draft.constrain(
                    name,
                    ConstraintFamily::CoverImpliesAssignment,
                    vec![Term::new(*z, 1), Term::new(x, -1)],
                    Sense::LessEqual,
                    0,
                );
            }
        }
    }
    Ok(())
}

/// `t[s] <= c[s,p]` for every pair, where `c` is `y` or `u` depending on
/// the formulation.
pub(crate) fn full_coverage<F>(
    draft: &mut Draft,
    core: &CoreVariables,
    coverage: F,
    tight: bool,
) -> Result<(), IspError>
where
    F: Fn(&str, &LanguagePair) -> VarKey,
{
    for (session, pairs) in &core.session_pairs {
        let t = draft.id(&VarKey::full(session))?;
        let mut indicators = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let key = coverage(session.as_str(), pair);
            let c = draft.id(&key)?;
            indicators.push(c);
            draft.constrain(
                format!("t_impl_{}_{session}_{}_{}", key.symbol(), pair.first(), pair.second()),
                ConstraintFamily::FullImpliesCovered,
                vec![Term::new(t, 1), Term::new(c, -1)],
                Sense::LessEqual,
                0,
            );
        }
        if tight {
            let mut terms = vec![Term::new(t, 1)];
            terms.extend(indicators.iter().map(|c| Term::new(*c, -1)));
            let pair_count = i32::try_from(pairs.len())
                .map_err(|_| IspError::InvalidInstance(format!("too many pairs in {session}")))?;
            draft.constrain(
                format!("t_recognizes_{session}"),
                ConstraintFamily::FullRecognition,
                terms,
                Sense::GreaterEqual,
                1 - pair_count,
            );
        }
    }
    Ok(())
}

/// `y[s,p] >= z[i,s,p]`.
pub(crate) fn direct_recognition(draft: &mut Draft, core: &CoreVariables) -> Result<(), IspError> {
    for (session, pair) in core.pairs() {
        let y = draft.id(&VarKey::direct(session, pair))?;
        for z in core.covers_for(session, pair) {
            let name = format!("y_recognizes_{}", draft_key_suffix(draft, *z));
            draft.constrain(
                name,
                ConstraintFamily::DirectRecognition,
                vec![Term::new(y, 1), Term::new(*z, -1)],
                Sense::GreaterEqual,
                0,
            );
        }
    }
    Ok(())
}

/// Workload cap (8) and the sliding consecutive-block cap (9). Schedules
/// with fewer blocks than the window get no window constraint.
pub(crate) fn operational_constraints(
    draft: &mut Draft,
    limits: &OperationalLimits,
) -> Result<(), IspError> {
    let instance = draft.instance;
    let max_sessions = i32::try_from(limits.max_sessions).unwrap_or(i32::MAX);
    let per_window = i32::try_from(limits.max_sessions_per_window).unwrap_or(i32::MAX);
    for interpreter in &instance.interpreters {
        let mut terms = Vec::with_capacity(instance.sessions.len());
        for session in &instance.sessions {
            terms.push(Term::new(draft.id(&VarKey::assign(interpreter, session))?, 1));
        }
        draft.constrain(
            format!("max_sessions_per_interpreter_{interpreter}"),
            ConstraintFamily::Workload,
            terms,
            Sense::LessEqual,
            max_sessions,
        );
    }

    if limits.window_blocks == 0 || instance.blocks.len() < limits.window_blocks {
        event!(
            Level::DEBUG,
            "{} blocks, no window of {} consecutive blocks",
            instance.blocks.len(),
            limits.window_blocks
        );
        return Ok(());
    }
    for interpreter in &instance.interpreters {
        for window in instance.blocks.windows(limits.window_blocks) {
            let mut terms = vec![];
            for block in window {
                for session in instance.sessions_in_block(block)? {
                    let x = draft
                        .id(&VarKey::assign(interpreter, session))
                        .map_err(|_| IspError::UnknownSession {
                            block: block.clone(),
                            session: session.clone(),
                        })?;
                    terms.push(Term::new(x, 1));
                }
            }
            draft.constrain(
                format!(
                    "max_{}_in_{}_consecutive_blocks_{interpreter}_from_{}",
                    limits.max_sessions_per_window, limits.window_blocks, window[0]
                ),
                ConstraintFamily::ConsecutiveBlocks,
                terms,
                Sense::LessEqual,
                per_window,
            );
        }
    }
    Ok(())
}

pub(crate) fn draft_key_suffix(draft: &Draft, id: VarId) -> String {
    let key = &draft.variables[id.index()];
    key.to_string()
        .trim_start_matches(key.symbol())
        .trim_matches(|c| c == '[' || c == ']')
        .replace(',', "_")
}
