use std::collections::HashMap;

use tracing::{Level, event, instrument};

use crate::error::IspError;
use crate::formulation::builder::FormulationParams;
use crate::formulation::common::{
    CoreVariables, Draft, core_constraints, core_variables, direct_recognition,
    draft_key_suffix, full_coverage, operational_constraints,
};
use crate::formulation::constraint::{ConstraintFamily, Sense, Term};
use crate::formulation::pair::LanguagePair;
use crate::formulation::variable::{VarId, VarKey};
use crate::formulation::{BridgeLanguages, Formulation, FormulationKind, Objective};
use crate::instance::Instance;

/// `w` ids grouped for constraints (10) and (11).
struct BridgeVariables {
    by_pair: HashMap<(String, LanguagePair), Vec<VarId>>,
    by_participant: HashMap<(String, String), Vec<VarId>>,
    endpoints: Vec<(VarId, String, String, String)>,
}

/// Builds ISP-Bridge: the base vocabulary plus `w` (bridged coverage) and
/// `u` (coverage by either mechanism). Does not reuse a base formulation.
#[instrument(skip_all)]
pub fn build(instance: &Instance, params: &FormulationParams) -> Result<Formulation, IspError> {
    let mut draft = Draft::new(instance);
    let core = core_variables(&mut draft)?;
    let bridges = bridge_variables(&mut draft, params.bridge_languages)?;
    for (session, pair) in core.pairs() {
        draft.binary(VarKey::covered(session, pair));
    }
    event!(
        Level::DEBUG,
        "{} bridge variables",
        bridges.endpoints.len()
    );

    core_constraints(&mut draft, &core)?;
    // (6')
    full_coverage(
        &mut draft,
        &core,
        |session, pair| VarKey::covered(session, pair),
        params.tight_indicators,
    )?;
    covered_implies_direct_or_bridge(&mut draft, &core, &bridges)?;
    single_participation(&mut draft, &core, &bridges)?;
    if params.bridge_presence {
        bridge_requires_presence(&mut draft, &bridges)?;
    }
    if params.tight_indicators {
        direct_recognition(&mut draft, &core)?;
        covered_recognition(&mut draft, &core, &bridges)?;
    }
    if let Some(limits) = &params.operational {
        operational_constraints(&mut draft, limits)?;
    }

    let objective_terms = match params.objective {
        Objective::CoveredPairs => core
            .pairs()
            .map(|(session, pair)| draft.id(&VarKey::covered(session, pair)))
            .map(|id| id.map(|id| Term::new(id, 1)))
            .collect::<Result<Vec<_>, _>>()?,
        Objective::CoveredSessions => instance
            .sessions
            .iter()
            .map(|session| draft.id(&VarKey::full(session)).map(|id| Term::new(id, 1)))
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(draft.finish(FormulationKind::Bridging, params.objective, objective_terms))
}

/// One `w` per unordered interpreter pair, session pair and bridge
/// language, when one interpreter speaks `l1`, the other `l2`, and both the
/// bridge.
fn bridge_variables(
    draft: &mut Draft,
    policy: BridgeLanguages,
) -> Result<BridgeVariables, IspError> {
    let instance = draft.instance;
    let mut bridges = BridgeVariables {
        by_pair: HashMap::new(),
        by_participant: HashMap::new(),
        endpoints: vec![],
    };
    for (idx, first) in instance.interpreters.iter().enumerate() {
        let first_speaks = instance.interpreter_languages(first)?;
        for second in &instance.interpreters[idx + 1..] {
            let second_speaks = instance.interpreter_languages(second)?;
            let common: Vec<&String> = first_speaks.intersection(second_speaks).collect();
            if common.is_empty() {
                continue;
            }
            for session in &instance.sessions {
                let required = instance.session_languages(session)?;
                for pair in instance.session_pairs(session)? {
                    let forward =
                        first_speaks.contains(pair.first()) && second_speaks.contains(pair.second());
                    let backward =
                        first_speaks.contains(pair.second()) && second_speaks.contains(pair.first());
                    if !forward && !backward {
                        continue;
                    }
                    for via in &common {
                        if pair.contains(via) {
                            continue;
                        }
                        if policy == BridgeLanguages::Session && !required.contains(*via) {
                            continue;
                        }
                        let w = draft.binary(VarKey::bridge(first, second, session, &pair, via));
                        bridges
                            .by_pair
                            .entry((session.clone(), pair.clone()))
                            .or_default()
                            .push(w);
                        for participant in [first, second] {
                            bridges
                                .by_participant
                                .entry((participant.clone(), session.clone()))
                                .or_default()
                                .push(w);
                        }
                        bridges
                            .endpoints
                            .push((w, first.clone(), second.clone(), session.clone()));
                    }
                }
            }
        }
    }
    Ok(bridges)
}

/// (10) `u <= y + sum w`.
fn covered_implies_direct_or_bridge(
    draft: &mut Draft,
    core: &CoreVariables,
    bridges: &BridgeVariables,
) -> Result<(), IspError> {
    for (session, pair) in core.pairs() {
        let u = draft.id(&VarKey::covered(session, pair))?;
        let y = draft.id(&VarKey::direct(session, pair))?;
        let mut terms = vec![Term::new(y, 1), Term::new(u, -1)];
        if let Some(ws) = bridges.by_pair.get(&(session.to_string(), pair.clone())) {
            terms.extend(ws.iter().map(|w| Term::new(*w, 1)));
        }
        draft.constrain(
            format!("u_impl_y_or_w_{session}_{}_{}", pair.first(), pair.second()),
            ConstraintFamily::CoveredImpliesDirectOrBridge,
            terms,
            Sense::GreaterEqual,
            0,
        );
    }
    Ok(())
}

/// (11) every `z` and `w` an interpreter takes part in, per session, <= 1.
fn single_participation(
    draft: &mut Draft,
    core: &CoreVariables,
    bridges: &BridgeVariables,
) -> Result<(), IspError> {
    let instance = draft.instance;
    for interpreter in &instance.interpreters {
        for session in &instance.sessions {
            let mut terms: Vec<Term> = core
                .covers_of(interpreter, session)
                .iter()
                .map(|z| Term::new(*z, 1))
                .collect();
            if let Some(ws) = bridges
                .by_participant
                .get(&(interpreter.clone(), session.clone()))
            {
                terms.extend(ws.iter().map(|w| Term::new(*w, 1)));
            }
            draft.constrain(
                format!("one_role_per_session_{interpreter}_{session}"),
                ConstraintFamily::SingleParticipation,
                terms,
                Sense::LessEqual,
                1,
            );
        }
    }
    Ok(())
}

/// (12) a bridge occupies both interpreters in the session. Off unless
/// asked for.
fn bridge_requires_presence(draft: &mut Draft, bridges: &BridgeVariables) -> Result<(), IspError> {
    for (w, first, second, session) in &bridges.endpoints {
        for interpreter in [first, second] {
            let x = draft.id(&VarKey::assign(interpreter, session))?;
            let name = format!("w_impl_x_{}_{interpreter}", draft_key_suffix(draft, *w));
            draft.constrain(
                name,
                ConstraintFamily::BridgeRequiresPresence,
                vec![Term::new(*w, 1), Term::new(x, -1)],
                Sense::LessEqual,
                0,
            );
        }
    }
    Ok(())
}

/// `u >= y` and `u >= w`.
fn covered_recognition(
    draft: &mut Draft,
    core: &CoreVariables,
    bridges: &BridgeVariables,
) -> Result<(), IspError> {
    for (session, pair) in core.pairs() {
        let u = draft.id(&VarKey::covered(session, pair))?;
        let y = draft.id(&VarKey::direct(session, pair))?;
        let mut witnesses = vec![y];
        if let Some(ws) = bridges.by_pair.get(&(session.to_string(), pair.clone())) {
            witnesses.extend(ws.iter().copied());
        }
        for witness in witnesses {
            let name = format!("u_recognizes_{}", draft_key_suffix(draft, witness));
            draft.constrain(
                name,
                ConstraintFamily::CoveredRecognition,
                vec![Term::new(u, 1), Term::new(witness, -1)],
                Sense::GreaterEqual,
                0,
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::formulation::bridge::build;
    use crate::formulation::builder::{FormulationParams, FormulationParamsBuilder};
    use crate::formulation::constraint::ConstraintFamily;
    use crate::formulation::pair::LanguagePair;
    use crate::formulation::variable::VarKey;
    use crate::formulation::{BridgeLanguages, FormulationKind, Objective};
    use crate::instance::Instance;
    use crate::instance::tests::scenario;

    fn bridging() -> FormulationParams {
        FormulationParamsBuilder::default()
            .bridging(true)
            .build()
            .unwrap()
    }

    /// Session needs only EN and DE; the shared language FR is not required.
    fn outside_bridge() -> Instance {
        let mut instance = scenario();
        instance.languages_per_session.insert(
            "S1".to_string(),
            ["EN", "DE"].iter().map(|l| l.to_string()).collect(),
        );
        instance
    }

    #[test]
    fn scenario_bridge_domain() {
        let formulation = build(&scenario(), &bridging()).unwrap();
        assert_eq!(formulation.kind(), FormulationKind::Bridging);
        let bridges: Vec<String> = formulation
            .keys_with_symbol('w')
            .map(|(_, k)| k.to_string())
            .collect();
        assert_eq!(bridges, vec!["w[I1,I2,S1,DE,EN,FR]"]);
        assert_eq!(formulation.keys_with_symbol('u').count(), 3);
        assert_eq!(formulation.keys_with_symbol('y').count(), 3);
    }

    #[test]
    fn bridging_families() {
        let formulation = build(&scenario(), &bridging()).unwrap();
        let count = |f| formulation.constraints_of(f).count();
        assert_eq!(count(ConstraintFamily::CoveredImpliesDirectOrBridge), 3);
        assert_eq!(count(ConstraintFamily::SingleParticipation), 2);
        assert_eq!(count(ConstraintFamily::BridgeRequiresPresence), 0);
        assert_eq!(count(ConstraintFamily::FullImpliesCovered), 3);
        // u >= y for 3 pairs plus u >= w for the single bridge
        assert_eq!(count(ConstraintFamily::CoveredRecognition), 4);
        let w = formulation
            .var(&VarKey::bridge("I1", "I2", "S1", &LanguagePair::new("EN", "DE"), "FR"))
            .unwrap();
        let participation: Vec<_> = formulation
            .constraints_of(ConstraintFamily::SingleParticipation)
            .collect();
        assert!(participation.iter().all(|c| c.involves(w) && c.terms.len() == 2));
        for c in formulation.constraints_of(ConstraintFamily::FullImpliesCovered) {
            assert!(c.terms.iter().any(|t| formulation.key(t.var).unwrap().symbol() == 'u'));
        }
    }

    #[test]
    fn presence_links_are_opt_in() {
        let params = FormulationParamsBuilder::default()
            .bridging(true)
            .bridge_presence(true)
            .build()
            .unwrap();
        let formulation = build(&scenario(), &params).unwrap();
        let names: Vec<&str> = formulation
            .constraints_of(ConstraintFamily::BridgeRequiresPresence)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["w_impl_x_I1_I2_S1_DE_EN_FR_I1", "w_impl_x_I1_I2_S1_DE_EN_FR_I2"]
        );
    }

    #[test]
    fn recognition_names_use_model_notation() {
        let formulation = build(&scenario(), &bridging()).unwrap();
        let names: Vec<&str> = formulation
            .constraints_of(ConstraintFamily::CoveredRecognition)
            .map(|c| c.name.as_str())
            .collect();
        assert!(names.contains(&"u_recognizes_S1_DE_EN"));
        assert!(names.contains(&"u_recognizes_I1_I2_S1_DE_EN_FR"));
        assert!(names.iter().all(|n| !n.contains("_v")));
    }

    #[test]
    fn of1_sums_u() {
        let formulation = build(&scenario(), &bridging()).unwrap();
        assert_eq!(formulation.objective(), Objective::CoveredPairs);
        assert!(formulation
            .objective_function()
            .terms
            .iter()
            .all(|t| formulation.key(t.var).unwrap().symbol() == 'u'));
    }

    #[test]
    fn bridge_language_may_lie_outside_the_session() {
        let formulation = build(&outside_bridge(), &bridging()).unwrap();
        assert_eq!(formulation.keys_with_symbol('w').count(), 1);
    }

    #[test]
    fn session_policy_restricts_bridge_languages() {
        let params = FormulationParamsBuilder::default()
            .bridging(true)
            .bridge_languages(BridgeLanguages::Session)
            .build()
            .unwrap();
        assert_eq!(build(&outside_bridge(), &params).unwrap().keys_with_symbol('w').count(), 0);
        assert_eq!(build(&scenario(), &params).unwrap().keys_with_symbol('w').count(), 1);
    }

    #[test]
    fn reversed_orientation_is_a_bridge_too() {
        let mut instance = scenario();
        instance.languages_per_interpreter.insert(
            "I1".to_string(),
            ["DE", "FR"].iter().map(|l| l.to_string()).collect(),
        );
        instance.languages_per_interpreter.insert(
            "I2".to_string(),
            ["EN", "FR"].iter().map(|l| l.to_string()).collect(),
        );
        let formulation = build(&instance, &bridging()).unwrap();
        assert!(
            formulation
                .var(&VarKey::bridge("I1", "I2", "S1", &LanguagePair::new("DE", "EN"), "FR"))
                .is_some()
        );
    }

    #[test]
    fn no_common_language_no_bridge() {
        let mut instance = scenario();
        instance.languages_per_interpreter.insert(
            "I2".to_string(),
            ["DE", "IT"].iter().map(|l| l.to_string()).collect(),
        );
        let formulation = build(&instance, &bridging()).unwrap();
        assert_eq!(formulation.keys_with_symbol('w').count(), 0);
    }
}
