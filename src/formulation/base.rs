use tracing::instrument;

use crate::error::IspError;
use crate::formulation::builder::FormulationParams;
use crate::formulation::common::{
    Draft, core_constraints, core_variables, direct_recognition, full_coverage,
    operational_constraints,
};
use crate::formulation::constraint::Term;
use crate::formulation::variable::VarKey;
use crate::formulation::{Formulation, FormulationKind, Objective};
use crate::instance::Instance;

/// Builds the plain ISP model: variables `x`, `y`, `z`, `t`, constraints
/// (1)-(7), optionally (8)-(9), and the selected objective.
#[instrument(skip_all)]
pub fn build(instance: &Instance, params: &FormulationParams) -> Result<Formulation, IspError> {
    let mut draft = Draft::new(instance);
    let core = core_variables(&mut draft)?;
    core_constraints(&mut draft, &core)?;
    full_coverage(
        &mut draft,
        &core,
        |session, pair| VarKey::direct(session, pair),
        params.tight_indicators,
    )?;
    if params.tight_indicators {
        direct_recognition(&mut draft, &core)?;
    }
    if let Some(limits) = &params.operational {
        operational_constraints(&mut draft, limits)?;
    }

    let objective_terms = match params.objective {
        Objective::CoveredPairs => core
            .pairs()
            .map(|(session, pair)| draft.id(&VarKey::direct(session, pair)))
            .map(|id| id.map(|id| Term::new(id, 1)))
            .collect::<Result<Vec<_>, _>>()?,
        Objective::CoveredSessions => instance
            .sessions
            .iter()
            .map(|session| draft.id(&VarKey::full(session)).map(|id| Term::new(id, 1)))
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(draft.finish(FormulationKind::Base, params.objective, objective_terms))
}

#[cfg(test)]
mod tests {
    use crate::formulation::base::build;
    use crate::formulation::builder::{FormulationParams, FormulationParamsBuilder};
    use crate::formulation::constraint::ConstraintFamily;
    use crate::formulation::pair::LanguagePair;
    use crate::formulation::variable::VarKey;
    use crate::formulation::{FormulationKind, Objective, OperationalLimits};
    use crate::instance::Instance;
    use crate::instance::tests::scenario;

    fn blocks_instance(blocks: usize) -> Instance {
        let mut instance = scenario();
        instance.sessions.clear();
        instance.blocks.clear();
        instance.sessions_per_block.clear();
        instance.languages_per_session.clear();
        for b in 1..=blocks {
            let (block, session) = (format!("B{b}"), format!("S{b}"));
            instance.blocks.push(block.clone());
            instance.sessions.push(session.clone());
            instance
                .sessions_per_block
                .insert(block, vec![session.clone()]);
            instance.languages_per_session.insert(
                session,
                ["EN", "FR"].iter().map(|l| l.to_string()).collect(),
            );
        }
        instance
    }

    #[test]
    fn scenario_variable_domains() {
        let formulation = build(&scenario(), &FormulationParams::default()).unwrap();
        assert_eq!(formulation.kind(), FormulationKind::Base);
        assert_eq!(formulation.keys_with_symbol('x').count(), 2);
        assert_eq!(formulation.keys_with_symbol('y').count(), 3);
        assert_eq!(formulation.keys_with_symbol('t').count(), 1);
        let covers: Vec<String> = formulation
            .keys_with_symbol('z')
            .map(|(_, k)| k.to_string())
            .collect();
        assert_eq!(covers, vec!["z[I1,S1,EN,FR]", "z[I2,S1,DE,FR]"]);
        assert!(formulation.keys_with_symbol('w').next().is_none());
        assert!(
            formulation
                .var(&VarKey::direct("S1", &LanguagePair::new("EN", "DE")))
                .is_some()
        );
    }

    #[test]
    fn every_family_of_the_base_model_is_present() {
        let formulation = build(&scenario(), &FormulationParams::default()).unwrap();
        let count = |f| formulation.constraints_of(f).count();
        assert_eq!(count(ConstraintFamily::BlockExclusivity), 2);
        assert_eq!(count(ConstraintFamily::CoverageRequiresPresence), 3);
        assert_eq!(count(ConstraintFamily::OnePairPerInterpreter), 2);
        assert_eq!(count(ConstraintFamily::CoverImpliesAssignment), 2);
        assert_eq!(count(ConstraintFamily::DirectImpliesCover), 3);
        assert_eq!(count(ConstraintFamily::FullImpliesCovered), 3);
        // the (DE, EN) pair has no candidate, so its (7) is trivially true
        assert_eq!(count(ConstraintFamily::UniqueTranslator), 2);
        assert_eq!(count(ConstraintFamily::Workload), 0);
        assert_eq!(count(ConstraintFamily::CoveredImpliesDirectOrBridge), 0);
        assert_eq!(count(ConstraintFamily::DirectRecognition), 2);
        assert_eq!(count(ConstraintFamily::FullRecognition), 1);
    }

    #[test]
    fn loose_indicators_drop_recognition_constraints() {
        let params = FormulationParamsBuilder::default()
            .tight_indicators(false)
            .build()
            .unwrap();
        let formulation = build(&scenario(), &params).unwrap();
        assert_eq!(formulation.constraints_of(ConstraintFamily::DirectRecognition).count(), 0);
        assert_eq!(formulation.constraints_of(ConstraintFamily::FullRecognition).count(), 0);
    }

    #[test]
    fn objectives_sum_the_right_variables() {
        let of1 = build(&scenario(), &FormulationParams::default()).unwrap();
        assert_eq!(of1.objective(), Objective::CoveredPairs);
        assert_eq!(of1.objective_function().terms.len(), 3);
        assert!(of1
            .objective_function()
            .terms
            .iter()
            .all(|t| of1.key(t.var).unwrap().symbol() == 'y'));

        let params = FormulationParamsBuilder::default()
            .objective(Objective::CoveredSessions)
            .build()
            .unwrap();
        let of2 = build(&scenario(), &params).unwrap();
        assert_eq!(of2.objective_function().terms.len(), 1);
        assert_eq!(of2.key(of2.objective_function().terms[0].var).unwrap(), &VarKey::full("S1"));
    }

    #[test]
    fn consecutive_block_windows_slide_by_one() {
        let params = FormulationParamsBuilder::default()
            .operational(Some(OperationalLimits::default()))
            .build()
            .unwrap();
        let formulation = build(&blocks_instance(6), &params).unwrap();
        // 6 blocks give windows starting at B1, B2, B3, for each of 2 interpreters
        let windows: Vec<_> = formulation
            .constraints_of(ConstraintFamily::ConsecutiveBlocks)
            .collect();
        assert_eq!(windows.len(), 6);
        assert!(windows.iter().all(|c| c.terms.len() == 4 && c.rhs == 3));
        assert!(windows.iter().any(|c| c.name.ends_with("from_B3")));
        assert!(!windows.iter().any(|c| c.name.ends_with("from_B4")));

        let workload: Vec<_> = formulation.constraints_of(ConstraintFamily::Workload).collect();
        assert_eq!(workload.len(), 2);
        assert!(workload.iter().all(|c| c.rhs == 15 && c.terms.len() == 6));
    }

    #[test]
    fn short_schedules_get_no_window_constraint() {
        let params = FormulationParamsBuilder::default()
            .operational(Some(OperationalLimits::default()))
            .build()
            .unwrap();
        let formulation = build(&blocks_instance(3), &params).unwrap();
        assert_eq!(formulation.constraints_of(ConstraintFamily::ConsecutiveBlocks).count(), 0);
        assert_eq!(formulation.constraints_of(ConstraintFamily::Workload).count(), 2);
    }

    #[test]
    fn missing_session_languages_is_an_error() {
        let mut instance = scenario();
        instance.languages_per_session.clear();
        assert!(build(&instance, &FormulationParams::default()).is_err());
    }
}
