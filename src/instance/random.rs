use std::collections::{BTreeSet, HashMap};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::instance::Instance;

/// Shape of a randomly generated instance. Sessions are dealt round-robin
/// over the blocks so that every session lives in exactly one block.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RandomInstance {
    pub interpreters: usize,
    pub sessions: usize,
    pub blocks: usize,
    pub languages: usize,
    pub languages_per_interpreter: (usize, usize),
    pub languages_per_session: (usize, usize),
}

impl Default for RandomInstance {
    fn default() -> Self {
        Self {
            interpreters: 6,
            sessions: 8,
            blocks: 4,
            languages: 6,
            languages_per_interpreter: (2, 3),
            languages_per_session: (2, 4),
        }
    }
}

impl RandomInstance {
    pub fn generate(&self, seed: u64) -> Instance {
        let mut rng = StdRng::seed_from_u64(seed);
        let pool: Vec<String> = (0..self.languages.max(1)).map(|l| format!("L{l}")).collect();
        let interpreters: Vec<String> = (1..=self.interpreters).map(|i| format!("I{i}")).collect();
        let sessions: Vec<String> = (1..=self.sessions).map(|s| format!("S{s}")).collect();
        let blocks: Vec<String> = (1..=self.blocks.max(1)).map(|b| format!("B{b}")).collect();

        let mut languages_per_interpreter = HashMap::new();
        for interpreter in &interpreters {
            let chosen = Self::pick(&mut rng, &pool, self.languages_per_interpreter);
            languages_per_interpreter.insert(interpreter.clone(), chosen);
        }
        let mut languages_per_session = HashMap::new();
        for session in &sessions {
            let chosen = Self::pick(&mut rng, &pool, self.languages_per_session);
            languages_per_session.insert(session.clone(), chosen);
        }
        let mut sessions_per_block: HashMap<String, Vec<String>> =
            blocks.iter().map(|b| (b.clone(), vec![])).collect();
        for (idx, session) in sessions.iter().enumerate() {
            if let Some(list) = sessions_per_block.get_mut(&blocks[idx % blocks.len()]) {
                list.push(session.clone());
            }
        }

        Instance {
            name: format!("random-{seed}"),
            interpreters,
            sessions,
            blocks,
            languages_per_interpreter,
            languages_per_session,
            sessions_per_block,
        }
    }

    fn pick(rng: &mut StdRng, pool: &[String], (min, max): (usize, usize)) -> BTreeSet<String> {
        let max = max.clamp(1, pool.len());
        let min = min.clamp(1, max);
        let amount = rng.gen_range(min..=max);
        pool.choose_multiple(rng, amount).cloned().collect()
    }
}
