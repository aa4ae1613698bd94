use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{Level, event};

use crate::error::IspError;
use crate::error::IspError::{InvalidInstance, MissingBlock, MissingLanguages, UnknownSession};
use crate::formulation::pair::LanguagePair;

pub mod random;

/// The problem data of one scheduling instance, as read from the JSON
/// instance schema. Read-only once loaded.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Instance {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "Interpreters")]
    pub interpreters: Vec<String>,
    #[serde(rename = "Sessions")]
    pub sessions: Vec<String>,
    /// Ordered: the consecutive-block limit slides over this sequence.
    #[serde(rename = "Blocks")]
    pub blocks: Vec<String>,
    #[serde(rename = "Languages_i")]
    pub languages_per_interpreter: HashMap<String, BTreeSet<String>>,
    #[serde(rename = "Languages_s")]
    pub languages_per_session: HashMap<String, BTreeSet<String>>,
    #[serde(rename = "Sessions_b")]
    pub sessions_per_block: HashMap<String, Vec<String>>,
}

impl Instance {
    pub fn from_json_str(name: &str, json: &str) -> Result<Self, IspError> {
        let mut instance: Instance = serde_json::from_str(json)?;
        instance.name = name.to_string();
        Ok(instance)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IspError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let instance = Self::from_json_str(&path.display().to_string(), &json)?;
        instance.validate()?;
        event!(
            Level::DEBUG,
            "Loaded instance {} ({} interpreters, {} sessions, {} blocks)",
            instance.name,
            instance.interpreters.len(),
            instance.sessions.len(),
            instance.blocks.len()
        );
        Ok(instance)
    }

    pub fn to_json_string(&self) -> Result<String, IspError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn interpreter_languages(&self, interpreter: &str) -> Result<&BTreeSet<String>, IspError> {
        self.languages_per_interpreter
            .get(interpreter)
            .ok_or_else(|| MissingLanguages(interpreter.to_string()))
    }

    pub fn session_languages(&self, session: &str) -> Result<&BTreeSet<String>, IspError> {
        self.languages_per_session
            .get(session)
            .ok_or_else(|| MissingLanguages(session.to_string()))
    }

    pub fn sessions_in_block(&self, block: &str) -> Result<&[String], IspError> {
        self.sessions_per_block
            .get(block)
            .map(Vec::as_slice)
            .ok_or_else(|| MissingBlock(block.to_string()))
    }

    /// All required language pairs of a session, in canonical order.
    pub fn session_pairs(&self, session: &str) -> Result<Vec<LanguagePair>, IspError> {
        Ok(LanguagePair::combinations(self.session_languages(session)?))
    }

    pub fn speaks(&self, interpreter: &str, language: &str) -> Result<bool, IspError> {
        Ok(self.interpreter_languages(interpreter)?.contains(language))
    }

    /// Every language known to the instance.
    pub fn languages(&self) -> BTreeSet<&str> {
        self.languages_per_interpreter
            .values()
            .chain(self.languages_per_session.values())
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Checks the referential integrity the formulations rely on. Sessions
    /// that are not in exactly one block are tolerated but reported.
    pub fn validate(&self) -> Result<(), IspError> {
        let sessions: BTreeSet<&str> = self.sessions.iter().map(String::as_str).collect();
        if sessions.len() != self.sessions.len() {
            return Err(InvalidInstance("duplicate session identifiers".to_string()));
        }
        for interpreter in &self.interpreters {
            self.interpreter_languages(interpreter)?;
        }
        for session in &self.sessions {
            self.session_languages(session)?;
        }
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for block in &self.blocks {
            for session in self.sessions_in_block(block)? {
                if !sessions.contains(session.as_str()) {
                    return Err(UnknownSession {
                        block: block.clone(),
                        session: session.clone(),
                    });
                }
                *occurrences.entry(session.as_str()).or_default() += 1;
            }
        }
        for session in &self.sessions {
            match occurrences.get(session.as_str()).copied().unwrap_or(0) {
                1 => {}
                0 => event!(Level::WARN, "Session {} is not scheduled in any block", session),
                n => event!(Level::WARN, "Session {} appears in {} blocks", session, n),
            }
        }
        Ok(())
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "Interpreters: {:?}", self.interpreters)?;
        writeln!(f, "Sessions: {:?}", self.sessions)?;
        writeln!(f, "Blocks: {:?}", self.blocks)?;
        writeln!(f, "Languages of interpreters: {:?}", self.languages_per_interpreter)?;
        writeln!(f, "Languages per session: {:?}", self.languages_per_session)?;
        write!(f, "Sessions per block: {:?}", self.sessions_per_block)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use crate::error::IspError;
    use crate::instance::Instance;

    pub(crate) const SCENARIO: &str = r#"{
        "Interpreters": ["I1", "I2"],
        "Sessions": ["S1"],
        "Blocks": ["B1"],
        "Languages_i": {"I1": ["EN", "FR"], "I2": ["FR", "DE"]},
        "Languages_s": {"S1": ["EN", "FR", "DE"]},
        "Sessions_b": {"B1": ["S1"]}
    }"#;

    pub(crate) fn scenario() -> Instance {
        Instance::from_json_str("scenario", SCENARIO).unwrap()
    }

    #[test]
    fn parses_instance_schema() {
        let instance = scenario();
        assert_eq!(instance.interpreters, vec!["I1", "I2"]);
        assert_eq!(instance.blocks, vec!["B1"]);
        assert!(instance.speaks("I2", "DE").unwrap());
        assert!(!instance.speaks("I1", "DE").unwrap());
        assert_eq!(instance.session_pairs("S1").unwrap().len(), 3);
        assert_eq!(instance.languages().len(), 3);
        assert!(instance.validate().is_ok());
    }

    #[test]
    fn missing_field_is_a_load_error() {
        let result = Instance::from_json_str("broken", r#"{"Interpreters": []}"#);
        assert!(matches!(result, Err(IspError::InstanceFormat(_))));
    }

    #[test]
    fn block_with_unknown_session_is_rejected() {
        let mut instance = scenario();
        instance
            .sessions_per_block
            .insert("B1".to_string(), vec!["S1".to_string(), "S9".to_string()]);
        match instance.validate() {
            Err(IspError::UnknownSession { block, session }) => {
                assert_eq!(block, "B1");
                assert_eq!(session, "S9");
            }
            other => panic!("unexpected validation result {other:?}"),
        }
    }

    #[test]
    fn block_without_entry_is_rejected() {
        let mut instance = scenario();
        instance.blocks.push("B2".to_string());
        assert!(matches!(instance.validate(), Err(IspError::MissingBlock(b)) if b == "B2"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();
        let instance = Instance::load(file.path()).unwrap();
        assert_eq!(instance.sessions, vec!["S1"]);
        let round_trip =
            Instance::from_json_str(&instance.name, &instance.to_json_string().unwrap()).unwrap();
        assert_eq!(round_trip, instance);
    }
}
