use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// An unordered pair of distinct languages, stored in canonical
/// (lexicographic) order. Every place that keys a variable by a language
/// pair goes through [`LanguagePair::new`], so `(FR, EN)` and `(EN, FR)`
/// always name the same variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(from = "RawLanguagePair")]
pub struct LanguagePair {
    first: String,
    second: String,
}

/// Serialized shape of a pair, in whatever order it was written.
#[derive(Deserialize)]
struct RawLanguagePair {
    first: String,
    second: String,
}

impl From<RawLanguagePair> for LanguagePair {
    fn from(raw: RawLanguagePair) -> Self {
        LanguagePair::new(raw.first, raw.second)
    }
}

impl LanguagePair {
    pub fn new<A: Into<String>, B: Into<String>>(a: A, b: B) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    /// All 2-combinations of a language set in canonical order.
    pub fn combinations<'a, I>(languages: I) -> Vec<LanguagePair>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let sorted: Vec<&String> = languages
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut pairs = Vec::with_capacity(sorted.len() * sorted.len().saturating_sub(1) / 2);
        for (i, a) in sorted.iter().enumerate() {
            for b in &sorted[i + 1..] {
                pairs.push(Self::new(a.as_str(), b.as_str()));
            }
        }
        pairs
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, language: &str) -> bool {
        self.first == language || self.second == language
    }
}

impl Display for LanguagePair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use crate::formulation::pair::LanguagePair;

    #[test]
    fn order_does_not_matter() {
        assert_eq!(LanguagePair::new("FR", "EN"), LanguagePair::new("EN", "FR"));
        assert_eq!(LanguagePair::new("FR", "EN").first(), "EN");
    }

    #[test]
    fn combinations_are_canonical_and_deduplicated() {
        let languages: Vec<String> = ["FR", "EN", "DE", "EN"].iter().map(|l| l.to_string()).collect();
        let pairs = LanguagePair::combinations(&languages);
        assert_eq!(
            pairs,
            vec![
                LanguagePair::new("DE", "EN"),
                LanguagePair::new("DE", "FR"),
                LanguagePair::new("EN", "FR"),
            ]
        );
        assert!(LanguagePair::combinations(&languages[..1]).is_empty());
    }

    #[test]
    fn deserialized_pairs_are_canonical() {
        let pair: LanguagePair =
            serde_json::from_str(r#"{"first": "FR", "second": "EN"}"#).unwrap();
        assert_eq!(pair, LanguagePair::new("EN", "FR"));
        assert_eq!(pair.first(), "EN");
    }
}
