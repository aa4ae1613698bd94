use std::fmt::{Display, Formatter};

use crate::formulation::pair::LanguagePair;

/// Position of a variable inside a [`crate::formulation::Formulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Key of a binary decision variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VarKey {
    /// `x[i,s]`: interpreter assigned to session.
    Assign { interpreter: String, session: String },
    /// `y[s,l1,l2]`: pair covered directly.
    Direct { session: String, pair: LanguagePair },
    /// `z[i,s,l1,l2]`: interpreter credited with the pair.
    Covers {
        interpreter: String,
        session: String,
        pair: LanguagePair,
    },
    /// `t[s]`: every required pair of the session covered.
    Full { session: String },
    /// `w[i1,i2,s,l1,l2,lp]`: two interpreters relay the pair through `via`.
    Bridge {
        first: String,
        second: String,
        session: String,
        pair: LanguagePair,
        via: String,
    },
    /// `u[s,l1,l2]`: pair covered directly or through a bridge.
    Covered { session: String, pair: LanguagePair },
}

impl VarKey {
    pub fn assign(interpreter: &str, session: &str) -> Self {
        VarKey::Assign {
            interpreter: interpreter.to_string(),
            session: session.to_string(),
        }
    }

    pub fn direct(session: &str, pair: &LanguagePair) -> Self {
        VarKey::Direct {
            session: session.to_string(),
            pair: pair.clone(),
        }
    }

    pub fn covers(interpreter: &str, session: &str, pair: &LanguagePair) -> Self {
        VarKey::Covers {
            interpreter: interpreter.to_string(),
            session: session.to_string(),
            pair: pair.clone(),
        }
    }

    pub fn full(session: &str) -> Self {
        VarKey::Full {
            session: session.to_string(),
        }
    }

    pub fn bridge(first: &str, second: &str, session: &str, pair: &LanguagePair, via: &str) -> Self {
        VarKey::Bridge {
            first: first.to_string(),
            second: second.to_string(),
            session: session.to_string(),
            pair: pair.clone(),
            via: via.to_string(),
        }
    }

    pub fn covered(session: &str, pair: &LanguagePair) -> Self {
        VarKey::Covered {
            session: session.to_string(),
            pair: pair.clone(),
        }
    }

    pub fn session(&self) -> &str {
        match self {
            VarKey::Assign { session, .. }
            | VarKey::Direct { session, .. }
            | VarKey::Covers { session, .. }
            | VarKey::Full { session }
            | VarKey::Bridge { session, .. }
            | VarKey::Covered { session, .. } => session,
        }
    }

    /// The single-letter name used in the mathematical model.
    pub fn symbol(&self) -> char {
        match self {
            VarKey::Assign { .. } => 'x',
            VarKey::Direct { .. } => 'y',
            VarKey::Covers { .. } => 'z',
            VarKey::Full { .. } => 't',
            VarKey::Bridge { .. } => 'w',
            VarKey::Covered { .. } => 'u',
        }
    }
}

impl Display for VarKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = self.symbol();
        match self {
            VarKey::Assign {
                interpreter,
                session,
            } => write!(f, "{symbol}[{interpreter},{session}]"),
            VarKey::Direct { session, pair } | VarKey::Covered { session, pair } => {
                write!(f, "{symbol}[{session},{},{}]", pair.first(), pair.second())
            }
            VarKey::Covers {
                interpreter,
                session,
                pair,
            } => write!(
                f,
                "{symbol}[{interpreter},{session},{},{}]",
                pair.first(),
                pair.second()
            ),
            VarKey::Full { session } => write!(f, "{symbol}[{session}]"),
            VarKey::Bridge {
                first,
                second,
                session,
                pair,
                via,
            } => write!(
                f,
                "{symbol}[{first},{second},{session},{},{},{via}]",
                pair.first(),
                pair.second()
            ),
        }
    }
}
