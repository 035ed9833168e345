use crate::error::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commit-message convention understood by the downstream commit parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitConvention {
    /// `type(scope): description`
    Angular,
    /// `:emoji: description`
    Emoji,
    /// `TAG(scope): description`
    Scipy,
}

impl CommitConvention {
    /// Every supported convention, in a stable order
    pub const ALL: [CommitConvention; 3] = [
        CommitConvention::Angular,
        CommitConvention::Emoji,
        CommitConvention::Scipy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitConvention::Angular => "angular",
            CommitConvention::Emoji => "emoji",
            CommitConvention::Scipy => "scipy",
        }
    }

    /// Parse a convention name, failing with `UnsupportedConvention`
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl FromStr for CommitConvention {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "angular" => Ok(CommitConvention::Angular),
            "emoji" => Ok(CommitConvention::Emoji),
            "scipy" => Ok(CommitConvention::Scipy),
            _ => Err(FixtureError::UnsupportedConvention(s.to_string())),
        }
    }
}

impl fmt::Display for CommitConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
