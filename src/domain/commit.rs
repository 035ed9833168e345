use crate::domain::convention::CommitConvention;
use crate::error::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Abstract commit: one message per convention, plus timing and changelog flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSpec {
    messages: BTreeMap<CommitConvention, String>,
    datetime: String,
    include_in_changelog: bool,
}

impl CommitSpec {
    /// Create a spec with no messages yet
    pub fn new(datetime: impl Into<String>, include_in_changelog: bool) -> Self {
        CommitSpec {
            messages: BTreeMap::new(),
            datetime: datetime.into(),
            include_in_changelog,
        }
    }

    /// Create a spec carrying one message per convention
    pub fn per_convention(
        angular: impl Into<String>,
        emoji: impl Into<String>,
        scipy: impl Into<String>,
        datetime: impl Into<String>,
        include_in_changelog: bool,
    ) -> Self {
        CommitSpec::new(datetime, include_in_changelog)
            .with_message(CommitConvention::Angular, angular)
            .with_message(CommitConvention::Emoji, emoji)
            .with_message(CommitConvention::Scipy, scipy)
    }

    /// Create a spec using the same message for every convention
    pub fn uniform(
        message: impl Into<String>,
        datetime: impl Into<String>,
        include_in_changelog: bool,
    ) -> Self {
        let message = message.into();
        CommitConvention::ALL
            .iter()
            .fold(CommitSpec::new(datetime, include_in_changelog), |spec, c| {
                spec.with_message(*c, message.clone())
            })
    }

    pub fn with_message(mut self, convention: CommitConvention, message: impl Into<String>) -> Self {
        self.messages.insert(convention, message.into());
        self
    }

    pub fn message(&self, convention: CommitConvention) -> Option<&str> {
        self.messages.get(&convention).map(String::as_str)
    }

    pub fn datetime(&self) -> &str {
        &self.datetime
    }

    pub fn include_in_changelog(&self) -> bool {
        self.include_in_changelog
    }
}

/// Concrete commit for a single convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDefinition {
    pub msg: String,
    pub datetime: String,
    pub include_in_changelog: bool,
}

/// Resolve a spec into the commit authored for `convention`.
///
/// A missing message is an internal-consistency failure of whoever authored the
/// spec and is reported as `InvalidConvention`.
pub fn convert_commit_spec(spec: &CommitSpec, convention: CommitConvention) -> Result<CommitDefinition> {
    let msg = spec
        .message(convention)
        .ok_or_else(|| FixtureError::InvalidConvention(convention.to_string()))?;

    Ok(CommitDefinition {
        msg: msg.to_string(),
        datetime: spec.datetime.clone(),
        include_in_changelog: spec.include_in_changelog,
    })
}

/// Convert an ordered batch of specs, preserving order
pub fn convert_commit_specs(
    specs: &[CommitSpec],
    convention: CommitConvention,
) -> Result<Vec<CommitDefinition>> {
    specs
        .iter()
        .map(|spec| convert_commit_spec(spec, convention))
        .collect()
}
