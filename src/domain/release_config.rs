use crate::error::{FixtureError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prerelease policy applied to branches whose name matches `match_pattern`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchReleasePolicy {
    #[serde(rename = "match")]
    pub match_pattern: String,
    pub prerelease: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease_token: Option<String>,
}

impl BranchReleasePolicy {
    /// Stable releases from branches matching `pattern`
    pub fn stable(pattern: impl Into<String>) -> Self {
        BranchReleasePolicy {
            match_pattern: pattern.into(),
            prerelease: false,
            prerelease_token: None,
        }
    }

    /// Prereleases tagged with `token` from branches matching `pattern`
    pub fn prerelease(pattern: impl Into<String>, token: impl Into<String>) -> Self {
        BranchReleasePolicy {
            match_pattern: pattern.into(),
            prerelease: true,
            prerelease_token: Some(token.into()),
        }
    }

    pub fn matches(&self, branch_name: &str) -> Result<bool> {
        let re = Regex::new(&self.match_pattern).map_err(|e| {
            FixtureError::config(format!(
                "Invalid branch pattern '{}': {}",
                self.match_pattern, e
            ))
        })?;
        Ok(re.is_match(branch_name))
    }

    /// Prerelease token a release from this branch group must carry
    pub fn expected_token(&self) -> Option<&str> {
        if self.prerelease {
            self.prerelease_token.as_deref()
        } else {
            None
        }
    }
}

/// Release policies keyed by branch group name, plus global switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfig {
    pub branches: BTreeMap<String, BranchReleasePolicy>,
    pub allow_zero_version: bool,
}

impl ReleaseConfig {
    pub fn new(allow_zero_version: bool) -> Self {
        ReleaseConfig {
            branches: BTreeMap::new(),
            allow_zero_version,
        }
    }

    pub fn with_branch(mut self, group: impl Into<String>, policy: BranchReleasePolicy) -> Self {
        self.branches.insert(group.into(), policy);
        self
    }

    /// First policy (in group-name order) whose pattern matches `branch_name`
    pub fn policy_for(&self, branch_name: &str) -> Result<Option<(&str, &BranchReleasePolicy)>> {
        for (group, policy) in &self.branches {
            if policy.matches(branch_name)? {
                return Ok(Some((group.as_str(), policy)));
            }
        }
        Ok(None)
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig::new(false).with_branch("main", BranchReleasePolicy::stable("^main$"))
    }
}
