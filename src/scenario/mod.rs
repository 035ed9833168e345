//! Scenario authoring: the pure functions that turn a convention and a few
//! options into an ordered list of [`RepoAction`]s.
//!
//! Nothing here touches the filesystem or reads the wall clock; timestamps come
//! from an injected [`CommitClock`].

pub mod clock;
pub mod git_flow;

pub use clock::CommitClock;

use crate::domain::{CommitConvention, RepoAction};
use crate::error::Result;
use std::collections::BTreeMap;

pub const DEFAULT_BRANCH_NAME: &str = "main";
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";
pub const EXAMPLE_HVCS_DOMAIN: &str = "example.com";
pub const DEFAULT_HVCS_CLIENT: &str = "github";

pub const CHANGELOG_MD_FILE: &str = "CHANGELOG.md";
pub const CHANGELOG_RST_FILE: &str = "CHANGELOG.rst";

/// Builds the merge commit message for merging `branch_name` into `target_branch_name`
pub trait MergeMessageFormatter {
    fn format(&self, branch_name: &str, target_branch_name: &str) -> String;
}

/// The message `git merge --no-ff` writes by default
#[derive(Debug, Clone, Copy, Default)]
pub struct GitMergeMessage;

impl MergeMessageFormatter for GitMergeMessage {
    fn format(&self, branch_name: &str, target_branch_name: &str) -> String {
        format!("Merge branch '{}' into '{}'", branch_name, target_branch_name)
    }
}

/// Caller-tunable inputs of a scenario definition
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionOptions {
    pub commit_type: CommitConvention,
    pub hvcs_client_name: String,
    pub hvcs_domain: String,
    pub tag_format_str: Option<String>,
    pub extra_configs: BTreeMap<String, toml::Value>,
    pub mask_initial_release: bool,
}

impl DefinitionOptions {
    pub fn new(commit_type: CommitConvention) -> Self {
        DefinitionOptions {
            commit_type,
            hvcs_client_name: DEFAULT_HVCS_CLIENT.to_string(),
            hvcs_domain: EXAMPLE_HVCS_DOMAIN.to_string(),
            tag_format_str: None,
            extra_configs: BTreeMap::new(),
            mask_initial_release: false,
        }
    }

    pub fn with_tag_format(mut self, tag_format: impl Into<String>) -> Self {
        self.tag_format_str = Some(tag_format.into());
        self
    }

    pub fn with_extra_config(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.extra_configs.insert(key.into(), value.into());
        self
    }

    pub fn with_masked_initial_release(mut self, mask: bool) -> Self {
        self.mask_initial_release = mask;
        self
    }
}

/// A named repository layout that can be generated for any convention
pub trait RepoScenario: Send + Sync {
    /// Stable identifier, also used as the cache key prefix
    fn name(&self) -> &'static str;

    /// Named source texts whose content determines the built repository
    fn sources(&self) -> &'static [(&'static str, &'static str)];

    fn definition(
        &self,
        options: &DefinitionOptions,
        clock: &mut CommitClock,
        formatter: &dyn MergeMessageFormatter,
    ) -> Result<Vec<RepoAction>>;
}

/// All shipped scenarios
pub fn scenarios() -> Vec<Box<dyn RepoScenario>> {
    vec![Box::new(git_flow::GitFlowFourChannels)]
}

/// Look up a shipped scenario by name
pub fn find_scenario(name: &str) -> Option<Box<dyn RepoScenario>> {
    scenarios().into_iter().find(|s| s.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_merge_message() {
        assert_eq!(
            GitMergeMessage.format("feat/feature-1", "dev"),
            "Merge branch 'feat/feature-1' into 'dev'"
        );
    }

    struct Arrow;

    impl MergeMessageFormatter for Arrow {
        fn format(&self, branch_name: &str, target_branch_name: &str) -> String {
            format!("merge {} -> {}", branch_name, target_branch_name)
        }
    }

    #[test]
    fn test_formatter_is_object_safe() {
        let formatter: &dyn MergeMessageFormatter = &Arrow;
        assert_eq!(formatter.format("dev", "beta"), "merge dev -> beta");
    }

    #[test]
    fn test_definition_options_defaults() {
        let options = DefinitionOptions::new(CommitConvention::Angular);
        assert_eq!(options.hvcs_client_name, "github");
        assert_eq!(options.hvcs_domain, "example.com");
        assert_eq!(options.tag_format_str, None);
        assert!(options.extra_configs.is_empty());
        assert!(!options.mask_initial_release);
    }

    #[test]
    fn test_find_scenario() {
        assert!(find_scenario(git_flow::SCENARIO_NAME).is_some());
        assert!(find_scenario("trunk_only").is_none());
    }
}
