//! Static checks over an action sequence before anything touches a work tree.
//!
//! A definition that fails here is a defect in whoever generated it; the
//! interpreter refuses to replay it instead of discovering the problem halfway
//! through building a repository.

use crate::domain::{
    CheckoutDetails, CommitDefinition, MergeDetails, ReleaseConfig, ReleaseDetails,
    ReleaseVersion, RepoAction,
};
use crate::error::{FixtureError, Result};
use crate::scenario::clock::parse_timestamp;
use crate::scenario::DEFAULT_BRANCH_NAME;
use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Validate a complete definition
///
/// # Returns
/// * `Ok(())` - The sequence can be replayed onto a fresh repository
/// * `Err(FixtureError::Sequencing)` - Naming the first offending action
pub fn validate_definition(actions: &[RepoAction]) -> Result<()> {
    let mut validator = DefinitionValidator::new();
    for (index, action) in actions.iter().enumerate() {
        validator.check(index, action)?;
    }
    Ok(())
}

struct DefinitionValidator {
    release_config: Option<ReleaseConfig>,
    saw_git_action: bool,
    branches: HashSet<String>,
    current_branch: String,
    last_timestamp: Option<DateTime<FixedOffset>>,
    last_release_by_channel: HashMap<Option<String>, ReleaseVersion>,
}

impl DefinitionValidator {
    fn new() -> Self {
        DefinitionValidator {
            release_config: None,
            saw_git_action: false,
            branches: HashSet::new(),
            current_branch: DEFAULT_BRANCH_NAME.to_string(),
            last_timestamp: None,
            last_release_by_channel: HashMap::new(),
        }
    }

    fn check(&mut self, index: usize, action: &RepoAction) -> Result<()> {
        match action {
            RepoAction::Configure(details) => {
                if self.release_config.is_some() {
                    return Err(FixtureError::sequencing(index, "repository configured twice"));
                }
                if self.saw_git_action {
                    return Err(FixtureError::sequencing(
                        index,
                        "CONFIGURE must come before any git action",
                    ));
                }
                self.release_config = Some(details.release.clone());
                Ok(())
            }
            RepoAction::GitCheckout(details) => {
                self.saw_git_action = true;
                self.check_checkout(index, details)
            }
            RepoAction::GitMerge(details) => {
                self.saw_git_action = true;
                self.check_merge(index, details)
            }
            RepoAction::MakeCommits(details) => {
                self.saw_git_action = true;
                for commit in &details.commits {
                    self.check_timestamp(index, &commit.datetime)?;
                }
                if !details.commits.is_empty() {
                    self.branches.insert(self.current_branch.clone());
                }
                Ok(())
            }
            RepoAction::Release(details) => {
                self.saw_git_action = true;
                self.check_release(index, details)
            }
            RepoAction::WriteChangelogs(_) => Ok(()),
        }
    }

    fn require_branch(&self, index: usize, name: &str) -> Result<()> {
        if self.branches.contains(name) {
            Ok(())
        } else {
            Err(FixtureError::sequencing(
                index,
                format!("branch '{}' does not exist yet", name),
            ))
        }
    }

    fn check_checkout(&mut self, index: usize, details: &CheckoutDetails) -> Result<()> {
        match details {
            CheckoutDetails::Existing { branch } => {
                self.require_branch(index, branch)?;
            }
            CheckoutDetails::Create { create_branch } => {
                if self.branches.contains(&create_branch.name) {
                    return Err(FixtureError::sequencing(
                        index,
                        format!("branch '{}' already exists", create_branch.name),
                    ));
                }
                self.require_branch(index, &create_branch.start_branch)?;
                self.branches.insert(create_branch.name.clone());
            }
        }
        self.current_branch = details.target().to_string();
        Ok(())
    }

    fn check_merge(&mut self, index: usize, details: &MergeDetails) -> Result<()> {
        self.require_branch(index, &details.branch_name)?;
        self.require_branch(index, &self.current_branch)?;

        if details.branch_name == self.current_branch {
            return Err(FixtureError::sequencing(
                index,
                format!("cannot merge '{}' into itself", details.branch_name),
            ));
        }

        match (details.fast_forward, &details.commit_def) {
            (true, Some(_)) => Err(FixtureError::sequencing(
                index,
                "fast-forward merge must not carry a merge commit",
            )),
            (false, None) => Err(FixtureError::sequencing(
                index,
                format!(
                    "merge of '{}' into '{}' needs a merge commit definition",
                    details.branch_name, self.current_branch
                ),
            )),
            (false, Some(CommitDefinition { datetime, .. })) => self.check_timestamp(index, datetime),
            (true, None) => Ok(()),
        }
    }

    fn check_release(&mut self, index: usize, details: &ReleaseDetails) -> Result<()> {
        self.require_branch(index, &self.current_branch)?;
        self.check_timestamp(index, &details.datetime)?;

        let version = ReleaseVersion::parse(&details.version)
            .map_err(|e| FixtureError::sequencing(index, e.to_string()))?;
        let channel = version
            .channel()
            .map_err(|e| FixtureError::sequencing(index, e.to_string()))?;

        for pre_action in &details.pre_actions {
            match pre_action {
                RepoAction::WriteChangelogs(write) if write.new_version == details.version => {}
                RepoAction::WriteChangelogs(write) => {
                    return Err(FixtureError::sequencing(
                        index,
                        format!(
                            "changelog for '{}' written while releasing '{}'",
                            write.new_version, details.version
                        ),
                    ))
                }
                other => {
                    return Err(FixtureError::sequencing(
                        index,
                        format!("{} is not allowed as a release pre-action", other.kind()),
                    ))
                }
            }
        }

        if let Some(config) = &self.release_config {
            if !config.allow_zero_version && version.major() == 0 {
                return Err(FixtureError::sequencing(
                    index,
                    format!("zero version '{}' is not allowed", version),
                ));
            }

            let policy = config
                .policy_for(&self.current_branch)?
                .map(|(_, policy)| policy)
                .ok_or_else(|| {
                    FixtureError::sequencing(
                        index,
                        format!("no release policy matches branch '{}'", self.current_branch),
                    )
                })?;

            if policy.expected_token() != channel.as_deref() {
                return Err(FixtureError::sequencing(
                    index,
                    format!(
                        "version '{}' does not belong to the '{}' channel of branch '{}'",
                        version,
                        policy.expected_token().unwrap_or("stable"),
                        self.current_branch
                    ),
                ));
            }
        }

        if let Some(previous) = self.last_release_by_channel.get(&channel) {
            if version.cmp_precedence(previous) != Ordering::Greater {
                return Err(FixtureError::sequencing(
                    index,
                    format!("version '{}' does not follow '{}'", version, previous),
                ));
            }
        }
        self.last_release_by_channel.insert(channel, version);
        Ok(())
    }

    fn check_timestamp(&mut self, index: usize, value: &str) -> Result<()> {
        let ts = parse_timestamp(value).map_err(|e| FixtureError::sequencing(index, e.to_string()))?;
        if let Some(last) = self.last_timestamp {
            if ts <= last {
                return Err(FixtureError::sequencing(
                    index,
                    format!("timestamp {} is not after the previous entry", value),
                ));
            }
        }
        self.last_timestamp = Some(ts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchReleasePolicy, CommitConvention, ConfigureDetails};
    use std::collections::BTreeMap;

    fn commit(msg: &str, second: u32) -> CommitDefinition {
        CommitDefinition {
            msg: msg.to_string(),
            datetime: format!("2024-01-01T00:00:{:02}+00:00", second),
            include_in_changelog: true,
        }
    }

    fn release(version: &str, second: u32) -> RepoAction {
        RepoAction::Release(ReleaseDetails {
            version: version.to_string(),
            datetime: format!("2024-01-01T00:00:{:02}+00:00", second),
            pre_actions: vec![],
        })
    }

    fn configure() -> RepoAction {
        RepoAction::Configure(ConfigureDetails {
            commit_type: CommitConvention::Angular,
            hvcs_client_name: "github".to_string(),
            hvcs_domain: "example.com".to_string(),
            tag_format_str: None,
            mask_initial_release: false,
            release: ReleaseConfig::new(false)
                .with_branch("main", BranchReleasePolicy::stable("^main$"))
                .with_branch("dev", BranchReleasePolicy::prerelease("^dev$", "alpha")),
            extra_configs: BTreeMap::new(),
        })
    }

    #[test]
    fn test_minimal_sequence_is_valid() {
        let actions = vec![
            configure(),
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            release("1.0.0", 1),
        ];
        assert!(validate_definition(&actions).is_ok());
    }

    #[test]
    fn test_branch_from_unborn_default_is_rejected() {
        let actions = vec![RepoAction::create_branch("dev", "main")];
        let err = validate_definition(&actions).unwrap_err();
        assert!(err.to_string().contains("'main' does not exist yet"));
    }

    #[test]
    fn test_checkout_forward_reference_is_rejected() {
        let actions = vec![
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            RepoAction::checkout("beta"),
        ];
        let err = validate_definition(&actions).unwrap_err();
        assert!(err.to_string().contains("action #1"));
    }

    #[test]
    fn test_duplicate_branch_creation_is_rejected() {
        let actions = vec![
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            RepoAction::create_branch("dev", "main"),
            RepoAction::create_branch("dev", "main"),
        ];
        assert!(validate_definition(&actions).is_err());
    }

    #[test]
    fn test_merge_without_commit_is_rejected() {
        let actions = vec![
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            RepoAction::create_branch("dev", "main"),
            RepoAction::checkout("main"),
            RepoAction::GitMerge(MergeDetails {
                branch_name: "dev".to_string(),
                fast_forward: false,
                commit_def: None,
            }),
        ];
        let err = validate_definition(&actions).unwrap_err();
        assert!(err.to_string().contains("needs a merge commit"));
    }

    #[test]
    fn test_merge_into_itself_is_rejected() {
        let actions = vec![
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            RepoAction::fast_forward("main"),
        ];
        assert!(validate_definition(&actions).is_err());
    }

    #[test]
    fn test_repeated_timestamp_is_rejected() {
        let actions = vec![
            RepoAction::commits(vec![commit("one", 3), commit("two", 3)]),
        ];
        let err = validate_definition(&actions).unwrap_err();
        assert!(err.to_string().contains("not after the previous entry"));
    }

    #[test]
    fn test_release_on_wrong_channel_is_rejected() {
        let actions = vec![
            configure(),
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            release("1.0.0-alpha.1", 1),
        ];
        let err = validate_definition(&actions).unwrap_err();
        assert!(err.to_string().contains("stable"));
    }

    #[test]
    fn test_release_must_increase_within_channel() {
        let actions = vec![
            configure(),
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            RepoAction::create_branch("dev", "main"),
            release("1.0.1-alpha.2", 1),
            release("1.0.1-alpha.1", 2),
        ];
        let err = validate_definition(&actions).unwrap_err();
        assert!(err.to_string().contains("does not follow"));
    }

    #[test]
    fn test_zero_version_rejected_when_disallowed() {
        let actions = vec![
            configure(),
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            release("0.1.0", 1),
        ];
        assert!(validate_definition(&actions).is_err());
    }

    #[test]
    fn test_configure_after_git_action_is_rejected() {
        let actions = vec![RepoAction::commits(vec![commit("Initial commit", 0)]), configure()];
        assert!(validate_definition(&actions).is_err());
    }
}
