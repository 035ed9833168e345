//! Declarative repo actions: the instruction set replayed by the interpreter
//!
//! Serialized as `{"action": "<KIND>", "details": {...}}`. The interpreter and
//! any external consumer dispatch on `action`, so variant and field names are
//! part of the wire format.

use crate::domain::commit::CommitDefinition;
use crate::domain::convention::CommitConvention;
use crate::domain::release_config::ReleaseConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "details", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepoAction {
    Configure(ConfigureDetails),
    GitCheckout(CheckoutDetails),
    GitMerge(MergeDetails),
    MakeCommits(MakeCommitsDetails),
    Release(ReleaseDetails),
    WriteChangelogs(WriteChangelogsDetails),
}

impl RepoAction {
    /// Switch to an existing branch
    pub fn checkout(branch: impl Into<String>) -> Self {
        RepoAction::GitCheckout(CheckoutDetails::Existing {
            branch: branch.into(),
        })
    }

    /// Create `name` from `start_branch` and switch to it
    pub fn create_branch(name: impl Into<String>, start_branch: impl Into<String>) -> Self {
        RepoAction::GitCheckout(CheckoutDetails::Create {
            create_branch: CreateBranch {
                name: name.into(),
                start_branch: start_branch.into(),
            },
        })
    }

    /// Fast-forward the current branch to `branch_name`
    pub fn fast_forward(branch_name: impl Into<String>) -> Self {
        RepoAction::GitMerge(MergeDetails {
            branch_name: branch_name.into(),
            fast_forward: true,
            commit_def: None,
        })
    }

    /// Merge `branch_name` into the current branch with an explicit merge commit
    pub fn merge_commit(branch_name: impl Into<String>, commit_def: CommitDefinition) -> Self {
        RepoAction::GitMerge(MergeDetails {
            branch_name: branch_name.into(),
            fast_forward: false,
            commit_def: Some(commit_def),
        })
    }

    pub fn commits(commits: Vec<CommitDefinition>) -> Self {
        RepoAction::MakeCommits(MakeCommitsDetails { commits })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            RepoAction::Configure(_) => ActionKind::Configure,
            RepoAction::GitCheckout(_) => ActionKind::GitCheckout,
            RepoAction::GitMerge(_) => ActionKind::GitMerge,
            RepoAction::MakeCommits(_) => ActionKind::MakeCommits,
            RepoAction::Release(_) => ActionKind::Release,
            RepoAction::WriteChangelogs(_) => ActionKind::WriteChangelogs,
        }
    }
}

/// Discriminant of a [`RepoAction`], for logging and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Configure,
    GitCheckout,
    GitMerge,
    MakeCommits,
    Release,
    WriteChangelogs,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Configure => "CONFIGURE",
            ActionKind::GitCheckout => "GIT_CHECKOUT",
            ActionKind::GitMerge => "GIT_MERGE",
            ActionKind::MakeCommits => "MAKE_COMMITS",
            ActionKind::Release => "RELEASE",
            ActionKind::WriteChangelogs => "WRITE_CHANGELOGS",
        };
        write!(f, "{}", name)
    }
}

/// Project-level settings established once at the start of a definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigureDetails {
    pub commit_type: CommitConvention,
    pub hvcs_client_name: String,
    pub hvcs_domain: String,
    #[serde(default)]
    pub tag_format_str: Option<String>,
    #[serde(default)]
    pub mask_initial_release: bool,
    pub release: ReleaseConfig,
    /// Dotted-key overrides applied on top of everything else
    #[serde(default)]
    pub extra_configs: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckoutDetails {
    Existing { branch: String },
    Create { create_branch: CreateBranch },
}

impl CheckoutDetails {
    /// Branch that is checked out once the action completes
    pub fn target(&self) -> &str {
        match self {
            CheckoutDetails::Existing { branch } => branch,
            CheckoutDetails::Create { create_branch } => &create_branch.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBranch {
    pub name: String,
    pub start_branch: String,
}

/// Merge `branch_name` into whatever branch is currently checked out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDetails {
    pub branch_name: String,
    pub fast_forward: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_def: Option<CommitDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeCommitsDetails {
    pub commits: Vec<CommitDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDetails {
    pub version: String,
    pub datetime: String,
    /// Run, in order, right before the release commit and tag
    #[serde(default)]
    pub pre_actions: Vec<RepoAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteChangelogsDetails {
    pub new_version: String,
    pub dest_files: Vec<ChangelogDestFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogDestFile {
    /// Path relative to the repository root
    pub path: PathBuf,
    pub format: ChangelogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangelogFormat {
    #[serde(rename = "md")]
    Markdown,
    #[serde(rename = "rst")]
    RestructuredText,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merge_def() -> CommitDefinition {
        CommitDefinition {
            msg: "Merge branch 'dev' into 'beta'".to_string(),
            datetime: "2024-01-01T00:00:05+00:00".to_string(),
            include_in_changelog: false,
        }
    }

    #[test]
    fn test_checkout_wire_format() {
        let value = serde_json::to_value(RepoAction::checkout("dev")).unwrap();
        assert_eq!(
            value,
            json!({"action": "GIT_CHECKOUT", "details": {"branch": "dev"}})
        );
    }

    #[test]
    fn test_create_branch_wire_format() {
        let value = serde_json::to_value(RepoAction::create_branch("beta", "main")).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "GIT_CHECKOUT",
                "details": {"create_branch": {"name": "beta", "start_branch": "main"}}
            })
        );
    }

    #[test]
    fn test_fast_forward_omits_commit_def() {
        let value = serde_json::to_value(RepoAction::fast_forward("beta")).unwrap();
        assert_eq!(
            value,
            json!({"action": "GIT_MERGE", "details": {"branch_name": "beta", "fast_forward": true}})
        );
    }

    #[test]
    fn test_release_with_pre_actions_deserializes() {
        let raw = json!({
            "action": "RELEASE",
            "details": {
                "version": "1.0.0",
                "datetime": "2024-01-01T00:00:09+00:00",
                "pre_actions": [{
                    "action": "WRITE_CHANGELOGS",
                    "details": {
                        "new_version": "1.0.0",
                        "dest_files": [
                            {"path": "CHANGELOG.md", "format": "md"},
                            {"path": "CHANGELOG.rst", "format": "rst"}
                        ]
                    }
                }]
            }
        });

        let action: RepoAction = serde_json::from_value(raw).unwrap();
        let RepoAction::Release(details) = action else {
            panic!("expected a release action");
        };
        assert_eq!(details.version, "1.0.0");
        assert_eq!(details.pre_actions.len(), 1);
        assert_eq!(details.pre_actions[0].kind(), ActionKind::WriteChangelogs);
    }

    #[test]
    fn test_merge_round_trip_keeps_commit_def() {
        let action = RepoAction::merge_commit("dev", merge_def());
        let json = serde_json::to_string(&action).unwrap();
        let back: RepoAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_checkout_target() {
        let RepoAction::GitCheckout(details) = RepoAction::create_branch("dev", "beta") else {
            panic!("expected a checkout action");
        };
        assert_eq!(details.target(), "dev");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(RepoAction::fast_forward("main").kind().to_string(), "GIT_MERGE");
        assert_eq!(RepoAction::commits(vec![]).kind().to_string(), "MAKE_COMMITS");
    }
}
