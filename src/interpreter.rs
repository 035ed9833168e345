//! Replays a repo definition onto a work tree.

use crate::domain::{
    ChangelogFormat, CheckoutDetails, ConfigureDetails, MergeDetails, ReleaseDetails, RepoAction,
    TagFormat, WriteChangelogsDetails,
};
use crate::error::{FixtureError, Result};
use crate::git::{Git2WorkTree, GitIdentity, MergeMode, WorkTree};
use crate::validate::validate_definition;
use std::path::Path;

pub const RELEASE_CONFIG_FILE: &str = "release.toml";
pub const GITIGNORE_FILE: &str = ".gitignore";
pub const CHANGES_FILE: &str = "CHANGES.txt";
pub const VERSION_FILE: &str = "VERSION";

const GITIGNORE_CONTENTS: &str = "target/\ndist/\n*.log\n";

/// Build a fresh repository at `path` from `actions`
///
/// # Arguments
/// * `path` - Directory to initialise; created if missing
/// * `actions` - Definition to validate and replay
/// * `identity` - Author and committer of every commit
///
/// # Returns
/// * `Ok(Vec<RepoAction>)` - The replayed definition
pub fn build_repo_from_definition(
    path: &Path,
    actions: &[RepoAction],
    identity: GitIdentity,
) -> Result<Vec<RepoAction>> {
    validate_definition(actions)?;

    log::info!(
        "building repository at {} from {} actions",
        path.display(),
        actions.len()
    );
    let mut tree = Git2WorkTree::init(path, identity)?;
    replay(&mut tree, actions)?;

    Ok(actions.to_vec())
}

/// Apply `actions` in order to `tree` without validating them first
pub fn replay<W: WorkTree>(tree: &mut W, actions: &[RepoAction]) -> Result<()> {
    let mut replayer = Replayer::new(tree);
    for (index, action) in actions.iter().enumerate() {
        log::debug!("action #{}: {}", index, action.kind());
        replayer.apply(action)?;
    }
    Ok(())
}

struct Replayer<'a, W: WorkTree> {
    tree: &'a mut W,
    tag_format: TagFormat,
    mask_initial_release: bool,
}

impl<'a, W: WorkTree> Replayer<'a, W> {
    fn new(tree: &'a mut W) -> Self {
        Replayer {
            tree,
            tag_format: TagFormat::default(),
            mask_initial_release: false,
        }
    }

    fn apply(&mut self, action: &RepoAction) -> Result<()> {
        match action {
            RepoAction::Configure(details) => self.configure(details),
            RepoAction::GitCheckout(details) => self.checkout(details),
            RepoAction::GitMerge(details) => self.merge(details),
            RepoAction::MakeCommits(details) => {
                for commit in &details.commits {
                    self.append_change(&commit.msg)?;
                    self.tree.commit(&commit.msg, &commit.datetime)?;
                }
                Ok(())
            }
            RepoAction::Release(details) => self.release(details),
            RepoAction::WriteChangelogs(details) => self.write_changelogs(details),
        }
    }

    fn configure(&mut self, details: &ConfigureDetails) -> Result<()> {
        self.tag_format = TagFormat::from_option(details.tag_format_str.as_deref())?;
        self.mask_initial_release = details.mask_initial_release;

        let contents = render_release_config(details, &self.tag_format)?;
        self.tree
            .write_file(Path::new(RELEASE_CONFIG_FILE), &contents)?;
        self.tree
            .write_file(Path::new(GITIGNORE_FILE), GITIGNORE_CONTENTS)
    }

    fn checkout(&mut self, details: &CheckoutDetails) -> Result<()> {
        match details {
            CheckoutDetails::Existing { branch } => self.tree.checkout(branch),
            CheckoutDetails::Create { create_branch } => self
                .tree
                .create_branch(&create_branch.name, &create_branch.start_branch),
        }
    }

    fn merge(&mut self, details: &MergeDetails) -> Result<()> {
        let mode = match (&details.commit_def, details.fast_forward) {
            (_, true) => MergeMode::FastForward,
            (Some(commit_def), false) => MergeMode::NoFastForward(commit_def),
            (None, false) => {
                return Err(FixtureError::merge(format!(
                    "merge of '{}' has no commit definition",
                    details.branch_name
                )))
            }
        };
        self.tree.merge(&details.branch_name, mode)
    }

    fn release(&mut self, details: &ReleaseDetails) -> Result<()> {
        for pre_action in &details.pre_actions {
            self.apply(pre_action)?;
        }

        self.tree
            .write_file(Path::new(VERSION_FILE), &format!("{}\n", details.version))?;
        let message = format!(
            "{}\n\nAutomatically generated by repo-fixtures",
            details.version
        );
        self.tree.commit(&message, &details.datetime)?;

        let tag_name = self.tag_format.format(&details.version);
        log::info!("tagging {} as {}", details.version, tag_name);
        self.tree.tag(&tag_name, &tag_name, &details.datetime)
    }

    fn write_changelogs(&mut self, details: &WriteChangelogsDetails) -> Result<()> {
        for dest in &details.dest_files {
            let existing = self.tree.read_file(&dest.path)?;
            let contents = render_changelog(
                dest.format,
                existing.as_deref(),
                &self.tag_format.format(&details.new_version),
                self.mask_initial_release,
            );
            self.tree.write_file(&dest.path, &contents)?;
        }
        Ok(())
    }

    fn append_change(&mut self, message: &str) -> Result<()> {
        let path = Path::new(CHANGES_FILE);
        let mut contents = self.tree.read_file(path)?.unwrap_or_default();
        contents.push_str(message.lines().next().unwrap_or_default());
        contents.push('\n');
        self.tree.write_file(path, &contents)
    }
}

/// Render `release.toml` for a CONFIGURE action
///
/// Extra configs use dotted keys relative to the `[semantic_release]` table
/// and replace whatever the generated document holds at that key.
pub fn render_release_config(details: &ConfigureDetails, tag_format: &TagFormat) -> Result<String> {
    let mut root = toml::Table::new();
    root.insert(
        "commit_parser".to_string(),
        toml::Value::from(details.commit_type.as_str()),
    );
    root.insert(
        "tag_format".to_string(),
        toml::Value::from(tag_format.pattern.as_str()),
    );
    root.insert(
        "allow_zero_version".to_string(),
        toml::Value::from(details.release.allow_zero_version),
    );
    root.insert(
        "branches".to_string(),
        toml::Value::try_from(&details.release.branches)?,
    );

    let mut remote = toml::Table::new();
    remote.insert(
        "type".to_string(),
        toml::Value::from(details.hvcs_client_name.as_str()),
    );
    remote.insert(
        "domain".to_string(),
        toml::Value::from(details.hvcs_domain.as_str()),
    );
    root.insert("remote".to_string(), toml::Value::Table(remote));

    let mut changelog = toml::Table::new();
    changelog.insert(
        "mask_initial_release".to_string(),
        toml::Value::from(details.mask_initial_release),
    );
    root.insert("changelog".to_string(), toml::Value::Table(changelog));

    for (key, value) in &details.extra_configs {
        set_dotted(&mut root, key, value.clone())?;
    }

    let mut document = toml::Table::new();
    document.insert("semantic_release".to_string(), toml::Value::Table(root));
    Ok(toml::to_string(&document)?)
}

fn set_dotted(table: &mut toml::Table, key: &str, value: toml::Value) -> Result<()> {
    let mut parts: Vec<&str> = key.split('.').collect();
    let leaf = parts
        .pop()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FixtureError::config(format!("Invalid config key: '{}'", key)))?;

    let mut current = table;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !entry.is_table() {
            *entry = toml::Value::Table(toml::Table::new());
        }
        current = match entry {
            toml::Value::Table(inner) => inner,
            _ => return Err(FixtureError::config(format!("Invalid config key: '{}'", key))),
        };
    }

    current.insert(leaf.to_string(), value);
    Ok(())
}

fn changelog_header(format: ChangelogFormat) -> &'static str {
    match format {
        ChangelogFormat::Markdown => "# CHANGELOG\n\n",
        ChangelogFormat::RestructuredText => ".. _changelog:\n\n=========\nCHANGELOG\n=========\n\n",
    }
}

/// Newest section first, keeping whatever earlier releases wrote below it
fn render_changelog(
    format: ChangelogFormat,
    existing: Option<&str>,
    title: &str,
    mask_initial_release: bool,
) -> String {
    let header = changelog_header(format);
    let previous = existing
        .map(|s| s.strip_prefix(header).unwrap_or(s))
        .unwrap_or_default();

    let body = if mask_initial_release && previous.is_empty() {
        "- Initial Release\n"
    } else {
        "- Release generated from repository history\n"
    };

    let section = match format {
        ChangelogFormat::Markdown => format!("## {}\n\n{}\n", title, body),
        ChangelogFormat::RestructuredText => {
            format!("{}\n{}\n\n{}\n", title, "=".repeat(title.len()), body)
        }
    };

    format!("{}{}{}", header, section, previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BranchReleasePolicy, ChangelogDestFile, CommitConvention, CommitDefinition, ReleaseConfig,
    };
    use crate::git::MockWorkTree;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn configure(tag_format: Option<&str>) -> ConfigureDetails {
        ConfigureDetails {
            commit_type: CommitConvention::Emoji,
            hvcs_client_name: "github".to_string(),
            hvcs_domain: "example.com".to_string(),
            tag_format_str: tag_format.map(String::from),
            mask_initial_release: false,
            release: ReleaseConfig::new(false)
                .with_branch("main", BranchReleasePolicy::stable("^main$")),
            extra_configs: BTreeMap::new(),
        }
    }

    fn commit(msg: &str, second: u32) -> CommitDefinition {
        CommitDefinition {
            msg: msg.to_string(),
            datetime: format!("2024-01-01T00:00:{:02}+00:00", second),
            include_in_changelog: true,
        }
    }

    #[test]
    fn test_release_config_document() {
        let mut details = configure(None);
        details.extra_configs.insert(
            "changelog.exclude_commit_patterns".to_string(),
            toml::Value::Array(vec![]),
        );
        let text = render_release_config(&details, &TagFormat::default()).unwrap();
        let parsed: toml::Table = toml::from_str(&text).unwrap();

        let root = parsed["semantic_release"].as_table().unwrap();
        assert_eq!(root["commit_parser"].as_str(), Some("emoji"));
        assert_eq!(root["tag_format"].as_str(), Some("v{version}"));
        assert_eq!(root["remote"]["domain"].as_str(), Some("example.com"));
        assert_eq!(root["branches"]["main"]["match"].as_str(), Some("^main$"));
        assert_eq!(
            root["changelog"]["exclude_commit_patterns"].as_array().map(|a| a.len()),
            Some(0)
        );
        assert_eq!(root["changelog"]["mask_initial_release"].as_bool(), Some(false));
    }

    #[test]
    fn test_set_dotted_replaces_scalars() {
        let mut table = toml::Table::new();
        table.insert("remote".to_string(), toml::Value::from("github"));
        set_dotted(&mut table, "remote.token", toml::Value::from("x")).unwrap();
        assert_eq!(table["remote"]["token"].as_str(), Some("x"));
        assert!(set_dotted(&mut table, "remote.", toml::Value::from(1)).is_err());
    }

    #[test]
    fn test_replay_release_on_mock() {
        let actions = vec![
            RepoAction::Configure(configure(Some("release-{version}"))),
            RepoAction::commits(vec![commit("Initial commit", 0), commit("feat: add", 1)]),
            RepoAction::Release(ReleaseDetails {
                version: "1.0.0".to_string(),
                datetime: "2024-01-01T00:00:02+00:00".to_string(),
                pre_actions: vec![RepoAction::WriteChangelogs(WriteChangelogsDetails {
                    new_version: "1.0.0".to_string(),
                    dest_files: vec![ChangelogDestFile {
                        path: PathBuf::from("CHANGELOG.md"),
                        format: ChangelogFormat::Markdown,
                    }],
                })],
            }),
        ];

        let mut tree = MockWorkTree::new();
        replay(&mut tree, &actions).unwrap();

        assert_eq!(tree.list_tags().unwrap(), vec!["release-1.0.0"]);
        assert_eq!(tree.file(CHANGES_FILE), Some("Initial commit\nfeat: add\n"));
        assert_eq!(tree.file(VERSION_FILE), Some("1.0.0\n"));
        assert!(tree
            .file("CHANGELOG.md")
            .unwrap()
            .starts_with("# CHANGELOG\n\n## release-1.0.0"));
        assert_eq!(
            tree.branch_log("main").unwrap(),
            vec!["Initial commit", "feat: add", "1.0.0"]
        );
    }

    #[test]
    fn test_replay_branches_and_merges() {
        let actions = vec![
            RepoAction::commits(vec![commit("Initial commit", 0)]),
            RepoAction::create_branch("dev", "main"),
            RepoAction::commits(vec![commit("fix: one", 1)]),
            RepoAction::checkout("main"),
            RepoAction::merge_commit("dev", commit("Merge branch 'dev' into 'main'", 2)),
            RepoAction::checkout("dev"),
            RepoAction::fast_forward("main"),
        ];

        let mut tree = MockWorkTree::new();
        replay(&mut tree, &actions).unwrap();

        assert_eq!(
            tree.operations(),
            &[
                "commit main: Initial commit",
                "branch dev from main",
                "checkout dev",
                "commit dev: fix: one",
                "checkout main",
                "merge dev into main",
                "checkout dev",
                "fast-forward dev to main",
            ]
        );
    }

    #[test]
    fn test_changelog_keeps_previous_sections() {
        let first = render_changelog(ChangelogFormat::RestructuredText, None, "v1.0.0", true);
        assert!(first.contains("Initial Release"));

        let second = render_changelog(ChangelogFormat::RestructuredText, Some(&first), "v1.1.0", true);
        let newer = second.find("v1.1.0").unwrap();
        let older = second.find("v1.0.0").unwrap();
        assert!(newer < older);
        assert_eq!(second.matches("CHANGELOG\n").count(), 1);
    }
}
