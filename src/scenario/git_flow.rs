//! Git flow with four release channels.
//!
//! 1. feature branches (`feat/*`) cut revision releases carrying the branch
//!    name as build metadata (`x.y.z-rev.N+feat/...`)
//! 2. `dev` cuts alpha releases (`x.y.z-alpha.N`)
//! 3. `beta` cuts beta releases (`x.y.z-beta.N`)
//! 4. `main` cuts official releases (`x.y.z`)
//!
//! Work lands on short-lived feature/fix branches, is merged into `dev` with
//! merge commits, and is promoted `dev` -> `beta` -> `main` the same way.
//! Stale branches are fast-forwarded before new work starts on them.

use super::{
    CommitClock, DefinitionOptions, MergeMessageFormatter, RepoScenario, CHANGELOG_MD_FILE,
    CHANGELOG_RST_FILE, DEFAULT_BRANCH_NAME, INITIAL_COMMIT_MESSAGE,
};
use crate::domain::{
    convert_commit_spec, convert_commit_specs, BranchReleasePolicy, ChangelogDestFile,
    ChangelogFormat, CommitConvention, CommitSpec, ConfigureDetails, ReleaseConfig,
    ReleaseDetails, RepoAction, WriteChangelogsDetails,
};
use crate::error::Result;
use std::path::PathBuf;

pub const SCENARIO_NAME: &str = "git_flow_repo_w_4_release_channels";

pub const BETA_BRANCH_NAME: &str = "beta";
pub const DEV_BRANCH_NAME: &str = "dev";
pub const FEAT_BRANCH_1_NAME: &str = "feat/feature-1";
pub const FEAT_BRANCH_2_NAME: &str = "feat/feature-2";
/// Reserved for follow-up scenarios; matched by the `feat/*` revision channel
pub const FEAT_BRANCH_3_NAME: &str = "feat/feature-3";
/// Reserved alongside [`FEAT_BRANCH_3_NAME`]
pub const FEAT_BRANCH_4_NAME: &str = "feat/feature-4";
pub const FIX_BRANCH_1_NAME: &str = "fix/patch-1";
pub const FIX_BRANCH_2_NAME: &str = "fix/patch-2";

/// Sources that shape the repository this scenario builds
static SOURCES: &[(&str, &str)] = &[
    ("scenario/git_flow.rs", include_str!("git_flow.rs")),
    ("scenario/mod.rs", include_str!("mod.rs")),
    ("scenario/clock.rs", include_str!("clock.rs")),
    ("domain/mod.rs", include_str!("../domain/mod.rs")),
    ("domain/action.rs", include_str!("../domain/action.rs")),
    ("domain/commit.rs", include_str!("../domain/commit.rs")),
    ("domain/convention.rs", include_str!("../domain/convention.rs")),
    ("domain/prerelease.rs", include_str!("../domain/prerelease.rs")),
    ("domain/release_config.rs", include_str!("../domain/release_config.rs")),
    ("domain/tag.rs", include_str!("../domain/tag.rs")),
    ("domain/version.rs", include_str!("../domain/version.rs")),
    ("error.rs", include_str!("../error.rs")),
    ("validate.rs", include_str!("../validate.rs")),
    ("interpreter.rs", include_str!("../interpreter.rs")),
    ("git/mod.rs", include_str!("../git/mod.rs")),
    ("git/repository.rs", include_str!("../git/repository.rs")),
];

/// The four-channel git flow scenario
#[derive(Debug, Clone, Copy, Default)]
pub struct GitFlowFourChannels;

impl RepoScenario for GitFlowFourChannels {
    fn name(&self) -> &'static str {
        SCENARIO_NAME
    }

    fn sources(&self) -> &'static [(&'static str, &'static str)] {
        SOURCES
    }

    fn definition(
        &self,
        options: &DefinitionOptions,
        clock: &mut CommitClock,
        formatter: &dyn MergeMessageFormatter,
    ) -> Result<Vec<RepoAction>> {
        repo_definition(options, clock, formatter)
    }
}

/// Build the complete action sequence for the four-channel git flow repo.
///
/// Releases, in order: `1.0.0`, `1.0.1-alpha.1`, `1.0.1-beta.1`,
/// `1.0.1-alpha.2`, `1.0.1-beta.2`, `1.1.0-rev.1+feat/feature-2`,
/// `1.1.0-alpha.1`, `1.1.0-beta.1`, `1.1.0`.
pub fn repo_definition(
    options: &DefinitionOptions,
    clock: &mut CommitClock,
    formatter: &dyn MergeMessageFormatter,
) -> Result<Vec<RepoAction>> {
    let mut flow = FlowSteps::new(options.commit_type, clock, formatter);
    let is_emoji = options.commit_type == CommitConvention::Emoji;

    flow.push(configure_action(options));

    // Initial release
    flow.uniform_commit(INITIAL_COMMIT_MESSAGE, is_emoji)?;
    flow.create_branch(BETA_BRANCH_NAME, DEFAULT_BRANCH_NAME);
    flow.create_branch(DEV_BRANCH_NAME, BETA_BRANCH_NAME);
    flow.create_branch(FEAT_BRANCH_1_NAME, DEV_BRANCH_NAME);
    flow.commit(
        "feat: add new feature",
        ":sparkles: add new feature",
        "ENH: add new feature",
    )?;
    flow.merge_into(FEAT_BRANCH_1_NAME, DEV_BRANCH_NAME, true)?;
    flow.merge_into(DEV_BRANCH_NAME, BETA_BRANCH_NAME, is_emoji)?;
    flow.merge_into(BETA_BRANCH_NAME, DEFAULT_BRANCH_NAME, is_emoji)?;
    flow.release("1.0.0");

    // Fix a bug and release it as an alpha
    flow.fast_forward(BETA_BRANCH_NAME, DEFAULT_BRANCH_NAME);
    flow.fast_forward(DEV_BRANCH_NAME, BETA_BRANCH_NAME);
    flow.create_branch(FIX_BRANCH_1_NAME, DEV_BRANCH_NAME);
    flow.commit(
        "fix(cli): fix config cli command",
        ":bug: (cli) fix config cli command",
        "BUG(cli): fix config cli command",
    )?;
    flow.merge_into(FIX_BRANCH_1_NAME, DEV_BRANCH_NAME, true)?;
    flow.release("1.0.1-alpha.1");

    // Promote the alpha to beta
    flow.merge_into(DEV_BRANCH_NAME, BETA_BRANCH_NAME, is_emoji)?;
    flow.release("1.0.1-beta.1");

    // Fix a bug found in the beta and cut a second alpha
    flow.fast_forward(DEV_BRANCH_NAME, BETA_BRANCH_NAME);
    flow.create_branch(FIX_BRANCH_2_NAME, DEV_BRANCH_NAME);
    flow.commit(
        "fix(config): fix config option",
        ":bug: (config) fix config option",
        "BUG(config): fix config option",
    )?;
    flow.merge_into(FIX_BRANCH_2_NAME, DEV_BRANCH_NAME, true)?;
    flow.release("1.0.1-alpha.2");

    // Promote the second alpha to a second beta
    flow.merge_into(DEV_BRANCH_NAME, BETA_BRANCH_NAME, is_emoji)?;
    flow.release("1.0.1-beta.2");

    // Another developer's feature gets a revision release from its own branch
    flow.fast_forward(DEV_BRANCH_NAME, BETA_BRANCH_NAME);
    flow.create_branch(FEAT_BRANCH_2_NAME, DEV_BRANCH_NAME);
    flow.commit(
        "feat(feat-2): add another primary feature",
        ":sparkles: (feat-2) add another primary feature",
        "ENH(feat-2): add another primary feature",
    )?;
    flow.release(&format!("1.1.0-rev.1+{}", FEAT_BRANCH_2_NAME));

    // Merge the revision into dev as an alpha
    flow.merge_into(FEAT_BRANCH_2_NAME, DEV_BRANCH_NAME, true)?;
    flow.release("1.1.0-alpha.1");

    // Promote to beta
    flow.merge_into(DEV_BRANCH_NAME, BETA_BRANCH_NAME, is_emoji)?;
    flow.release("1.1.0-beta.1");

    // Ship the release candidate to production
    flow.merge_into(BETA_BRANCH_NAME, DEFAULT_BRANCH_NAME, is_emoji)?;
    flow.release("1.1.0");

    Ok(flow.finish())
}

fn configure_action(options: &DefinitionOptions) -> RepoAction {
    let release = ReleaseConfig::new(false)
        .with_branch(
            "main",
            BranchReleasePolicy::stable(format!("^{}$", DEFAULT_BRANCH_NAME)),
        )
        .with_branch(
            "beta",
            BranchReleasePolicy::prerelease(format!("^{}$", BETA_BRANCH_NAME), "beta"),
        )
        .with_branch(
            "dev",
            BranchReleasePolicy::prerelease(format!("^{}$", DEV_BRANCH_NAME), "alpha"),
        )
        .with_branch("features", BranchReleasePolicy::prerelease("^feat/.+", "rev"));

    RepoAction::Configure(ConfigureDetails {
        commit_type: options.commit_type,
        hvcs_client_name: options.hvcs_client_name.clone(),
        hvcs_domain: options.hvcs_domain.clone(),
        tag_format_str: options.tag_format_str.clone(),
        mask_initial_release: options.mask_initial_release,
        release,
        extra_configs: options.extra_configs.clone(),
    })
}

fn changelog_dest_files() -> Vec<ChangelogDestFile> {
    vec![
        ChangelogDestFile {
            path: PathBuf::from(CHANGELOG_MD_FILE),
            format: ChangelogFormat::Markdown,
        },
        ChangelogDestFile {
            path: PathBuf::from(CHANGELOG_RST_FILE),
            format: ChangelogFormat::RestructuredText,
        },
    ]
}

/// Accumulates actions while handing out one clock tick per history entry
struct FlowSteps<'a> {
    convention: CommitConvention,
    clock: &'a mut CommitClock,
    formatter: &'a dyn MergeMessageFormatter,
    actions: Vec<RepoAction>,
}

impl<'a> FlowSteps<'a> {
    fn new(
        convention: CommitConvention,
        clock: &'a mut CommitClock,
        formatter: &'a dyn MergeMessageFormatter,
    ) -> Self {
        FlowSteps {
            convention,
            clock,
            formatter,
            actions: Vec::new(),
        }
    }

    fn push(&mut self, action: RepoAction) {
        self.actions.push(action);
    }

    fn create_branch(&mut self, name: &str, start_branch: &str) {
        self.push(RepoAction::create_branch(name, start_branch));
    }

    /// Check out `target` and fast-forward it to `source`
    fn fast_forward(&mut self, target: &str, source: &str) {
        self.push(RepoAction::checkout(target));
        self.push(RepoAction::fast_forward(source));
    }

    /// Regular work commit, always part of the changelog
    fn commit(&mut self, angular: &str, emoji: &str, scipy: &str) -> Result<()> {
        let datetime = self.clock.next_timestamp();
        let spec = CommitSpec::per_convention(angular, emoji, scipy, datetime, true);
        let commits = convert_commit_specs(&[spec], self.convention)?;
        self.push(RepoAction::commits(commits));
        Ok(())
    }

    fn uniform_commit(&mut self, message: &str, include_in_changelog: bool) -> Result<()> {
        let spec = CommitSpec::uniform(message, self.clock.next_timestamp(), include_in_changelog);
        let commits = convert_commit_specs(&[spec], self.convention)?;
        self.push(RepoAction::commits(commits));
        Ok(())
    }

    /// Check out `target` and merge `source` into it with a merge commit
    fn merge_into(&mut self, source: &str, target: &str, include_in_changelog: bool) -> Result<()> {
        let msg = self.formatter.format(source, target);
        let spec = CommitSpec::uniform(msg, self.clock.next_timestamp(), include_in_changelog);
        let commit_def = convert_commit_spec(&spec, self.convention)?;

        self.push(RepoAction::checkout(target));
        self.push(RepoAction::merge_commit(source, commit_def));
        Ok(())
    }

    fn release(&mut self, version: &str) {
        let details = ReleaseDetails {
            version: version.to_string(),
            datetime: self.clock.next_timestamp(),
            pre_actions: vec![RepoAction::WriteChangelogs(WriteChangelogsDetails {
                new_version: version.to_string(),
                dest_files: changelog_dest_files(),
            })],
        };
        self.push(RepoAction::Release(details));
    }

    fn finish(self) -> Vec<RepoAction> {
        self.actions
    }
}
