//! Entry points that hand out built repositories.

use crate::cache::{hash_sources, RepoCache};
use crate::config::FixtureConfig;
use crate::domain::{CommitConvention, RepoAction};
use crate::error::{FixtureError, Result};
use crate::git::GitIdentity;
use crate::interpreter::build_repo_from_definition;
use crate::scenario::clock::DEFAULT_STABLE_NOW;
use crate::scenario::git_flow::GitFlowFourChannels;
use crate::scenario::{CommitClock, DefinitionOptions, GitMergeMessage, RepoScenario};
use std::path::Path;

/// Everything besides the convention that changes the built repository
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettings {
    pub identity: GitIdentity,
    pub stable_now: String,
    pub tag_format: Option<String>,
    pub mask_initial_release: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            identity: GitIdentity::default(),
            stable_now: DEFAULT_STABLE_NOW.to_string(),
            tag_format: None,
            mask_initial_release: false,
        }
    }
}

impl BuildSettings {
    pub fn from_config(config: &FixtureConfig) -> Self {
        BuildSettings {
            identity: GitIdentity {
                name: config.git.author_name.clone(),
                email: config.git.author_email.clone(),
            },
            stable_now: config.clock.stable_now.clone(),
            ..BuildSettings::default()
        }
    }

    pub fn definition_options(&self, convention: CommitConvention) -> DefinitionOptions {
        let mut options = DefinitionOptions::new(convention)
            .with_masked_initial_release(self.mask_initial_release);
        if let Some(tag_format) = &self.tag_format {
            options = options.with_tag_format(tag_format.as_str());
        }
        options
    }

    fn fingerprint(&self, convention: CommitConvention) -> String {
        format!(
            "convention={}\nauthor={} <{}>\nstable_now={}\ntag_format={}\nmask_initial_release={}\n",
            convention,
            self.identity.name,
            self.identity.email,
            self.stable_now,
            self.tag_format.as_deref().unwrap_or(""),
            self.mask_initial_release
        )
    }
}

/// Cache name of the git flow repository for `convention`
pub fn repo_name_for(convention: CommitConvention) -> String {
    format!(
        "repo_w_git_flow_w_beta_alpha_rev_prereleases_n_{}_commits",
        convention
    )
}

/// Hash of everything that determines the repository a scenario builds
pub fn build_spec_hash(
    scenario: &dyn RepoScenario,
    convention: CommitConvention,
    settings: &BuildSettings,
) -> String {
    let fingerprint = settings.fingerprint(convention);
    let mut sources: Vec<(&str, &str)> = scenario.sources().to_vec();
    sources.push(("settings", fingerprint.as_str()));
    hash_sources(&sources)
}

/// Build (or reuse) `scenario` for `convention` and copy it into `dest_dir`
///
/// # Returns
/// * `Ok(Vec<RepoAction>)` - The definition the cached repository was built from
pub fn build_scenario_repo(
    cache: &RepoCache,
    scenario: &dyn RepoScenario,
    repo_name: &str,
    convention: CommitConvention,
    settings: &BuildSettings,
    dest_dir: &Path,
) -> Result<Vec<RepoAction>> {
    let hash = build_spec_hash(scenario, convention, settings);

    cache.ensure_built(
        repo_name,
        &hash,
        |repo_dir| {
            let options = settings.definition_options(convention);
            let mut clock = CommitClock::from_rfc3339(&settings.stable_now)?;
            let actions = scenario.definition(&options, &mut clock, &GitMergeMessage)?;
            build_repo_from_definition(repo_dir, &actions, settings.identity.clone())
        },
        dest_dir,
    )?;

    cached_definition(cache, repo_name, &hash)
}

/// Stored definition of `repo_name`, which must have been built for `build_spec_hash`
fn cached_definition(
    cache: &RepoCache,
    repo_name: &str,
    build_spec_hash: &str,
) -> Result<Vec<RepoAction>> {
    let data = cache
        .get_cached_repo_data(repo_name)?
        .ok_or_else(|| FixtureError::invariant("failed to retrieve repo data from cache"))?;

    if data.build_spec_hash != build_spec_hash {
        return Err(FixtureError::invariant(format!(
            "cache entry for '{}' was built for {}, expected {}",
            repo_name, data.build_spec_hash, build_spec_hash
        )));
    }
    Ok(data.build_definition)
}

/// Build the four-channel git flow repository into `dest_dir`
pub fn build_git_flow_repo_w_4_release_channels(
    cache: &RepoCache,
    repo_name: &str,
    convention: CommitConvention,
    settings: &BuildSettings,
    dest_dir: &Path,
) -> Result<Vec<RepoAction>> {
    build_scenario_repo(
        cache,
        &GitFlowFourChannels,
        repo_name,
        convention,
        settings,
        dest_dir,
    )
}
