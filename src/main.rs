use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use repo_fixtures::cache::RepoCache;
use repo_fixtures::config::{self, FixtureConfig};
use repo_fixtures::domain::CommitConvention;
use repo_fixtures::fixtures::{self, BuildSettings};
use repo_fixtures::scenario::{self, CommitClock, GitMergeMessage};
use repo_fixtures::ui;

#[derive(Parser)]
#[command(
    name = "repo-fixtures",
    version,
    about = "Build deterministic git repositories for release tooling tests"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a scenario definition as JSON
    Definition {
        #[arg(long, help = "Commit convention: angular, emoji or scipy")]
        convention: CommitConvention,

        #[arg(long, default_value = scenario::git_flow::SCENARIO_NAME)]
        scenario: String,

        #[arg(long, help = "Tag format containing {version}")]
        tag_format: Option<String>,

        #[arg(long, help = "Mask the first release in changelogs")]
        mask_initial_release: bool,
    },

    /// Build a scenario repository (through the cache) into a directory
    Build {
        #[arg(long, help = "Commit convention: angular, emoji or scipy")]
        convention: CommitConvention,

        #[arg(long, help = "Destination directory for the working tree")]
        dest: PathBuf,

        #[arg(long, default_value = scenario::git_flow::SCENARIO_NAME)]
        scenario: String,

        #[arg(long, help = "Override the cache directory")]
        cache_dir: Option<PathBuf>,
    },

    /// Show available scenarios and conventions
    List,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Definition {
            convention,
            scenario,
            tag_format,
            mask_initial_release,
        } => print_definition(&config, convention, &scenario, tag_format, mask_initial_release),
        Command::Build {
            convention,
            dest,
            scenario,
            cache_dir,
        } => build(&config, convention, &scenario, dest, cache_dir),
        Command::List => {
            let names: Vec<&str> = scenario::scenarios().iter().map(|s| s.name()).collect();
            ui::display_scenarios(&names);
            Ok(())
        }
    }
}

fn find_scenario(name: &str) -> Result<Box<dyn scenario::RepoScenario>> {
    scenario::find_scenario(name).with_context(|| format!("Unknown scenario '{}'", name))
}

fn print_definition(
    config: &FixtureConfig,
    convention: CommitConvention,
    scenario_name: &str,
    tag_format: Option<String>,
    mask_initial_release: bool,
) -> Result<()> {
    let scenario = find_scenario(scenario_name)?;
    let settings = BuildSettings {
        tag_format,
        mask_initial_release,
        ..BuildSettings::from_config(config)
    };

    let mut clock = CommitClock::from_rfc3339(&settings.stable_now)?;
    let actions = scenario.definition(
        &settings.definition_options(convention),
        &mut clock,
        &GitMergeMessage,
    )?;

    println!("{}", serde_json::to_string_pretty(&actions)?);
    Ok(())
}

fn build(
    config: &FixtureConfig,
    convention: CommitConvention,
    scenario_name: &str,
    dest: PathBuf,
    cache_dir: Option<PathBuf>,
) -> Result<()> {
    let scenario = find_scenario(scenario_name)?;
    let cache_root = cache_dir.unwrap_or_else(|| config.cache.resolved_dir());
    let cache = RepoCache::new(&cache_root);
    let settings = BuildSettings::from_config(config);

    let repo_name = if scenario_name == scenario::git_flow::SCENARIO_NAME {
        fixtures::repo_name_for(convention)
    } else {
        format!("{}_{}", scenario_name, convention)
    };

    ui::display_status(&format!(
        "Building '{}' (cache: {})",
        repo_name,
        cache_root.display()
    ));

    let actions = fixtures::build_scenario_repo(
        &cache,
        scenario.as_ref(),
        &repo_name,
        convention,
        &settings,
        &dest,
    )
    .with_context(|| format!("Failed to build '{}'", repo_name))?;

    ui::display_success(&format!("Repository written to {}", dest.display()));
    ui::display_release_summary(&repo_name, &actions);
    Ok(())
}
