// tests/git_flow_definition_test.rs
use repo_fixtures::domain::{CommitConvention, RepoAction};
use repo_fixtures::scenario::clock::{parse_timestamp, DEFAULT_STABLE_NOW};
use repo_fixtures::scenario::git_flow::repo_definition;
use repo_fixtures::scenario::{
    CommitClock, DefinitionOptions, GitMergeMessage, MergeMessageFormatter,
};
use repo_fixtures::validate::validate_definition;

fn generate_with(
    convention: CommitConvention,
    formatter: &dyn MergeMessageFormatter,
) -> Vec<RepoAction> {
    let mut clock = CommitClock::from_rfc3339(DEFAULT_STABLE_NOW).unwrap();
    repo_definition(&DefinitionOptions::new(convention), &mut clock, formatter).unwrap()
}

fn generate(convention: CommitConvention) -> Vec<RepoAction> {
    generate_with(convention, &GitMergeMessage)
}

/// Every timestamp in replay order, including release and merge commits
fn timestamps(actions: &[RepoAction]) -> Vec<String> {
    let mut out = Vec::new();
    for action in actions {
        match action {
            RepoAction::MakeCommits(details) => {
                out.extend(details.commits.iter().map(|c| c.datetime.clone()))
            }
            RepoAction::GitMerge(details) => {
                if let Some(def) = &details.commit_def {
                    out.push(def.datetime.clone());
                }
            }
            RepoAction::Release(details) => out.push(details.datetime.clone()),
            _ => {}
        }
    }
    out
}

#[test]
fn test_definition_is_deterministic() {
    for convention in CommitConvention::ALL {
        assert_eq!(generate(convention), generate(convention));
    }
}

#[test]
fn test_timestamps_strictly_increase() {
    let stamps = timestamps(&generate(CommitConvention::Angular));
    let parsed: Vec<_> = stamps.iter().map(|s| parse_timestamp(s).unwrap()).collect();
    assert!(parsed.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_release_sequence() {
    let versions: Vec<String> = generate(CommitConvention::Scipy)
        .iter()
        .filter_map(|a| match a {
            RepoAction::Release(details) => Some(details.version.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(
        versions,
        vec![
            "1.0.0",
            "1.0.1-alpha.1",
            "1.0.1-beta.1",
            "1.0.1-alpha.2",
            "1.0.1-beta.2",
            "1.1.0-rev.1+feat/feature-2",
            "1.1.0-alpha.1",
            "1.1.0-beta.1",
            "1.1.0",
        ]
    );
}

struct Arrow;

impl MergeMessageFormatter for Arrow {
    fn format(&self, branch_name: &str, target_branch_name: &str) -> String {
        format!("{} => {}", branch_name, target_branch_name)
    }
}

#[test]
fn test_merge_messages_come_from_formatter() {
    let actions = generate_with(CommitConvention::Angular, &Arrow);

    let mut current = "main".to_string();
    let mut checked = 0;
    for action in &actions {
        match action {
            RepoAction::GitCheckout(details) => current = details.target().to_string(),
            RepoAction::GitMerge(details) if !details.fast_forward => {
                let def = details.commit_def.as_ref().unwrap();
                assert_eq!(def.msg, format!("{} => {}", details.branch_name, current));
                checked += 1;
            }
            _ => {}
        }
    }
    assert_eq!(checked, 10);
}

#[test]
fn test_generated_definitions_validate() {
    for convention in CommitConvention::ALL {
        validate_definition(&generate(convention)).unwrap();
    }
}

#[test]
fn test_duplicated_timestamp_fails_validation() {
    let mut actions = generate(CommitConvention::Angular);
    let first = timestamps(&actions)[0].clone();
    for action in actions.iter_mut() {
        if let RepoAction::Release(details) = action {
            details.datetime = first.clone();
            break;
        }
    }
    assert!(validate_definition(&actions).is_err());
}

#[test]
fn test_wire_format_round_trips_through_json() {
    let actions = generate(CommitConvention::Emoji);
    let json = serde_json::to_string(&actions).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value[0]["action"], "CONFIGURE");
    assert_eq!(value[1]["action"], "MAKE_COMMITS");
    let back: Vec<RepoAction> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, actions);
}
