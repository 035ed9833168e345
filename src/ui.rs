//! Terminal output for the command line tool.
//!
//! `format_*` functions build plain strings and are unit tested; `display_*`
//! functions style and print them.

use crate::domain::{CommitConvention, RepoAction};
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Versions released by a definition, in order
pub fn release_versions(actions: &[RepoAction]) -> Vec<&str> {
    actions
        .iter()
        .filter_map(|action| match action {
            RepoAction::Release(details) => Some(details.version.as_str()),
            _ => None,
        })
        .collect()
}

/// One numbered line per release.
pub fn format_release_summary(actions: &[RepoAction]) -> Vec<String> {
    release_versions(actions)
        .iter()
        .enumerate()
        .map(|(i, version)| format!("{:>2}. {}", i + 1, version))
        .collect()
}

pub fn display_release_summary(repo_name: &str, actions: &[RepoAction]) {
    println!("\n{}", style(format!("Releases in '{}':", repo_name)).bold());
    for line in format_release_summary(actions) {
        println!("  {}", style(line).cyan());
    }
}

/// Display scenarios and the conventions each can be generated for.
pub fn display_scenarios(names: &[&str]) {
    println!("{}", style("Scenarios:").bold());
    for name in names {
        println!("  {}", name);
    }

    let conventions: Vec<&str> = CommitConvention::ALL.iter().map(|c| c.as_str()).collect();
    println!("{} {}", style("Conventions:").bold(), conventions.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReleaseDetails;

    fn release(version: &str) -> RepoAction {
        RepoAction::Release(ReleaseDetails {
            version: version.to_string(),
            datetime: "2024-01-01T00:00:00+00:00".to_string(),
            pre_actions: vec![],
        })
    }

    #[test]
    fn test_release_summary_numbers_releases() {
        let actions = vec![
            release("1.0.0"),
            RepoAction::checkout("dev"),
            release("1.0.1-alpha.1"),
        ];
        assert_eq!(
            format_release_summary(&actions),
            vec![" 1. 1.0.0", " 2. 1.0.1-alpha.1"]
        );
    }

    #[test]
    fn test_release_versions_empty() {
        assert!(release_versions(&[RepoAction::checkout("dev")]).is_empty());
    }
}
