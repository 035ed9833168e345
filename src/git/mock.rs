use crate::error::{FixtureError, Result};
use crate::git::{MergeMode, WorkTree};
use crate::scenario::DEFAULT_BRANCH_NAME;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// In-memory work tree for testing replay logic without libgit2
///
/// Branch history is flattened into a list of commit summaries, which is
/// enough to observe ordering and fast-forward behaviour.
pub struct MockWorkTree {
    current: String,
    branches: HashMap<String, Vec<String>>,
    files: BTreeMap<PathBuf, String>,
    tags: Vec<String>,
    operations: Vec<String>,
}

impl MockWorkTree {
    /// Create a new empty mock with an unborn `main` checked out
    pub fn new() -> Self {
        MockWorkTree {
            current: DEFAULT_BRANCH_NAME.to_string(),
            branches: HashMap::new(),
            files: BTreeMap::new(),
            tags: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Every mutating call in order, e.g. `commit main: Initial commit`
    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(|s| s.as_str())
    }

    fn history(&self, branch: &str) -> Result<&Vec<String>> {
        self.branches
            .get(branch)
            .ok_or_else(|| FixtureError::config(format!("Branch not found: {}", branch)))
    }
}

impl Default for MockWorkTree {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkTree for MockWorkTree {
    fn current_branch(&self) -> Result<String> {
        Ok(self.current.clone())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.branches.contains_key(name))
    }

    fn create_branch(&mut self, name: &str, start_branch: &str) -> Result<()> {
        let history = self.history(start_branch)?.clone();
        self.branches.insert(name.to_string(), history);
        self.operations
            .push(format!("branch {} from {}", name, start_branch));
        self.checkout(name)
    }

    fn checkout(&mut self, name: &str) -> Result<()> {
        self.history(name)?;
        self.current = name.to_string();
        self.operations.push(format!("checkout {}", name));
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn commit(&mut self, message: &str, _datetime: &str) -> Result<String> {
        let summary = message.lines().next().unwrap_or_default().to_string();
        let history = self.branches.entry(self.current.clone()).or_default();
        history.push(summary.clone());
        let id = format!("mock-{}", history.len());

        self.operations
            .push(format!("commit {}: {}", self.current, summary));
        Ok(id)
    }

    fn merge(&mut self, branch: &str, mode: MergeMode<'_>) -> Result<()> {
        let source = self.history(branch)?.clone();
        let target = self.history(&self.current)?.clone();

        let merged = match mode {
            MergeMode::FastForward => {
                if !source.starts_with(&target) {
                    return Err(FixtureError::merge(format!(
                        "cannot fast-forward '{}' to '{}'",
                        self.current, branch
                    )));
                }
                self.operations
                    .push(format!("fast-forward {} to {}", self.current, branch));
                source
            }
            MergeMode::NoFastForward(commit_def) => {
                let mut merged = target.clone();
                merged.extend(source.into_iter().filter(|s| !target.contains(s)));
                merged.push(commit_def.msg.clone());
                self.operations
                    .push(format!("merge {} into {}", branch, self.current));
                merged
            }
        };

        self.branches.insert(self.current.clone(), merged);
        Ok(())
    }

    fn tag(&mut self, name: &str, _message: &str, _datetime: &str) -> Result<()> {
        if self.tags.iter().any(|t| t == name) {
            return Err(FixtureError::config(format!("Tag already exists: {}", name)));
        }
        self.tags.push(name.to_string());
        self.operations.push(format!("tag {}", name));
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let mut tags = self.tags.clone();
        tags.sort();
        Ok(tags)
    }

    fn branch_log(&self, branch: &str) -> Result<Vec<String>> {
        Ok(self.history(branch)?.clone())
    }
}
