//! Work tree abstraction layer
//!
//! The interpreter replays actions against the [`WorkTree`] trait rather than a
//! concrete repository, so the replay logic can be exercised without libgit2.
//!
//! - [`repository::Git2WorkTree`]: real repository backed by the `git2` crate
//! - [`mock::MockWorkTree`]: in-memory recorder for tests
//!
//! ```rust
//! # use repo_fixtures::git::{MergeMode, WorkTree};
//! # fn example<W: WorkTree>(tree: &mut W) -> repo_fixtures::Result<()> {
//! tree.checkout("beta")?;
//! tree.merge("main", MergeMode::FastForward)?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockWorkTree;
pub use repository::{Git2WorkTree, GitIdentity};

use crate::domain::CommitDefinition;
use crate::error::Result;
use std::path::Path;

/// How a branch is merged into the current checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode<'a> {
    /// Move the current branch pointer; fails unless it is an ancestor of the source
    FastForward,
    /// Always record a merge commit with the given message and timestamp
    NoFastForward(&'a CommitDefinition),
}

/// Mutating git operations needed to replay a repo definition
///
/// Paths are relative to the work tree root. Timestamps are RFC 3339 strings
/// as produced by the commit clock.
pub trait WorkTree {
    /// Name of the checked out branch (also valid before the first commit)
    fn current_branch(&self) -> Result<String>;

    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Create `name` at the tip of `start_branch` and check it out
    fn create_branch(&mut self, name: &str, start_branch: &str) -> Result<()>;

    /// Check out an existing branch, discarding nothing since the tree is always clean
    fn checkout(&mut self, name: &str) -> Result<()>;

    fn read_file(&self, path: &Path) -> Result<Option<String>>;

    fn write_file(&mut self, path: &Path, contents: &str) -> Result<()>;

    /// Stage every change and commit it on the current branch
    ///
    /// # Returns
    /// * `Ok(String)` - Identifier of the new commit
    fn commit(&mut self, message: &str, datetime: &str) -> Result<String>;

    /// Merge `branch` into the current branch
    fn merge(&mut self, branch: &str, mode: MergeMode<'_>) -> Result<()>;

    /// Create an annotated tag on the current HEAD
    fn tag(&mut self, name: &str, message: &str, datetime: &str) -> Result<()>;

    /// All tag names, sorted
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Commit summaries reachable from `branch`, oldest first
    fn branch_log(&self, branch: &str) -> Result<Vec<String>>;
}
