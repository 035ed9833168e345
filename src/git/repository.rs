use crate::error::{FixtureError, Result};
use crate::git::{MergeMode, WorkTree};
use crate::scenario::clock::parse_timestamp;
use crate::scenario::DEFAULT_BRANCH_NAME;
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, Commit, ErrorCode, IndexAddOption, Oid, Repository, RepositoryInitOptions,
    Signature, Sort, Time,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Author and committer identity stamped on every generated commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

impl Default for GitIdentity {
    fn default() -> Self {
        GitIdentity {
            name: "semantic-release".to_string(),
            email: "semantic-release@example.com".to_string(),
        }
    }
}

/// Work tree backed by a git2 repository
pub struct Git2WorkTree {
    repo: Repository,
    identity: GitIdentity,
}

impl Git2WorkTree {
    /// Initialise a fresh repository at `path` whose unborn HEAD points at `main`
    pub fn init<P: AsRef<Path>>(path: P, identity: GitIdentity) -> Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(DEFAULT_BRANCH_NAME);
        let repo = Repository::init_opts(path, &opts)?;

        {
            let mut config = repo.config()?;
            config.set_str("user.name", &identity.name)?;
            config.set_str("user.email", &identity.email)?;
            config.set_bool("commit.gpgsign", false)?;
            config.set_bool("tag.gpgsign", false)?;
        }

        log::debug!("initialised repository at {}", path.display());
        Ok(Git2WorkTree { repo, identity })
    }

    /// Open an existing repository
    pub fn open<P: AsRef<Path>>(path: P, identity: GitIdentity) -> Result<Self> {
        let repo = Repository::open(path)?;
        Ok(Git2WorkTree { repo, identity })
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| FixtureError::config("Repository has no working directory"))
    }

    fn full_path(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.workdir()?.join(path))
    }

    fn signature(&self, datetime: &str) -> Result<Signature<'static>> {
        let ts = parse_timestamp(datetime)?;
        let time = Time::new(ts.timestamp(), ts.offset().local_minus_utc() / 60);
        Ok(Signature::new(
            &self.identity.name,
            &self.identity.email,
            &time,
        )?)
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn branch_oid(&self, name: &str) -> Result<Oid> {
        let branch = self.repo.find_branch(name, BranchType::Local).map_err(|e| {
            FixtureError::config(format!("Cannot find branch '{}': {}", name, e))
        })?;
        let commit = branch.get().peel_to_commit()?;
        Ok(commit.id())
    }

    fn force_checkout_head(&self) -> Result<()> {
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo.checkout_head(Some(&mut checkout))?;
        Ok(())
    }
}

impl WorkTree for Git2WorkTree {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.find_reference("HEAD")?;
        let target = head
            .symbolic_target()
            .ok_or_else(|| FixtureError::config("HEAD is detached"))?;

        Ok(target.trim_start_matches("refs/heads/").to_string())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_branch(&mut self, name: &str, start_branch: &str) -> Result<()> {
        {
            let start = self.repo.find_commit(self.branch_oid(start_branch)?)?;
            self.repo.branch(name, &start, false)?;
        }
        self.checkout(name)
    }

    fn checkout(&mut self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", name);
        let target = self.repo.revparse_single(&refname).map_err(|e| {
            FixtureError::config(format!("Cannot check out '{}': {}", name, e))
        })?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo.checkout_tree(&target, Some(&mut checkout))?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        let full_path = self.full_path(path)?;
        if !full_path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(full_path)?))
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full_path, contents)?;
        Ok(())
    }

    fn commit(&mut self, message: &str, datetime: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.signature(datetime)?;
        let parent = self.head_commit()?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(oid.to_string())
    }

    fn merge(&mut self, branch: &str, mode: MergeMode<'_>) -> Result<()> {
        let current = self.current_branch()?;
        let head_oid = self.branch_oid(&current)?;
        let source_oid = self.branch_oid(branch)?;

        match mode {
            MergeMode::FastForward => {
                if head_oid == source_oid {
                    log::debug!("'{}' already up to date with '{}'", current, branch);
                    return Ok(());
                }
                if !self.repo.graph_descendant_of(source_oid, head_oid)? {
                    return Err(FixtureError::merge(format!(
                        "cannot fast-forward '{}' to '{}': histories diverged",
                        current, branch
                    )));
                }

                let mut reference = self.repo.find_reference(&format!("refs/heads/{}", current))?;
                reference.set_target(source_oid, &format!("merge {}: Fast-forward", branch))?;
            }
            MergeMode::NoFastForward(commit_def) => {
                let head = self.repo.find_commit(head_oid)?;
                let source = self.repo.find_commit(source_oid)?;

                let mut index = self.repo.merge_commits(&head, &source, None)?;
                if index.has_conflicts() {
                    let paths: Vec<String> = index
                        .conflicts()?
                        .filter_map(|c| c.ok())
                        .filter_map(|c| c.our.or(c.their))
                        .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
                        .collect();
                    return Err(FixtureError::merge(format!(
                        "merging '{}' into '{}' conflicts in: {}",
                        branch,
                        current,
                        paths.join(", ")
                    )));
                }

                let tree = self.repo.find_tree(index.write_tree_to(&self.repo)?)?;
                let signature = self.signature(&commit_def.datetime)?;
                self.repo.commit(
                    Some("HEAD"),
                    &signature,
                    &signature,
                    &commit_def.msg,
                    &tree,
                    &[&head, &source],
                )?;
            }
        }

        self.force_checkout_head()
    }

    fn tag(&mut self, name: &str, message: &str, datetime: &str) -> Result<()> {
        let head = self
            .head_commit()?
            .ok_or_else(|| FixtureError::config(format!("Cannot tag '{}' before the first commit", name)))?;
        let tagger = self.signature(datetime)?;

        self.repo.tag(name, head.as_object(), &tagger, message, false)?;
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;
        let mut names: Vec<String> = tags.iter().flatten().map(|s| s.to_string()).collect();
        names.sort();
        Ok(names)
    }

    fn branch_log(&self, branch: &str) -> Result<Vec<String>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(self.branch_oid(branch)?)?;

        let mut summaries = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            summaries.push(commit.summary().unwrap_or("(empty message)").to_string());
        }

        summaries.reverse();
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CommitDefinition;
    use tempfile::TempDir;

    fn init_tree() -> (TempDir, Git2WorkTree) {
        let temp_dir = TempDir::new().expect("Could not create temp dir");
        let tree = Git2WorkTree::init(temp_dir.path(), GitIdentity::default())
            .expect("Could not init repository");
        (temp_dir, tree)
    }

    #[test]
    fn test_init_starts_on_main() {
        let (_dir, tree) = init_tree();
        assert_eq!(tree.current_branch().unwrap(), "main");
        assert!(!tree.branch_exists("main").unwrap());
    }

    #[test]
    fn test_commit_uses_given_timestamp() {
        let (_dir, mut tree) = init_tree();
        tree.write_file(Path::new("README.md"), "hello\n").unwrap();
        let oid = tree
            .commit("Initial commit", "2024-01-01T10:00:00+02:00")
            .unwrap();

        let commit = tree
            .repository()
            .find_commit(Oid::from_str(&oid).unwrap())
            .unwrap();
        assert_eq!(commit.time().seconds(), 1704096000);
        assert_eq!(commit.time().offset_minutes(), 120);
        assert_eq!(commit.author().name(), Some("semantic-release"));
    }

    #[test]
    fn test_fast_forward_and_merge_commit() {
        let (_dir, mut tree) = init_tree();
        tree.write_file(Path::new("a.txt"), "a\n").unwrap();
        tree.commit("Initial commit", "2024-01-01T00:00:00+00:00").unwrap();

        tree.create_branch("dev", "main").unwrap();
        tree.write_file(Path::new("b.txt"), "b\n").unwrap();
        tree.commit("feat: b", "2024-01-01T00:00:01+00:00").unwrap();

        tree.checkout("main").unwrap();
        assert_eq!(tree.read_file(Path::new("b.txt")).unwrap(), None);

        let merge_def = CommitDefinition {
            msg: "Merge branch 'dev' into 'main'".to_string(),
            datetime: "2024-01-01T00:00:02+00:00".to_string(),
            include_in_changelog: false,
        };
        tree.merge("dev", MergeMode::NoFastForward(&merge_def)).unwrap();
        assert_eq!(tree.read_file(Path::new("b.txt")).unwrap().as_deref(), Some("b\n"));

        tree.checkout("dev").unwrap();
        tree.merge("main", MergeMode::FastForward).unwrap();
        assert_eq!(
            tree.branch_log("dev").unwrap(),
            vec!["Initial commit", "feat: b", "Merge branch 'dev' into 'main'"]
        );
    }

    #[test]
    fn test_fast_forward_rejects_diverged_branches() {
        let (_dir, mut tree) = init_tree();
        tree.write_file(Path::new("a.txt"), "a\n").unwrap();
        tree.commit("Initial commit", "2024-01-01T00:00:00+00:00").unwrap();
        tree.create_branch("dev", "main").unwrap();
        tree.write_file(Path::new("b.txt"), "b\n").unwrap();
        tree.commit("on dev", "2024-01-01T00:00:01+00:00").unwrap();
        tree.checkout("main").unwrap();
        tree.write_file(Path::new("c.txt"), "c\n").unwrap();
        tree.commit("on main", "2024-01-01T00:00:02+00:00").unwrap();

        let err = tree.merge("dev", MergeMode::FastForward).unwrap_err();
        assert!(matches!(err, FixtureError::Merge(_)));
    }

    #[test]
    fn test_tag_and_list() {
        let (_dir, mut tree) = init_tree();
        tree.write_file(Path::new("a.txt"), "a\n").unwrap();
        tree.commit("Initial commit", "2024-01-01T00:00:00+00:00").unwrap();
        tree.tag("v1.0.0", "v1.0.0", "2024-01-01T00:00:01+00:00").unwrap();
        tree.tag("v1.1.0-rev.1+feat/feature-2", "rev", "2024-01-01T00:00:02+00:00")
            .unwrap();

        assert_eq!(
            tree.list_tags().unwrap(),
            vec!["v1.0.0", "v1.1.0-rev.1+feat/feature-2"]
        );
    }
}
