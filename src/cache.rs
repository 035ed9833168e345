//! Build-once cache of generated repositories.
//!
//! Layout under the cache root:
//!
//! ```text
//! <root>/<repo_name>/repo/        working tree including .git
//! <root>/<repo_name>/cache.json   { build_spec_hash, build_definition }
//! ```

use crate::domain::RepoAction;
use crate::error::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const CACHE_DATA_FILE: &str = "cache.json";
pub const CACHE_REPO_DIR: &str = "repo";

/// What a cache entry remembers about the repository it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRepoData {
    pub build_spec_hash: String,
    pub build_definition: Vec<RepoAction>,
}

/// Hash a list of files by path and content, in the given order
pub fn hash_files<P: AsRef<Path>>(paths: &[P]) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for path in paths {
        let path = path.as_ref();
        let content = fs::read(path)?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hasher.update(&content);
        hasher.update(&[0]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash named in-memory sources the same way [`hash_files`] hashes files
pub fn hash_sources(sources: &[(&str, &str)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (name, content) in sources {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        hasher.update(content.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}

/// Recursively copy `src` into `dst`, creating `dst` if needed
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// Session-wide cache of built repositories
///
/// The memo table is held for the whole check-then-build, so two callers
/// asking for the same `(repo_name, hash)` never both run the build.
pub struct RepoCache {
    root: PathBuf,
    built: Mutex<HashMap<(String, String), PathBuf>>,
}

impl RepoCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RepoCache {
            root: root.into(),
            built: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, repo_name: &str) -> PathBuf {
        self.root.join(repo_name)
    }

    /// Make sure `repo_name` is built for `build_spec_hash`, then copy it to `dest_dir`
    ///
    /// # Arguments
    /// * `build_fn` - Builds the repository in the directory it is given and
    ///   returns the definition it replayed
    pub fn ensure_built<F>(
        &self,
        repo_name: &str,
        build_spec_hash: &str,
        build_fn: F,
        dest_dir: &Path,
    ) -> Result<()>
    where
        F: FnOnce(&Path) -> Result<Vec<RepoAction>>,
    {
        let mut built = self
            .built
            .lock()
            .map_err(|_| FixtureError::cache("repo cache lock poisoned"))?;

        let key = (repo_name.to_string(), build_spec_hash.to_string());
        let repo_dir = match built.get(&key) {
            Some(dir) => {
                log::debug!("{} already built this session", repo_name);
                dir.clone()
            }
            None => {
                // One on-disk entry per repo name; whatever hash it held is gone now
                built.retain(|(name, _), _| name != repo_name);
                let dir = self.build_entry(repo_name, build_spec_hash, build_fn)?;
                built.insert(key, dir.clone());
                dir
            }
        };

        copy_dir_all(&repo_dir, dest_dir)
    }

    fn build_entry<F>(&self, repo_name: &str, build_spec_hash: &str, build_fn: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<Vec<RepoAction>>,
    {
        let entry_dir = self.entry_dir(repo_name);
        let repo_dir = entry_dir.join(CACHE_REPO_DIR);

        if let Some(data) = self.get_cached_repo_data(repo_name)? {
            if data.build_spec_hash == build_spec_hash && repo_dir.is_dir() {
                log::info!("reusing cached {} ({})", repo_name, short_hash(build_spec_hash));
                return Ok(repo_dir);
            }
        }

        log::info!("building {} ({})", repo_name, short_hash(build_spec_hash));
        if entry_dir.exists() {
            fs::remove_dir_all(&entry_dir)?;
        }
        fs::create_dir_all(&repo_dir)?;

        let build_definition = build_fn(&repo_dir)?;
        let data = CachedRepoData {
            build_spec_hash: build_spec_hash.to_string(),
            build_definition,
        };
        fs::write(
            entry_dir.join(CACHE_DATA_FILE),
            serde_json::to_string_pretty(&data)?,
        )?;

        Ok(repo_dir)
    }

    /// Read the stored data of a cache entry
    ///
    /// # Returns
    /// * `Ok(None)` - No entry has been written for `repo_name`
    pub fn get_cached_repo_data(&self, repo_name: &str) -> Result<Option<CachedRepoData>> {
        let data_file = self.entry_dir(repo_name).join(CACHE_DATA_FILE);
        if !data_file.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&data_file)?;
        let data = serde_json::from_str(&text).map_err(|e| {
            FixtureError::cache(format!("corrupt cache data {}: {}", data_file.display(), e))
        })?;
        Ok(Some(data))
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
