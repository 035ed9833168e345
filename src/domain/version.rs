use crate::domain::prerelease::Prerelease;
use crate::error::{FixtureError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Release version: semver core and prerelease, plus verbatim build metadata.
///
/// Build metadata is kept outside of `semver` because fixture versions embed
/// branch names (`1.1.0-rev.1+feat/feature-2`) which semver identifiers reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    core: semver::Version,
    build_metadata: Option<String>,
}

impl ReleaseVersion {
    /// Parse a version string (e.g., "1.0.1-beta.2", "1.1.0-rev.1+feat/feature-2")
    pub fn parse(s: &str) -> Result<Self> {
        let (core_str, build_metadata) = match s.split_once('+') {
            Some((core, meta)) if meta.is_empty() => {
                return Err(FixtureError::version(format!(
                    "Empty build metadata in '{}' (core '{}')",
                    s, core
                )))
            }
            Some((core, meta)) => (core, Some(meta.to_string())),
            None => (s, None),
        };

        let core = semver::Version::parse(core_str)
            .map_err(|e| FixtureError::version(format!("Invalid version '{}': {}", s, e)))?;

        Ok(ReleaseVersion {
            core,
            build_metadata,
        })
    }

    pub fn major(&self) -> u64 {
        self.core.major
    }

    pub fn is_prerelease(&self) -> bool {
        !self.core.pre.is_empty()
    }

    pub fn prerelease(&self) -> Result<Option<Prerelease>> {
        if self.core.pre.is_empty() {
            return Ok(None);
        }
        Prerelease::parse(self.core.pre.as_str()).map(Some)
    }

    /// Channel token of the prerelease, `None` for stable versions
    pub fn channel(&self) -> Result<Option<String>> {
        Ok(self.prerelease()?.map(|pr| pr.token))
    }

    pub fn build_metadata(&self) -> Option<&str> {
        self.build_metadata.as_deref()
    }

    /// Compare by semver precedence, ignoring build metadata
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.core.cmp(&other.core)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.core)?;
        if let Some(meta) = &self.build_metadata {
            write!(f, "+{}", meta)?;
        }
        Ok(())
    }
}
