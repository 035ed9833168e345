//! Prerelease identifiers such as `alpha.1` or `rev.3`
//!
//! The first dot-separated identifier is the channel token, the optional second
//! one the iteration within that channel.

use crate::error::{FixtureError, Result};
use std::fmt;

/// Parsed prerelease identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerelease {
    /// Channel token (alpha, beta, rev, ...)
    pub token: String,
    /// Iteration number within the channel
    pub iteration: Option<u64>,
}

impl Prerelease {
    pub fn new(token: impl Into<String>, iteration: Option<u64>) -> Self {
        Prerelease {
            token: token.into(),
            iteration,
        }
    }

    /// Parse a prerelease string like "beta.2"
    ///
    /// # Returns
    /// * `Ok(Prerelease)` - Parsed token and iteration
    /// * `Err` - If the string is empty, the token has invalid characters, or
    ///   the iteration is not numeric
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(FixtureError::version("Empty prerelease identifier"));
        }

        let mut parts = s.splitn(2, '.');
        let token = parts.next().unwrap_or_default();

        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(FixtureError::version(format!(
                "Invalid prerelease token: '{}'",
                s
            )));
        }

        let iteration = match parts.next() {
            Some(n) => Some(n.parse::<u64>().map_err(|_| {
                FixtureError::version(format!("Invalid prerelease iteration: '{}'", n))
            })?),
            None => None,
        };

        Ok(Prerelease::new(token, iteration))
    }
}

impl fmt::Display for Prerelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)?;
        if let Some(iter) = self.iteration {
            write!(f, ".{}", iter)?;
        }
        Ok(())
    }
}
