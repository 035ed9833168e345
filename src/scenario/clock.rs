use crate::error::{FixtureError, Result};
use chrono::{DateTime, Duration, FixedOffset, SecondsFormat};

/// Reference time used when no other is configured
pub const DEFAULT_STABLE_NOW: &str = "2024-01-01T00:00:00+00:00";

/// Strictly increasing commit timestamps: `start`, `start + 1s`, `start + 2s`, ...
///
/// Every commit, merge and release in a definition takes exactly one value, so
/// no two history entries ever share a timestamp.
#[derive(Debug, Clone)]
pub struct CommitClock {
    start: DateTime<FixedOffset>,
    ticks: i64,
}

impl CommitClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        CommitClock { start, ticks: 0 }
    }

    /// Create a clock from an RFC 3339 reference time
    pub fn from_rfc3339(start: &str) -> Result<Self> {
        let start = DateTime::parse_from_rfc3339(start).map_err(|e| {
            FixtureError::config(format!("Invalid reference time '{}': {}", start, e))
        })?;
        Ok(CommitClock::new(start))
    }

    /// ISO-8601 timestamp (second precision) of the next tick
    pub fn next_timestamp(&mut self) -> String {
        let ts = self.start + Duration::seconds(self.ticks);
        self.ticks += 1;
        ts.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Number of timestamps handed out so far
    pub fn ticks(&self) -> i64 {
        self.ticks
    }
}

impl Iterator for CommitClock {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_timestamp())
    }
}

/// Parse a timestamp produced by [`CommitClock`] (or any RFC 3339 string)
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| FixtureError::config(format!("Invalid timestamp '{}': {}", value, e)))
}
