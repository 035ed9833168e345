use crate::error::{FixtureError, Result};

/// Default tag naming pattern
pub const DEFAULT_TAG_FORMAT: &str = "v{version}";

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFormat {
    pub pattern: String,
}

impl TagFormat {
    /// Create a tag format, requiring the `{version}` placeholder
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if !pattern.contains("{version}") {
            return Err(FixtureError::config(format!(
                "Tag format '{}' must contain {{version}} placeholder",
                pattern
            )));
        }
        Ok(TagFormat { pattern })
    }

    /// Resolve an optional pattern, falling back to `v{version}`
    pub fn from_option(pattern: Option<&str>) -> Result<Self> {
        TagFormat::new(pattern.unwrap_or(DEFAULT_TAG_FORMAT))
    }

    /// Example: pattern="v{version}", version="1.2.3" -> "v1.2.3"
    pub fn format(&self, version: &str) -> String {
        self.pattern.replace("{version}", version)
    }
}

impl Default for TagFormat {
    fn default() -> Self {
        TagFormat {
            pattern: DEFAULT_TAG_FORMAT.to_string(),
        }
    }
}
