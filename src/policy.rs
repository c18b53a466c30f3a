use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Site-specific rules that drop marker columns and footer rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExclusionPolicy {
    /// Hostname suffix the policy is scoped to, written with its leading dot.
    pub domain_suffix: String,
    /// Class name that marks cells whose columns are dropped.
    pub skip_column_marker: String,
    pub skip_footer_rows: bool,
}

impl ExclusionPolicy {
    pub fn builtin() -> Self {
        Self {
            domain_suffix: ".umusic.net".to_string(),
            skip_column_marker: "mat-column-select".to_string(),
            skip_footer_rows: true,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse exclusion policy {}", path.display()))
    }

    /// Matches the apex domain itself as well as any subdomain of it.
    pub fn applies_to(&self, hostname: &str) -> bool {
        let suffix = self.domain_suffix.trim();
        let bare = suffix.strip_prefix('.').unwrap_or(suffix).to_ascii_lowercase();
        if bare.is_empty() {
            return false;
        }

        let host = hostname.trim().trim_end_matches('.').to_ascii_lowercase();
        host == bare || host.ends_with(&format!(".{bare}"))
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}
