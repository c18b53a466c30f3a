use serde::{Deserialize, Serialize};

/// One extracted table, rectangular by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<String>>,
}

impl TableRecord {
    /// `data` must already be normalized to equal-width rows.
    pub fn new(title: String, data: Vec<Vec<String>>) -> Self {
        Self {
            title,
            rows: data.len(),
            cols: data.first().map(Vec::len).unwrap_or(0),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedTable {
    pub index: usize,
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    pub file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub url: Option<String>,
    pub hostname: String,
    pub policy_applied: bool,
    pub format: String,
    pub table_count: usize,
    pub tables: Vec<ExportedTable>,
}
