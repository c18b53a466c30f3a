use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

static SLUG_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9]+").expect("SLUG_SEPARATORS: hardcoded regex is valid")
});

const MAX_SLUG_CHARS: usize = 60;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    write_file(path, &data)
}

pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let mut file = File::create(path)
        .with_context(|| format!("failed to create file: {}", path.display()))?;
    file.write_all(data)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize file: {}", path.display()))?;

    Ok(())
}

/// Lowercase ASCII file-name stem for a table title.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = SLUG_SEPARATORS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    let truncated = slug
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string();

    if truncated.is_empty() {
        "table".to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::{sha256_hex, slugify};

    #[test]
    fn slugify_collapses_punctuation_and_spaces() {
        assert_eq!(slugify("Q3 Results (EUR) — Final"), "q3-results-eur-final");
        assert_eq!(slugify("  my_table  "), "my-table");
    }

    #[test]
    fn slugify_falls_back_for_symbol_only_titles() {
        assert_eq!(slugify("***"), "table");
        assert_eq!(slugify("日本"), "table");
    }

    #[test]
    fn sha256_hex_matches_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
