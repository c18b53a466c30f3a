use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use super::source::{self, LoadedSource};
use crate::cli::{ExportArgs, ExportFormat};
use crate::extract::extract_tables;
use crate::model::{ExportedTable, ExtractionManifest, TableRecord};
use crate::render::render_table;
use crate::util::{now_utc_string, slugify, write_file, write_json_pretty};

pub fn run(args: ExportArgs) -> Result<()> {
    let loaded = source::load(&args.source)?;
    let manifest = export_tables(&args, &loaded)?;

    if args.dry_run {
        info!(
            table_count = manifest.table_count,
            output_dir = %args.output_dir.display(),
            "export dry-run complete"
        );
    } else {
        info!(table_count = manifest.table_count, "export completed");
    }

    Ok(())
}

/// Extract, render and write every table plus the manifest; a dry run writes nothing.
fn export_tables(args: &ExportArgs, loaded: &LoadedSource) -> Result<ExtractionManifest> {
    let tables = extract_tables(&loaded.document, &loaded.context);
    if tables.is_empty() {
        warn!(path = %args.source.input.display(), "no qualifying tables found");
    }

    let manifest = build_manifest(&tables, loaded, &args.source.input, args.format);
    if args.dry_run {
        return Ok(manifest);
    }

    for (table, entry) in tables.iter().zip(&manifest.tables) {
        let path = args.output_dir.join(&entry.file);
        write_file(&path, render_table(table, args.format)?.as_bytes())?;
        info!(path = %path.display(), title = %table.title, "wrote table");
    }

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| args.output_dir.join("manifest.json"));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote extraction manifest");

    Ok(manifest)
}

pub fn build_manifest(
    tables: &[TableRecord],
    loaded: &LoadedSource,
    source_path: &Path,
    format: ExportFormat,
) -> ExtractionManifest {
    let exported = tables
        .iter()
        .enumerate()
        .map(|(index, table)| ExportedTable {
            index,
            title: table.title.clone(),
            rows: table.rows,
            cols: table.cols,
            file: table_file_name(index, &table.title, format),
        })
        .collect::<Vec<ExportedTable>>();

    ExtractionManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_path: source_path.display().to_string(),
        source_sha256: loaded.sha256.clone(),
        url: loaded.url.clone(),
        hostname: loaded.context.hostname.clone(),
        policy_applied: loaded.context.active_policy().is_some(),
        format: format.as_str().to_string(),
        table_count: exported.len(),
        tables: exported,
    }
}

/// `NN-<slug>.<ext>`, numbered from 1.
fn table_file_name(index: usize, title: &str, format: ExportFormat) -> String {
    format!("{:02}-{}.{}", index + 1, slugify(title), format.extension())
}
