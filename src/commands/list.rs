use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use super::source;
use crate::cli::ListArgs;
use crate::extract::extract_tables;
use crate::message::Response;
use crate::model::TableRecord;

pub fn run(args: ListArgs) -> Result<()> {
    let loaded = source::load(&args.source)?;
    let tables = extract_tables(&loaded.document, &loaded.context);
    info!(count = tables.len(), "tables extracted");

    if args.json {
        write_json_response(Response::Tables { tables })
    } else {
        write_text_summary(&tables)
    }
}

fn write_json_response(response: Response) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, &response)
        .context("failed to serialize table list json")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_summary(tables: &[TableRecord]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Tables: {}", tables.len())?;
    for (index, table) in tables.iter().enumerate() {
        writeln!(
            output,
            "{}.\t{}\t{} rows x {} cols",
            index, table.title, table.rows, table.cols
        )?;
    }

    output.flush()?;
    Ok(())
}
