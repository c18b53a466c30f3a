use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use super::source;
use crate::cli::{ExportFormat, ShowArgs};
use crate::message::{Request, Response, handle_request};
use crate::render::render_table;

pub fn run(args: ShowArgs) -> Result<()> {
    let loaded = source::load(&args.source)?;
    let request = Request::table_by_index(args.index);
    let response = handle_request(&loaded.document, &loaded.context, &request);

    let mut output = io::BufWriter::new(io::stdout().lock());
    match (&response, args.format) {
        // JSON output mirrors the message boundary, null included.
        (_, ExportFormat::Json) => {
            serde_json::to_writer_pretty(&mut output, &response)
                .context("failed to serialize table json")?;
        }
        (Response::Table { table: Some(table) }, format) => {
            info!(title = %table.title, rows = table.rows, cols = table.cols, "table selected");
            output.write_all(render_table(table, format)?.as_bytes())?;
        }
        _ => {
            warn!(index = args.index, "no qualifying table at index");
            bail!("no qualifying table at index {}", args.index);
        }
    }

    writeln!(output)?;
    output.flush()?;
    Ok(())
}
