use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::info;

use super::source;
use crate::cli::ServeArgs;
use crate::dom::Dom;
use crate::extract::ExtractionContext;
use crate::message::handle_message;

pub fn run(args: ServeArgs) -> Result<()> {
    let loaded = source::load(&args.source)?;
    info!("serving requests on stdin");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let handled = serve_stream(
        &loaded.document,
        &loaded.context,
        stdin.lock(),
        stdout.lock(),
    )?;

    info!(handled, "request stream closed");
    Ok(())
}

/// One JSON request per line in, one JSON response per line out. Blank lines are skipped.
pub fn serve_stream<D, R, W>(
    dom: &D,
    context: &ExtractionContext,
    reader: R,
    mut writer: W,
) -> Result<usize>
where
    D: Dom,
    R: BufRead,
    W: Write,
{
    let mut handled = 0usize;

    for line in reader.lines() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_message(dom, context, &line);
        serde_json::to_writer(&mut writer, &response).context("failed to serialize response")?;
        writeln!(writer).context("failed to write response")?;
        writer.flush().context("failed to flush response")?;
        handled += 1;
    }

    Ok(handled)
}
