use anyhow::{Context, Result};

use crate::cli::ExportFormat;
use crate::model::TableRecord;

pub fn render_table(table: &TableRecord, format: ExportFormat) -> Result<String> {
    let rendered = match format {
        ExportFormat::Csv => table_to_csv(&table.data),
        ExportFormat::Tsv => table_to_tsv(&table.data),
        ExportFormat::Markdown => table_to_markdown(&table.data),
        ExportFormat::Json => serde_json::to_string_pretty(table)
            .with_context(|| format!("failed to serialize table: {}", table.title))?,
    };

    Ok(rendered)
}

pub fn table_to_csv(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| escape_csv_cell(cell))
                .collect::<Vec<String>>()
                .join(",")
        })
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn table_to_tsv(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.replace(['\t', '\r', '\n'], " "))
                .collect::<Vec<String>>()
                .join("\t")
        })
        .collect::<Vec<String>>()
        .join("\n")
}

/// The first row becomes the header row.
pub fn table_to_markdown(rows: &[Vec<String>]) -> String {
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let mut padded_rows = rows
        .iter()
        .map(|row| {
            let mut current = row
                .iter()
                .map(|cell| escape_markdown_cell(cell))
                .collect::<Vec<String>>();
            current.resize(col_count, String::new());
            current
        })
        .collect::<Vec<Vec<String>>>();

    if padded_rows.is_empty() {
        padded_rows.push(vec![String::new(); col_count]);
    }

    let header = padded_rows.first().cloned().unwrap_or_default();
    let mut lines = Vec::<String>::new();
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!(
        "| {} |",
        (0..col_count)
            .map(|_| "---")
            .collect::<Vec<&str>>()
            .join(" | ")
    ));

    for row in padded_rows.iter().skip(1) {
        lines.push(format!("| {} |", row.join(" | ")));
    }

    lines.join("\n")
}

fn escape_csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn escape_markdown_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\r', '\n'], "<br>")
}

#[cfg(test)]
mod tests {
    use super::{render_table, table_to_csv, table_to_markdown, table_to_tsv};
    use crate::cli::ExportFormat;
    use crate::model::TableRecord;

    fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn csv_quotes_only_cells_that_need_it() {
        let data = rows(&[
            &["Name", "Note"],
            &["Smith, J", "said \"hi\""],
            &["plain", "two\nlines"],
        ]);
        assert_eq!(
            table_to_csv(&data),
            "Name,Note\n\"Smith, J\",\"said \"\"hi\"\"\"\nplain,\"two\nlines\""
        );
    }

    #[test]
    fn csv_quotes_bare_carriage_returns() {
        let data = rows(&[&["old\rmac", "ok"]]);
        assert_eq!(table_to_csv(&data), "\"old\rmac\",ok");
    }

    #[test]
    fn tsv_flattens_embedded_separators() {
        let data = rows(&[&["a\tb", "c\nd"]]);
        assert_eq!(table_to_tsv(&data), "a b\tc d");
    }

    #[test]
    fn markdown_uses_first_row_as_header_and_escapes_pipes() {
        let data = rows(&[&["A", "B"], &["x|y", "line\nbreak"]]);
        assert_eq!(
            table_to_markdown(&data),
            "| A | B |\n| --- | --- |\n| x\\|y | line<br>break |"
        );
    }

    #[test]
    fn json_render_matches_record_shape() {
        let table = TableRecord::new("Totals".to_string(), rows(&[&["1", "2"]]));
        let rendered = render_table(&table, ExportFormat::Json).expect("json renders");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["title"], "Totals");
        assert_eq!(value["rows"], 1);
        assert_eq!(value["cols"], 2);
        assert_eq!(value["data"][0][1], "2");
    }
}
