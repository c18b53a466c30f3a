use super::grid::parse_span;
use super::title::find_previous_heading;
use super::*;
use crate::dom::{ComputedStyle, Document, DocumentBuilder, Rect, html, snapshot};

const MATCHING_HOST: &str = "reports.umusic.net";

fn no_policy() -> ExtractionContext {
    ExtractionContext::default()
}

fn builtin_policy_on(hostname: &str) -> ExtractionContext {
    ExtractionContext::new(hostname, Some(ExclusionPolicy::builtin()))
}

fn page(body: &str) -> Document {
    html::parse(&format!("<html><head></head><body>{body}</body></html>"))
}

fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
    values
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

const SPAN_TABLE: &str = r#"
    <table>
      <tr><th>A</th><th class="mat-column-select">B</th></tr>
      <tr><td colspan="2">X</td></tr>
    </table>
"#;

#[test]
fn spanned_cell_repeats_across_covered_columns() {
    let tables = extract_tables(&page(SPAN_TABLE), &no_policy());

    assert_eq!(tables.len(), 1);
    assert_eq!(
        tables[0],
        TableRecord {
            title: "Table 1".to_string(),
            rows: 2,
            cols: 2,
            data: rows(&[&["A", "B"], &["X", "X"]]),
        }
    );
}

#[test]
fn active_policy_drops_marked_column_from_every_row() {
    let tables = extract_tables(&page(SPAN_TABLE), &builtin_policy_on(MATCHING_HOST));

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].rows, 2);
    assert_eq!(tables[0].cols, 1);
    assert_eq!(tables[0].data, rows(&[&["A"], &["X"]]));
}

#[test]
fn policy_is_ignored_on_other_hosts() {
    for hostname in ["example.com", "umusic.net.example.com", ""] {
        let tables = extract_tables(&page(SPAN_TABLE), &builtin_policy_on(hostname));
        assert_eq!(tables[0].data, rows(&[&["A", "B"], &["X", "X"]]), "{hostname}");
    }

    let apex = extract_tables(&page(SPAN_TABLE), &builtin_policy_on("umusic.net"));
    assert_eq!(apex[0].cols, 1);
}

#[test]
fn marker_with_span_excludes_every_covered_column() {
    let document = page(
        r#"<table>
          <tr><td>a</td><td colspan="2" class="mat-column-select">sel</td><td>d</td></tr>
          <tr><td>1</td><td>2</td><td>3</td><td>4</td></tr>
          <tr><td colspan="4">wide</td></tr>
        </table>"#,
    );

    let tables = extract_tables(&document, &builtin_policy_on(MATCHING_HOST));
    assert_eq!(
        tables[0].data,
        rows(&[&["a", "d"], &["1", "4"], &["wide", "wide"]])
    );
}

#[test]
fn excluded_columns_are_collected_from_all_rows() {
    let document = page(
        r#"<table>
          <tr><td>a</td><td>b</td><td>c</td></tr>
          <tr><td colspan="2">ab</td><td class="mat-column-select">c</td></tr>
        </table>"#,
    );
    let table = document.find_all(document.root(), &["table"])[0];

    let policy = ExclusionPolicy::builtin();
    let excluded = grid::excluded_columns(&document, table, Some(&policy));
    assert_eq!(excluded.into_iter().collect::<Vec<usize>>(), vec![2]);
    assert!(grid::excluded_columns(&document, table, None).is_empty());
}

#[test]
fn footer_rows_are_dropped_only_under_active_policy() {
    let document = page(
        r#"<table>
          <thead><tr><th>Item</th><th>Qty</th></tr></thead>
          <tbody><tr><td>Pens</td><td>3</td></tr></tbody>
          <tfoot><tr><td>Total</td><td>3</td></tr></tfoot>
        </table>"#,
    );

    let with_policy = extract_tables(&document, &builtin_policy_on(MATCHING_HOST));
    assert_eq!(with_policy[0].data, rows(&[&["Item", "Qty"], &["Pens", "3"]]));

    let without_policy = extract_tables(&document, &no_policy());
    assert_eq!(without_policy[0].rows, 3);
    assert_eq!(without_policy[0].data[2], vec!["Total", "3"]);

    let keep_footer = ExtractionContext::new(
        MATCHING_HOST,
        Some(ExclusionPolicy {
            skip_footer_rows: false,
            ..ExclusionPolicy::builtin()
        }),
    );
    assert_eq!(extract_tables(&document, &keep_footer)[0].rows, 3);
}

#[test]
fn ragged_rows_are_padded_to_the_widest_row() {
    let document = page(
        r#"<table>
          <tr><td>1</td></tr>
          <tr><td>1</td><td>2</td><td colspan="2">3</td></tr>
          <tr><td>1</td><td>2</td></tr>
        </table>"#,
    );

    let table = &extract_tables(&document, &no_policy())[0];
    assert_eq!(table.cols, 4);
    assert!(table.data.iter().all(|row| row.len() == table.cols));
    assert_eq!(table.data[0], vec!["1", "", "", ""]);
    assert_eq!(table.data[1], vec!["1", "2", "3", "3"]);
    assert_eq!(table.data[2], vec!["1", "2", "", ""]);
}

#[test]
fn normalize_rows_is_a_no_op_on_empty_and_square_input() {
    let mut empty: Vec<Vec<String>> = Vec::new();
    normalize_rows(&mut empty);
    assert!(empty.is_empty());

    let mut square = rows(&[&["a", "b"], &["c", "d"]]);
    normalize_rows(&mut square);
    assert_eq!(square, rows(&[&["a", "b"], &["c", "d"]]));
}

#[test]
fn span_parsing_defaults_to_one_for_bad_values() {
    assert_eq!(parse_span(None), 1);
    assert_eq!(parse_span(Some("")), 1);
    assert_eq!(parse_span(Some("0")), 1);
    assert_eq!(parse_span(Some("-2")), 1);
    assert_eq!(parse_span(Some("wide")), 1);
    assert_eq!(parse_span(Some("3")), 3);
    assert_eq!(parse_span(Some(" 2px")), 2);
    assert_eq!(parse_span(Some("+4")), 4);
    assert_eq!(parse_span(Some("5000")), 1000);
    assert_eq!(parse_span(Some("99999999999999999999999")), 1000);
}

#[test]
fn malformed_spans_occupy_a_single_column() {
    let document = page(
        r#"<table>
          <tr><td colspan="0">a</td><td colspan="-1">b</td><td colspan="x">c</td></tr>
        </table>"#,
    );

    let table = &extract_tables(&document, &no_policy())[0];
    assert_eq!(table.data, rows(&[&["a", "b", "c"]]));
}

#[test]
fn cell_text_is_trimmed_with_non_breaking_spaces_normalized() {
    let document = page(
        "<table><tr><td>&nbsp;12&nbsp;</td><td>a&nbsp;b</td><td>\n  multi\n  word  </td></tr></table>",
    );

    let table = &extract_tables(&document, &no_policy())[0];
    assert_eq!(table.data, rows(&[&["12", "a b", "multi word"]]));
}

#[test]
fn hidden_tables_are_never_emitted() {
    let document = page(
        r#"
        <table style="display:none"><tr><td>display</td></tr></table>
        <table style="visibility: hidden"><tr><td>visibility</td></tr></table>
        <table style="opacity: 0"><tr><td>opacity</td></tr></table>
        <table style="height:0"><tr><td>height</td></tr></table>
        <div hidden><table><tr><td>ancestor</td></tr></table></div>
        <table style="opacity: 0.5"><tr><td>shown</td></tr></table>
        "#,
    );

    let tables = extract_tables(&document, &no_policy());
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].data, rows(&[&["shown"]]));
    // the fallback title counts every discovered table, hidden ones included
    assert_eq!(tables[0].title, "Table 6");
}

#[test]
fn zero_opacity_in_any_notation_hides_table() {
    let document = page(
        r#"
        <table style="opacity:0.0"><tr><td>decimal</td></tr></table>
        <table style="opacity: 0%"><tr><td>percent</td></tr></table>
        <table style="opacity: -1"><tr><td>negative</td></tr></table>
        <table style="opacity: 50%"><tr><td>half</td></tr></table>
        "#,
    );

    let tables = extract_tables(&document, &no_policy());
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].data, rows(&[&["half"]]));
}

#[test]
fn deeply_nested_html_table_is_extracted() {
    let depth = 5000;
    let body = format!(
        "{}<table id=\"deep\"><tr><td>a</td><td>b</td></tr></table>{}",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    );

    let tables = extract_tables(&page(&body), &no_policy());
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].title, "deep");
    assert_eq!(tables[0].data, rows(&[&["a", "b"]]));
}

fn nested_snapshot(depth: usize) -> String {
    let mut raw = String::from(r#"{"root":{"tag":"html","children":[{"tag":"body","children":["#);
    raw.push_str(&r#"{"tag":"div","children":["#.repeat(depth));
    raw.push_str(
        r#"{"tag":"table","rect":{"width":10,"height":10},"children":[{"tag":"tr","children":[{"tag":"td","children":["deep"]}]}]}"#,
    );
    raw.push_str(&"]}".repeat(depth));
    raw.push_str("]}]}}");
    raw
}

#[test]
fn deeply_nested_snapshot_table_is_extracted() {
    let document = snapshot::parse(&nested_snapshot(120)).expect("deep snapshot parses");

    let tables = extract_tables(&document, &no_policy());
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].data, rows(&[&["deep"]]));
}

#[test]
fn snapshot_deeper_than_the_nesting_cap_is_an_error() {
    let err = snapshot::parse(&nested_snapshot(600)).expect_err("too deep to load");
    assert!(err.to_string().contains("levels deep"), "{err}");
}

#[test]
fn zero_height_layout_box_excludes_table() {
    let mut builder = DocumentBuilder::new("html");
    builder.open("body");
    for (id, height) in [("collapsed", 0.0), ("rendered", 24.0)] {
        builder
            .open("table")
            .attr("id", id)
            .style(ComputedStyle {
                display: "table".to_string(),
                ..ComputedStyle::default()
            })
            .rect(Rect::new(300.0, height))
            .open("tr")
            .leaf("td", id)
            .close()
            .close();
    }
    let document = builder.finish();

    let tables = extract_tables(&document, &no_policy());
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].title, "rendered");
}

#[test]
fn documents_without_tables_yield_an_empty_list() {
    let document = page("<p>No data here</p>");
    assert!(extract_tables(&document, &no_policy()).is_empty());
    assert_eq!(table_by_index(&document, &no_policy(), 0), None);
}

#[test]
fn empty_and_fully_excluded_tables_are_omitted() {
    let document = page(
        r#"
        <table><tr></tr><tr></tr></table>
        <table><tr><td class="mat-column-select">x</td></tr></table>
        <table><tr><td></td></tr></table>
        "#,
    );

    let tables = extract_tables(&document, &builtin_policy_on(MATCHING_HOST));
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].title, "Table 3");
    assert_eq!(tables[0].data, rows(&[&[""]]));
}

#[test]
fn nested_tables_are_discovered_separately() {
    let document = page(
        r#"<table id="outer"><tr><td>outer<table id="inner"><tr><td>inner</td></tr></table></td></tr></table>"#,
    );

    let tables = extract_tables(&document, &no_policy());
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].title, "outer");
    assert_eq!(tables[0].rows, 2);
    assert_eq!(tables[0].data[0], vec!["outer\ninner", "inner"]);
    assert_eq!(tables[1].title, "inner");
    assert_eq!(tables[1].data, rows(&[&["inner"]]));
}

#[test]
fn caption_wins_over_heading_and_aria_label() {
    let document = page(
        r#"<h2>Heading</h2>
        <table aria-label="Label" id="the-id"><caption> Caption </caption><tr><td>1</td></tr></table>"#,
    );

    assert_eq!(extract_tables(&document, &no_policy())[0].title, "Caption");
}

#[test]
fn nearest_preceding_heading_is_used() {
    let document = page(
        r#"<h1>Report</h1><h2>  Regional  sales </h2><p>Intro</p>
        <table aria-label="Label"><tr><td>1</td></tr></table>"#,
    );

    assert_eq!(extract_tables(&document, &no_policy())[0].title, "Regional sales");
}

#[test]
fn heading_before_parent_is_used_for_one_level_only() {
    let document = page(
        r#"
        <h3>One hop</h3>
        <div><table><tr><td>1</td></tr></table></div>
        <h3>Two hops</h3>
        <section><div><table><tr><td>2</td></tr></table></div></section>
        "#,
    );

    let tables = extract_tables(&document, &no_policy());
    assert_eq!(tables[0].title, "One hop");
    assert_eq!(tables[1].title, "Table 2");
}

#[test]
fn body_parent_does_not_escalate() {
    let mut builder = DocumentBuilder::new("html");
    builder
        .leaf("h1", "Outside body")
        .open("body")
        .open("table")
        .open("tr")
        .leaf("td", "1")
        .close()
        .close()
        .close();
    let document = builder.finish();

    let table = document.find_all(document.root(), &["table"])[0];
    assert_eq!(find_previous_heading(&document, table), None);
    assert_eq!(extract_tables(&document, &no_policy())[0].title, "Table 1");
}

#[test]
fn empty_heading_falls_through_to_aria_label() {
    let document = page(
        r#"<h2>Real</h2><h3> </h3>
        <table aria-label="  Label  "><tr><td>1</td></tr></table>"#,
    );

    assert_eq!(extract_tables(&document, &no_policy())[0].title, "Label");
}

#[test]
fn id_and_index_fallbacks() {
    let document = page(
        r#"
        <table id="my-table"><tr><td>1</td></tr></table>
        <table id="sales_by-region"><tr><td>2</td></tr></table>
        <table id="--"><tr><td>3</td></tr></table>
        <table><tr><td>4</td></tr></table>
        "#,
    );

    let titles = extract_tables(&document, &no_policy())
        .into_iter()
        .map(|table| table.title)
        .collect::<Vec<String>>();
    assert_eq!(titles, ["my table", "sales by region", "Table 3", "Table 4"]);
}

#[test]
fn table_by_index_selects_among_qualifying_tables() {
    let document = page(
        r#"
        <table style="display:none"><tr><td>hidden</td></tr></table>
        <table id="first"><tr><td>1</td></tr></table>
        <table id="second"><tr><td>2</td></tr></table>
        "#,
    );
    let context = no_policy();

    let second = table_by_index(&document, &context, 1).expect("index 1 exists");
    assert_eq!(second.title, "second");
    assert_eq!(table_by_index(&document, &context, 2), None);
    assert_eq!(table_by_index(&document, &context, -1), None);
}

#[test]
fn active_policy_requires_matching_host() {
    let context = builtin_policy_on("intranet.umusic.net");
    assert!(context.active_policy().is_some());

    let context = builtin_policy_on("example.com");
    assert!(context.active_policy().is_none());

    let context = ExtractionContext::new(MATCHING_HOST, None);
    assert!(context.active_policy().is_none());
}
