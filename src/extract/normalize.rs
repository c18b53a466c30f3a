/// Pad every row with empty cells up to the widest row.
pub fn normalize_rows(rows: &mut [Vec<String>]) {
    let Some(max_cols) = rows.iter().map(Vec::len).max() else {
        return;
    };

    for row in rows.iter_mut() {
        row.resize(max_cols, String::new());
    }
}
