use std::fmt::Write as _;

/// Renders `rows` under `headers` as left-aligned, space-separated columns.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(clean(cell).chars().count());
        }
    }

    let mut output = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_line(&mut output, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(1))).collect();
    push_line(&mut output, &rule, &widths);
    for row in rows {
        push_line(&mut output, row, &widths);
    }
    output
}

/// Two-column `field | value` rendering of a single record.
pub fn render_fields(fields: &[(&str, String)]) -> String {
    let rows: Vec<Vec<String>> = fields
        .iter()
        .map(|(name, value)| vec![name.to_string(), value.clone()])
        .collect();
    render_table(&["field", "value"], &rows)
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (idx, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = clean(cell);
        let _ = write!(line, "{cell:<width$}");
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

// Embedded newlines and tabs would break the column grid.
fn clean(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}
