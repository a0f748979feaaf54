//! Plain-text tables for terminal output.

use std::fmt::Write as _;

const COLUMN_GAP: &str = "  ";

/// Renders left-aligned columns separated by two spaces with a dashed rule
/// under the header. Embedded line breaks and tabs are flattened to spaces.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| cell_width(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let mut output = String::new();
    push_line(&mut output, headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    push_line(&mut output, &rule, &widths);
    for row in rows {
        push_line(&mut output, row, &widths);
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str(COLUMN_GAP);
        }
        let flat = flatten(cell);
        let pad = width.saturating_sub(cell_width(&flat));
        let _ = write!(line, "{flat}{:pad$}", "");
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn flatten(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}
