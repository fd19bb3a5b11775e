// ============================================================
// TABLE PREVIEW
// ============================================================
// Pure rendering of the first rows of a table

use serde::{Deserialize, Serialize};

use super::Table;

/// Rows shown when the caller does not pick a limit
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Rendered prefix of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePreview {
    pub headers: Vec<String>,

    /// Cells rendered as strings; nulls become ""
    pub rows: Vec<Vec<String>>,

    pub shown_rows: usize,
    pub total_rows: usize,

    /// "Showing N of M rows", present only when rows were cut off
    pub indicator: Option<String>,
}

impl TablePreview {
    /// Render the first `max_rows` rows of `table`
    pub fn build(table: &Table, max_rows: usize) -> Self {
        let total_rows = table.row_count();
        let rows: Vec<Vec<String>> = table
            .rows()
            .iter()
            .take(max_rows)
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        let shown_rows = rows.len();

        let indicator = if total_rows > max_rows {
            Some(format!("Showing {} of {} rows", max_rows, total_rows))
        } else {
            None
        };

        Self {
            headers: table.columns().to_vec(),
            rows,
            shown_rows,
            total_rows,
            indicator,
        }
    }

    /// Render as an HTML table followed by the indicator paragraph
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table class=\"data-table\"><thead><tr>");
        for header in &self.headers {
            html.push_str("<th>");
            html.push_str(&escape_html(header));
            html.push_str("</th>");
        }
        html.push_str("</tr></thead><tbody>");

        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str("<td>");
                html.push_str(&escape_html(cell));
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");

        if let Some(indicator) = &self.indicator {
            html.push_str("<p class=\"preview-indicator\">");
            html.push_str(indicator);
            html.push_str("</p>");
        }

        html
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
