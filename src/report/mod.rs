//! Report formatting for the prediction pipelines.
//!
//! Pipeline results are flattened into ordered rows with named fields, then rendered
//! as JSON, as HTML tables for the dashboard, or as aligned text for the terminal.

pub mod tables;

pub use tables::{
    compose_district_rows, CrimeReport, DistrictRow, DistrictTable, ErrorTableRow,
    PredictionReport, ProbeTableRow, SafetyReport,
};

use serde::{Deserialize, Serialize};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Html,
    Text,
}

impl ReportFormat {
    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Html => "text/html; charset=utf-8",
            ReportFormat::Text => "text/plain; charset=utf-8",
        }
    }
}

/// A table with a title and optional summary line
pub trait TabularReport {
    fn title(&self) -> &str;

    fn summary(&self) -> Option<String> {
        None
    }

    fn headers(&self) -> Vec<&'static str>;

    fn cells(&self) -> Vec<Vec<String>>;

    /// Render as a `styled-table` HTML fragment
    fn to_html(&self) -> String {
        let mut html = String::new();
        if let Some(summary) = self.summary() {
            html.push_str(&format!("<h4>{}</h4>\n", escape_html(&summary)));
        }
        html.push_str("<table class=\"styled-table\">\n  <thead>\n    <tr style=\"text-align: center;\">\n");
        for header in self.headers() {
            html.push_str(&format!("      <th>{}</th>\n", escape_html(header)));
        }
        html.push_str("    </tr>\n  </thead>\n  <tbody>\n");
        for row in self.cells() {
            html.push_str("    <tr>\n");
            for cell in row {
                html.push_str(&format!("      <td>{}</td>\n", escape_html(&cell)));
            }
            html.push_str("    </tr>\n");
        }
        html.push_str("  </tbody>\n</table>\n");
        html
    }

    /// Render as column-aligned plain text
    fn to_text(&self) -> String {
        let headers = self.headers();
        let rows = self.cells();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut text = format!("{}\n", self.title());
        if let Some(summary) = self.summary() {
            text.push_str(&format!("{}\n", summary));
        }
        text.push_str(&format_line(headers.iter().copied(), &widths));
        text.push_str(&format!(
            "{}\n",
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  ")
        ));
        for row in &rows {
            text.push_str(&format_line(row.iter().map(String::as_str), &widths));
        }
        text
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", line.trim_end())
}

/// Escape text for inclusion in HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
