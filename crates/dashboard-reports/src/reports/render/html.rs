use std::fmt::Write as _;

use crate::reports::document::ReportDocument;
use crate::reports::locale::{format_date, format_timestamp};

use super::table::{detail_rows, header, metric_lines, CellStyle};
use super::RenderError;

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;color:#1f2933;margin:32px}\
h1{font-size:22px;margin-bottom:4px}\
.meta{color:#616e7c;font-size:13px;margin-top:0}\
table{border-collapse:collapse;width:100%;margin-bottom:24px;font-size:13px}\
th,td{border:1px solid #cbd2d9;padding:6px 8px;text-align:left}\
th{background:#f0f4f8}\
td.empty{color:#9aa5b1;text-align:center}";

pub(super) fn render(document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
    let mut html = String::new();
    let title = escape_html(&document.name);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(
        html,
        "<head><meta charset=\"utf-8\"><title>{title}</title><style>{STYLE}</style></head>"
    )?;
    writeln!(html, "<body>")?;
    writeln!(html, "<h1>{title}</h1>")?;
    writeln!(
        html,
        "<p class=\"meta\">Generated {} &middot; Period {} to {}</p>",
        format_timestamp(document.generated_at),
        format_date(document.range_start.date_naive()),
        format_date(document.range_end.date_naive()),
    )?;

    writeln!(html, "<h2>Metrics</h2>")?;
    writeln!(html, "<table class=\"metrics\">")?;
    writeln!(html, "<thead><tr><th>Name</th><th>Value</th></tr></thead>")?;
    writeln!(html, "<tbody>")?;
    for line in metric_lines(document, CellStyle::Locale)? {
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(line.name),
            escape_html(&line.value)
        )?;
    }
    writeln!(html, "</tbody></table>")?;

    let columns = header(document);
    writeln!(html, "<h2>Details</h2>")?;
    writeln!(html, "<table class=\"detail\">")?;
    html.push_str("<thead><tr>");
    for label in &columns {
        write!(html, "<th>{}</th>", escape_html(label))?;
    }
    writeln!(html, "</tr></thead>")?;
    writeln!(html, "<tbody>")?;
    let rows = detail_rows(document, CellStyle::Locale)?;
    if rows.is_empty() {
        writeln!(
            html,
            "<tr><td class=\"empty\" colspan=\"{}\">No records in this period</td></tr>",
            columns.len()
        )?;
    }
    for row in rows {
        html.push_str("<tr>");
        for value in row {
            write!(html, "<td>{}</td>", escape_html(&value))?;
        }
        writeln!(html, "</tr>")?;
    }
    writeln!(html, "</tbody></table>")?;

    if !document.source_breakdown.is_empty() {
        writeln!(html, "<h2>Lead Sources</h2>")?;
        writeln!(html, "<table class=\"sources\">")?;
        writeln!(html, "<thead><tr><th>Source</th><th>Leads</th></tr></thead>")?;
        writeln!(html, "<tbody>")?;
        for entry in &document.source_breakdown {
            writeln!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_html(&entry.source),
                entry.count
            )?;
        }
        writeln!(html, "</tbody></table>")?;
    }

    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;

    Ok(html.into_bytes())
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
