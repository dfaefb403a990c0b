use crate::reports::document::ReportDocument;

use super::table::{detail_rows, header, metric_lines, CellStyle};
use super::RenderError;

pub(super) fn render(document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
    let preamble = section([
        vec!["Report:".to_string(), document.name.clone()],
        vec![
            "Generated:".to_string(),
            document.generated_at.to_rfc3339(),
        ],
    ])?;

    let metrics = metric_lines(document, CellStyle::Raw)?;
    let metrics = section(
        [
            vec!["Metrics:".to_string()],
            vec!["Name".to_string(), "Value".to_string()],
        ]
        .into_iter()
        .chain(
            metrics
                .into_iter()
                .map(|line| vec![line.name.to_string(), line.value]),
        ),
    )?;

    let detail = section(
        std::iter::once(header(document).into_iter().map(String::from).collect::<Vec<_>>())
            .chain(detail_rows(document, CellStyle::Raw)?),
    )?;

    let mut output = preamble;
    output.push(b'\n');
    output.extend(metrics);
    output.push(b'\n');
    output.extend(detail);
    Ok(output)
}

/// One block of records; blocks are joined by blank lines.
fn section<I>(rows: I) -> Result<Vec<u8>, RenderError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = ::csv::WriterBuilder::new()
        .flexible(true)
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|err| RenderError::Buffer(err.to_string()))
}
