//! Quoted delimited-text rendering for repaired exports
//!
//! Every field is wrapped in double quotes, embedded quotes are doubled and
//! rows are joined with CRLF, the layout spreadsheet tools import without
//! guessing column types.

use crate::app::models::{Header, MappedRecord};
use crate::app::services::export_parser::RepairedTable;
use crate::constants::CRLF;
use crate::{Error, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Render a repaired table: header first, then every row
pub fn render_table(table: &RepairedTable) -> Result<String> {
    render_rows(
        table.header.names(),
        table.rows.iter().map(|row| row.cells.as_slice()),
    )
}

/// Render validated records under their header
pub fn render_records(header: &Header, records: &[MappedRecord]) -> Result<String> {
    render_rows(header.names(), records.iter().map(MappedRecord::cells))
}

/// Render a header and rows as a fully quoted CSV document
pub fn render_rows<'a>(
    header: &[String],
    rows: impl IntoIterator<Item = &'a [String]>,
) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .terminator(Terminator::CRLF)
        .flexible(true)
        .from_writer(Vec::new());

    writer
        .write_record(header)
        .map_err(|e| Error::rendering("Failed to write header", e))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| Error::rendering("Failed to write row", e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::io("Failed to flush CSV output", e.into_error()))?;
    let mut document = String::from_utf8(bytes).map_err(|e| {
        Error::io(
            "Rendered CSV is not UTF-8",
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;

    // Rows are joined, not terminated
    if document.ends_with(CRLF) {
        document.truncate(document.len() - CRLF.len());
    }
    Ok(document)
}
