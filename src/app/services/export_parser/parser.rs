//! Core export parser implementation
//!
//! This module provides the parser orchestration: newline normalization,
//! header extraction, line-by-line record assembly, sanitization and mapping
//! of the finished rows into a [`BatchResult`].

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::assembler::{RecordAssembler, RowShape};
use super::boundary::{BoundaryDetector, detector_from_config, is_blank};
use super::column_mapping::ColumnMapping;
use super::record_mapper::{RecordMapper, RowOutcome};
use super::sanitizer::FieldSanitizer;
use super::stats::{BatchResult, RepairedTable};
use crate::app::models::{Header, RawRow};
use crate::config::PipelineConfig;
use crate::{Error, Result};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parser for line-break corrupted PMS exports
///
/// Holds no per-export state: every call owns its own assembly buffer and
/// result accumulator, so one parser can serve concurrent callers.
#[derive(Debug)]
pub struct ExportParser {
    config: PipelineConfig,
    detector: Box<dyn BoundaryDetector>,
}

impl ExportParser {
    /// Create a parser using the boundary strategy named in the configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let detector = detector_from_config(&config.boundary, config.separator)?;
        Ok(Self { config, detector })
    }

    /// Create a parser with a caller-supplied boundary detector
    pub fn with_detector(config: PipelineConfig, detector: Box<dyn BoundaryDetector>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, detector })
    }

    /// Parse an in-memory export into validated records
    pub fn parse(&self, text: &str) -> Result<BatchResult> {
        let text = normalize_newlines(text);
        self.parse_lines(numbered_lines(&text))
    }

    /// Parse an export one line at a time from a reader
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<BatchResult> {
        self.parse_lines(PhysicalLines::new(reader))
    }

    /// Read and parse an export file
    pub fn parse_file(&self, path: &Path) -> Result<BatchResult> {
        info!("Parsing export file: {}", path.display());
        let file = File::open(path).map_err(|e| Error::unreadable_input(path, e))?;
        self.parse_reader(BufReader::new(file))
    }

    /// Reassemble and sanitize rows without validating them
    pub fn repair(&self, text: &str) -> Result<RepairedTable> {
        let text = normalize_newlines(text);
        self.repair_lines(numbered_lines(&text))
    }

    /// Read and repair an export file
    pub fn repair_file(&self, path: &Path) -> Result<RepairedTable> {
        info!("Repairing export file: {}", path.display());
        let file = File::open(path).map_err(|e| Error::unreadable_input(path, e))?;
        self.repair_lines(PhysicalLines::new(BufReader::new(file)))
    }

    fn parse_lines<I, S>(&self, mut lines: I) -> Result<BatchResult>
    where
        I: Iterator<Item = Result<(usize, S)>>,
        S: AsRef<str>,
    {
        let header = Arc::new(read_header(&mut lines, self.config.separator)?);
        let mapping = ColumnMapping::resolve(header, &self.config).inspect_err(|e| {
            warn!("Rejecting export: {}", e);
        })?;

        let (width, date_fields) = mapping.stats();
        debug!("Column mapping: {} columns, {} date fields", width, date_fields);

        let mapper = RecordMapper::new(&mapping);
        let mut batch = BatchResult::new();

        self.assemble(
            lines,
            mapping.row_shape(self.config.separator),
            FieldSanitizer::new(mapping.free_text_index),
            |row| match mapper.map_row(row) {
                RowOutcome::Mapped(record) => batch.push_record(record),
                RowOutcome::Skipped(reason) => batch.push_skip(reason),
            },
        )?;

        info!(
            "Mapped {} records from {} rows ({} skipped)",
            batch.processed,
            batch.total_rows(),
            batch.skipped
        );
        Ok(batch)
    }

    fn repair_lines<I, S>(&self, mut lines: I) -> Result<RepairedTable>
    where
        I: Iterator<Item = Result<(usize, S)>>,
        S: AsRef<str>,
    {
        let header = read_header(&mut lines, self.config.separator)?;
        let (target, free_text_index) = ColumnMapping::layout(&header, &self.config);
        let shape = RowShape {
            separator: self.config.separator,
            width: header.width(),
            target,
        };

        let mut rows = Vec::new();
        self.assemble(lines, shape, FieldSanitizer::new(free_text_index), |row| {
            rows.push(row)
        })?;

        info!("Repaired {} rows of width {}", rows.len(), header.width());
        Ok(RepairedTable {
            header: Arc::new(header),
            rows,
        })
    }

    /// Drive the assembler over the remaining lines, handing over each
    /// finalized, sanitized row
    fn assemble<I, S>(
        &self,
        lines: I,
        shape: RowShape,
        sanitizer: FieldSanitizer,
        mut on_row: impl FnMut(RawRow),
    ) -> Result<()>
    where
        I: Iterator<Item = Result<(usize, S)>>,
        S: AsRef<str>,
    {
        let mut assembler = RecordAssembler::new(&*self.detector, shape);
        let mut finalize = |mut row: RawRow| {
            sanitizer.sanitize(&mut row);
            on_row(row);
        };

        for line in lines {
            let (line_number, line) = line?;
            if let Some(row) = assembler.push_line(line_number, line.as_ref()) {
                finalize(row);
            }
        }
        if let Some(row) = assembler.finish() {
            finalize(row);
        }

        Ok(())
    }
}

/// Convert `\r\n` and lone `\r` line endings to `\n`
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn numbered_lines(text: &str) -> impl Iterator<Item = Result<(usize, &str)>> {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| Ok((index + 1, line)))
}

/// Consume lines up to and including the first non-blank one
///
/// An export with no content yields an empty header.
fn read_header<I, S>(lines: &mut I, separator: char) -> Result<Header>
where
    I: Iterator<Item = Result<(usize, S)>>,
    S: AsRef<str>,
{
    for line in lines {
        let (line_number, line) = line?;
        let line = line.as_ref().trim_start_matches(BYTE_ORDER_MARK);
        if !is_blank(line) {
            let header = Header::parse(line, separator);
            debug!("Header on line {}: {} columns", line_number, header.width());
            return Ok(header);
        }
    }

    warn!("Export contains no header line");
    Ok(Header::default())
}

/// Numbered physical lines from a reader, split on `\n`, `\r\n` and `\r`
struct PhysicalLines<R> {
    reader: R,
    pending: VecDeque<String>,
    line_number: usize,
    buffer: String,
}

impl<R: BufRead> PhysicalLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            line_number: 0,
            buffer: String::new(),
        }
    }

    fn fill(&mut self) -> Result<bool> {
        self.buffer.clear();
        let read = self
            .reader
            .read_line(&mut self.buffer)
            .map_err(|e| {
                Error::io(
                    format!("Failed to read export line {}", self.line_number + 1),
                    e,
                )
            })?;
        if read == 0 {
            return Ok(false);
        }

        let line = self.buffer.strip_suffix('\n').unwrap_or(&self.buffer);
        let line = line.strip_suffix('\r').unwrap_or(line);
        self.pending.extend(line.split('\r').map(str::to_string));
        Ok(true)
    }
}

impl<R: BufRead> Iterator for PhysicalLines<R> {
    type Item = Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() {
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }

        self.pending.pop_front().map(|line| {
            self.line_number += 1;
            Ok((self.line_number, line))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert!(matches!(normalize_newlines("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_physical_lines_match_in_memory_splitting() {
        let text = "h1\th2\r\n\tv1\tline1\rmore\n\tv2\tx";
        let streamed: Vec<(usize, String)> = PhysicalLines::new(text.as_bytes())
            .collect::<Result<_>>()
            .unwrap();
        let normalized = normalize_newlines(text);
        let in_memory: Vec<(usize, String)> = numbered_lines(&normalized)
            .map(|line| line.map(|(n, l)| (n, l.to_string())))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(streamed, in_memory);
        assert_eq!(streamed.len(), 4);
        assert_eq!(streamed[2], (3, "more".to_string()));
    }

    #[test]
    fn test_header_skips_leading_blank_lines_and_bom() {
        let mut lines = numbered_lines("\n  \n\u{feff}A\tB\n\tx\ty");
        let header = read_header(&mut lines, '\t').unwrap();

        assert_eq!(header.names(), &["A", "B"]);
        assert_eq!(lines.next().unwrap().unwrap(), (4, "\tx\ty"));
    }
}
