//! Record assembly from classified physical lines
//!
//! The assembler is an explicit two-state machine. While `Empty` it has no
//! record to extend, so continuation merging only exists on the `Buffering`
//! arm. Lines are consumed one at a time, which lets the same assembler serve
//! in-memory text and streamed readers alike.

use super::boundary::{BoundaryDetector, LineClass, LineClassifier};
use crate::app::models::RawRow;

/// Which cell of the buffered record receives continuation text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationTarget {
    /// The configured free-text column, by header position
    Column(usize),
    /// The last cell of the record as buffered so far
    LastColumn,
}

impl ContinuationTarget {
    /// Resolve to a cell index for a buffer of `len` cells (`len >= 1`)
    ///
    /// A configured column beyond the buffer means the line wrapped before
    /// reaching it; the last buffered cell is used instead.
    pub fn resolve(self, len: usize) -> usize {
        let last = len.saturating_sub(1);
        match self {
            Self::Column(index) if index < len => index,
            Self::Column(_) | Self::LastColumn => last,
        }
    }
}

/// Fixed-width parameters shared by every row of one export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowShape {
    pub separator: char,
    pub width: usize,
    pub target: ContinuationTarget,
}

/// The single in-progress row under construction
#[derive(Debug)]
struct AssemblyBuffer {
    line_number: usize,
    cells: Vec<String>,
}

impl AssemblyBuffer {
    fn start(line_number: usize, line: &str, separator: char) -> Self {
        Self {
            line_number,
            cells: line.split(separator).map(str::to_string).collect(),
        }
    }

    /// Fold a continuation line into the buffered record
    ///
    /// Text before the first separator joins the target cell; any further
    /// parts become new trailing cells.
    fn merge(&mut self, line: &str, shape: &RowShape) {
        let index = shape.target.resolve(self.cells.len());
        let mut parts = line.split(shape.separator);

        if let Some(head) = parts.next() {
            append_text(&mut self.cells[index], head);
        }
        self.cells.extend(parts.map(str::to_string));
    }

    fn finalize(self, shape: &RowShape) -> RawRow {
        RawRow::new(
            self.line_number,
            repair_width(self.cells, shape.width, shape.separator),
        )
    }
}

#[derive(Debug)]
enum AssemblerState {
    Empty,
    Buffering(AssemblyBuffer),
}

/// Builds fixed-width raw rows from a stream of physical lines
#[derive(Debug)]
pub struct RecordAssembler<'a> {
    classifier: LineClassifier<'a>,
    shape: RowShape,
    state: AssemblerState,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(detector: &'a dyn BoundaryDetector, shape: RowShape) -> Self {
        Self {
            classifier: LineClassifier::new(detector),
            shape,
            state: AssemblerState::Empty,
        }
    }

    /// Consume one physical line, returning a row if this line closed one
    pub fn push_line(&mut self, line_number: usize, line: &str) -> Option<RawRow> {
        let record_buffered = matches!(self.state, AssemblerState::Buffering(_));

        match self.classifier.classify(line, record_buffered) {
            LineClass::Blank => None,
            LineClass::StartsNewRecord => {
                let next = AssemblyBuffer::start(line_number, line, self.shape.separator);
                match std::mem::replace(&mut self.state, AssemblerState::Buffering(next)) {
                    AssemblerState::Buffering(previous) => Some(previous.finalize(&self.shape)),
                    AssemblerState::Empty => None,
                }
            }
            LineClass::ContinuesRecord => {
                if let AssemblerState::Buffering(buffer) = &mut self.state {
                    buffer.merge(line, &self.shape);
                }
                None
            }
        }
    }

    /// Flush the buffered record at end of input
    pub fn finish(&mut self) -> Option<RawRow> {
        match std::mem::replace(&mut self.state, AssemblerState::Empty) {
            AssemblerState::Buffering(buffer) => Some(buffer.finalize(&self.shape)),
            AssemblerState::Empty => None,
        }
    }

    /// Assemble every row from numbered lines
    pub fn assemble<'l>(mut self, lines: impl IntoIterator<Item = (usize, &'l str)>) -> Vec<RawRow> {
        let mut rows: Vec<RawRow> = lines
            .into_iter()
            .filter_map(|(line_number, line)| self.push_line(line_number, line))
            .collect();
        rows.extend(self.finish());
        rows
    }
}

/// Append trimmed text to a cell, separated by a single space
fn append_text(cell: &mut String, text: &str) {
    let merged = format!("{} {}", cell, text.trim());
    *cell = merged.trim().to_string();
}

/// Force a row to exactly `width` cells
///
/// Overflow is assumed to come from unescaped separators inside the last
/// expected field, so surplus cells are rejoined into it. Short rows are
/// right-padded with empty cells.
pub fn repair_width(mut cells: Vec<String>, width: usize, separator: char) -> Vec<String> {
    if width > 0 && cells.len() > width {
        let overflow = cells.split_off(width - 1);
        let separator = separator.to_string();
        cells.push(overflow.join(separator.as_str()));
    } else if cells.len() < width {
        cells.resize(width, String::new());
    }
    cells
}
