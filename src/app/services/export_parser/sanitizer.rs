//! Free-text column cleanup for finalized rows

use crate::app::models::RawRow;
use crate::constants::LINE_BREAK_CHARS;

/// Collapses stray line-break bytes in the free-text column
///
/// The assembler never embeds raw line breaks itself, but CR bytes can
/// survive newline normalization when a reader hands over partial lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSanitizer {
    column: usize,
}

impl FieldSanitizer {
    pub fn new(column: usize) -> Self {
        Self { column }
    }

    /// Replace every run of CR/LF characters in the free-text cell with one space
    pub fn sanitize(&self, row: &mut RawRow) {
        if let Some(cell) = row.cells.get_mut(self.column) {
            if cell.contains(LINE_BREAK_CHARS) {
                *cell = collapse_line_breaks(cell);
            }
        }
    }
}

pub fn collapse_line_breaks(value: &str) -> String {
    let mut collapsed = String::with_capacity(value.len());
    let mut in_break = false;

    for ch in value.chars() {
        if LINE_BREAK_CHARS.contains(&ch) {
            if !in_break {
                collapsed.push(' ');
            }
            in_break = true;
        } else {
            collapsed.push(ch);
            in_break = false;
        }
    }

    collapsed
}
