//! Record boundary detection and line classification
//!
//! Deciding where a logical record starts is a vendor quirk rather than a TSV
//! convention, so the rule lives behind the [`BoundaryDetector`] trait. The
//! [`LineClassifier`] wraps a detector with the rules that hold for every
//! export: blank lines are dropped and the first content line always opens a
//! record.

use crate::config::BoundaryConfig;
use crate::{Error, Result};
use regex::Regex;

/// Classification of a single physical line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// The line begins a new logical record
    StartsNewRecord,
    /// The line extends the free-text field of the buffered record
    ContinuesRecord,
    /// The line carries no content and is ignored
    Blank,
}

/// Strategy deciding whether a content line begins a new record
///
/// Only consulted while a record is already buffered.
pub trait BoundaryDetector: std::fmt::Debug + Send + Sync {
    fn is_boundary(&self, line: &str) -> bool;
}

/// The vendor export emits a synthetic empty first cell on genuine records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadingSeparator {
    pub separator: char,
}

impl LeadingSeparator {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl BoundaryDetector for LeadingSeparator {
    fn is_boundary(&self, line: &str) -> bool {
        line.starts_with(self.separator)
    }
}

/// Boundary lines are those matching a regular expression
#[derive(Debug, Clone)]
pub struct PatternBoundary {
    pattern: Regex,
}

impl PatternBoundary {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern =
            Regex::new(pattern).map_err(|e| Error::invalid_boundary_pattern(pattern, e))?;
        Ok(Self { pattern })
    }
}

impl BoundaryDetector for PatternBoundary {
    fn is_boundary(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Build the detector described by configuration
pub fn detector_from_config(
    config: &BoundaryConfig,
    separator: char,
) -> Result<Box<dyn BoundaryDetector>> {
    Ok(match config {
        BoundaryConfig::LeadingSeparator => Box::new(LeadingSeparator::new(separator)),
        BoundaryConfig::Pattern { pattern } => Box::new(PatternBoundary::new(pattern)?),
    })
}

/// A line with nothing but whitespace (spaces, tabs) in it
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Classifies physical lines using a boundary detector
#[derive(Debug)]
pub struct LineClassifier<'a> {
    detector: &'a dyn BoundaryDetector,
}

impl<'a> LineClassifier<'a> {
    pub fn new(detector: &'a dyn BoundaryDetector) -> Self {
        Self { detector }
    }

    /// Classify `line` given whether a record is currently buffered
    pub fn classify(&self, line: &str, record_buffered: bool) -> LineClass {
        if is_blank(line) {
            LineClass::Blank
        } else if !record_buffered || self.detector.is_boundary(line) {
            LineClass::StartsNewRecord
        } else {
            LineClass::ContinuesRecord
        }
    }
}
