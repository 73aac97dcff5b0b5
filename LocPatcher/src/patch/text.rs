//! Line-oriented text patch format
//!
//! Each line has the form `KEY -> OPERATION : VALUE`:
//!
//! ```text
//! UI/TITLE -> Replace : Blasphemous
//! UI/SUBTITLE -> AppendAtEnd : @(modded)
//! ```
//!
//! - The value separator is searched after the operation separator, so keys may
//!   contain colons.
//! - `@` in the value stands for a line break.
//! - Lines shorter than 5 characters are treated as blank.
//! - Terms with an empty value are skipped.

use crate::error::Error;

use super::term::{PatchTerm, TermOperation};

/// Separator between the key and the operation
pub const OPERATION_SEPARATOR: &str = "->";

/// Separator between the operation and the value
pub const VALUE_SEPARATOR: &str = ":";

/// Escape character for embedded line breaks in values
pub const NEWLINE_ESCAPE: char = '@';

/// Lines shorter than this (in characters) are noise
pub const MIN_LINE_LEN: usize = 5;

/// The three fields of a patch line, trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLine<'a> {
    pub key: &'a str,
    pub operation: &'a str,
    /// Value with `@` already expanded to `\n`
    pub value: String,
}

/// A line that could not be turned into a term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number
    pub line: usize,
    pub kind: LineErrorKind,
}

/// Why a line was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineErrorKind {
    /// No `->` on the line
    MissingOperationSeparator,
    /// No `:` after the `->`
    MissingValueSeparator,
    /// The operation alias is unknown
    UnsupportedOperation(String),
}

impl LineErrorKind {
    fn describe(&self) -> String {
        match self {
            Self::MissingOperationSeparator => {
                format!("missing operation separator `{OPERATION_SEPARATOR}`")
            }
            Self::MissingValueSeparator => format!(
                "missing value separator `{VALUE_SEPARATOR}` after `{OPERATION_SEPARATOR}`"
            ),
            Self::UnsupportedOperation(op) => format!("unsupported term operation `{op}`"),
        }
    }
}

impl From<LineError> for Error {
    fn from(err: LineError) -> Self {
        Error::Parse {
            line: err.line,
            reason: err.kind.describe(),
        }
    }
}

/// Statistics of loading a text patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of `\n`-separated lines in the input
    pub total_lines: usize,
    /// Terms accepted
    pub loaded: usize,
    /// Lines skipped for being shorter than [`MIN_LINE_LEN`]
    pub near_empty: usize,
    /// Terms skipped for having an empty value
    pub empty_values: usize,
    /// Malformed lines
    pub errors: Vec<LineError>,
}

impl LoadReport {
    /// Total number of lines that did not produce a term
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.near_empty + self.empty_values + self.errors.len()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Split one line into its key, operation and value.
///
/// # Errors
/// Returns the missing separator when the line is malformed.
pub fn split_line(line: &str) -> Result<PatchLine<'_>, LineErrorKind> {
    let op_begin = line
        .find(OPERATION_SEPARATOR)
        .ok_or(LineErrorKind::MissingOperationSeparator)?;
    let op_end = op_begin + OPERATION_SEPARATOR.len();

    let value_begin = line[op_end..]
        .find(VALUE_SEPARATOR)
        .map(|i| op_end + i)
        .ok_or(LineErrorKind::MissingValueSeparator)?;

    let value = line[value_begin + VALUE_SEPARATOR.len()..]
        .trim()
        .replace(NEWLINE_ESCAPE, "\n");

    Ok(PatchLine {
        key: line[..op_begin].trim(),
        operation: line[op_end..value_begin].trim(),
        value,
    })
}

/// Parse a whole text patch.
///
/// Never fails as a whole: malformed lines are collected into the report and
/// parsing continues with the next line.
pub fn parse_text(raw: &str) -> (Vec<PatchTerm>, LoadReport) {
    let mut terms = Vec::new();
    let mut report = LoadReport::default();

    for (idx, line) in raw.split('\n').enumerate() {
        report.total_lines += 1;

        if line.chars().count() < MIN_LINE_LEN {
            report.near_empty += 1;
            continue;
        }

        let parsed = match split_line(line) {
            Ok(parsed) => parsed,
            Err(kind) => {
                tracing::error!("Line {}: {}", idx + 1, kind.describe());
                report.errors.push(LineError { line: idx + 1, kind });
                continue;
            }
        };

        let Ok(operation) = TermOperation::parse(parsed.operation, false) else {
            tracing::error!(
                "Invalid term operation `{}` for term `{}`",
                parsed.operation,
                parsed.key
            );
            report.errors.push(LineError {
                line: idx + 1,
                kind: LineErrorKind::UnsupportedOperation(parsed.operation.to_string()),
            });
            continue;
        };

        match PatchTerm::new(parsed.key, parsed.value, operation) {
            Ok(term) => terms.push(term),
            Err(_) => {
                tracing::warn!(
                    "Skipping term {} with empty term content; replacing a string with empty content is not recommended",
                    parsed.key
                );
                report.empty_values += 1;
            }
        }
    }

    report.loaded = terms.len();
    (terms, report)
}

/// Render terms back into the text form.
///
/// Line breaks in content are escaped as `@`.
#[must_use]
pub fn to_text(terms: &[PatchTerm]) -> String {
    let mut out = String::new();
    for term in terms {
        out.push_str(term.key());
        out.push(' ');
        out.push_str(OPERATION_SEPARATOR);
        out.push(' ');
        out.push_str(term.operation().as_str());
        out.push(' ');
        out.push_str(VALUE_SEPARATOR);
        out.push(' ');
        out.push_str(&term.content().replace('\n', &NEWLINE_ESCAPE.to_string()));
        out.push('\n');
    }
    out
}
