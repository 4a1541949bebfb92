use crate::error::ParserError;
use crate::utils::get_line_and_column;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::Display;

const UNKNOWN_FILE: &str = "<unknown file>";

/// Where something was read from. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Location {
    pub fn new(file_name: impl Into<String>, line: usize, column: usize) -> Self {
        Location {
            file_name: file_name.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    pub fn of_file(file_name: impl Into<String>) -> Self {
        Location {
            file_name: file_name.into(),
            line: None,
            column: None,
        }
    }

    pub fn unknown() -> Self {
        Self::of_file(UNKNOWN_FILE)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file_name
            .cmp(&other.file_name)
            .then(self.line.cmp(&other.line))
            .then(self.column.cmp(&other.column))
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{}:{}", self.file_name, line, column),
            (Some(line), None) => write!(f, "{}:{}", self.file_name, line),
            _ => f.write_str(&self.file_name),
        }
    }
}

/// A failure turned into data. Problems accumulate along the assembly instead of
/// interrupting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Problem {
    location: Location,
    message: String,
}

impl Problem {
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(Location::unknown(), message)
    }

    pub fn at(location: Location, message: impl Into<String>) -> Self {
        Problem {
            location,
            message: message.into(),
        }
    }

    pub fn from_error(error: &impl Display) -> Self {
        Self::new(error.to_string())
    }

    pub fn from_error_at(location: Location, error: &impl Display) -> Self {
        Self::at(location, error.to_string())
    }

    /// Locates a reader failure from its span.
    pub fn from_parser_error(error: &ParserError) -> Self {
        let (src, offset) = error.source_and_offset();
        let (line, column) = get_line_and_column(src.inner(), offset);
        Self::at(Location::new(src.name(), line, column), error.to_string())
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialOrd for Problem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Problem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.location
            .cmp(&other.location)
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.location, self.message)
    }
}
