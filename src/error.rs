use std::fmt;

/// Failures that stop a pipeline run before any report is produced.
///
/// Per-value problems (an unparseable date, a non-numeric day count) never
/// end up here; they are absorbed as missing values by the loader.
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be opened or read.
    Io(String),
    /// A line could not be decoded as CSV (bad quoting, invalid UTF-8).
    Malformed { line: u64, message: String },
    /// A line carries more fields than the fixed schema.
    TooManyFields { line: u64, found: usize, expected: usize },
    /// The file parsed but contained no rows.
    Empty,
    /// No row reached the given column.
    MissingColumn(&'static str),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "could not read the file: {msg}"),
            Self::Malformed { line, message } => write!(f, "line {line}: {message}"),
            Self::TooManyFields { line, found, expected } => {
                write!(f, "line {line}: found {found} fields, expected at most {expected}")
            }
            Self::Empty => write!(f, "the dataset is empty after loading"),
            Self::MissingColumn(column) => write!(f, "column '{column}' not found in the CSV"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
