use std::io;

use thiserror::Error;

/// A malformed-input error raised by the tokenizer, carrying the 1-based line
/// on which the offending row starts.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} {} line {line}.", preposition(.kind))]
pub struct MalformedCsvError {
    pub(crate) kind: SyntaxError,
    pub(crate) line: usize,
}

impl MalformedCsvError {
    pub(crate) fn new(kind: SyntaxError, line: usize) -> Self {
        Self { kind, line }
    }

    /// The grammar violation that was detected.
    #[must_use]
    pub fn kind(&self) -> SyntaxError {
        self.kind
    }

    /// The 1-based line number of the malformed row.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }
}

fn preposition(kind: &SyntaxError) -> &'static str {
    match kind {
        SyntaxError::IllegalQuoting => "in",
        SyntaxError::UnclosedQuotedField => "on",
    }
}

/// The two grammar violations the tokenizer distinguishes.
///
/// Several finer-grained violations (whitespace before an opening quote, a
/// quote in the middle of an unquoted field, a second quoted segment glued to
/// the first) all collapse into [`SyntaxError::IllegalQuoting`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxError {
    /// A quote (or any stray character after a closing quote) appears where
    /// the grammar forbids it.
    #[error("Illegal quoting")]
    IllegalQuoting,
    /// End of input was reached inside a quoted field.
    #[error("Unclosed quoted field")]
    UnclosedQuotedField,
}

/// Errors raised while building [`ParseOptions`](crate::ParseOptions) from
/// string pairs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The option name is not one of `encoding`, `buffer_size`, `skip_blanks`
    /// or `skip_lines`.
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    /// The option value could not be interpreted.
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidValue {
        /// The option name.
        option: &'static str,
        /// The rejected value.
        value: String,
    },
    /// The `skip_lines` pattern does not compile.
    #[error("invalid skip_lines pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Every failure a parse can report.
#[derive(Error, Debug)]
pub enum Error {
    /// The input violates the CSV grammar. Parsing stops here.
    #[error(transparent)]
    Malformed(#[from] MalformedCsvError),
    /// The options could not be understood.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A stream source was configured with a buffer size that cannot be
    /// allocated.
    #[error("failed to allocate memory for a read buffer of {requested} bytes")]
    Resource {
        /// The requested buffer size.
        requested: isize,
    },
    /// Reading from the underlying stream failed.
    #[error("read error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the syntax error kind and line if this is a malformed-input
    /// error.
    #[must_use]
    pub fn as_malformed(&self) -> Option<&MalformedCsvError> {
        match self {
            Error::Malformed(err) => Some(err),
            _ => None,
        }
    }
}
