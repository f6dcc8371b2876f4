use regex::Regex;

use crate::error::ConfigError;

/// Refill chunk size used when no buffer size (or zero) is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Configuration for a single parse.
///
/// Every parse gets its own copy; there is no process-wide default beyond
/// [`DEFAULT_BUFFER_SIZE`].
///
/// # Examples
///
/// ```rust
/// use fastcsv::ParseOptions;
///
/// let options = ParseOptions {
///     skip_blanks: true,
///     ..Default::default()
/// };
/// assert!(options.skip_lines.is_none());
/// ```
///
/// # Default
///
/// No encoding, default buffer size, nothing skipped.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Character encoding of the source, as `"ext"` or `"ext:int"`.
    ///
    /// Unrecognized names degrade to passthrough rather than failing. See
    /// [`EncodingContext`](crate::EncodingContext) for the accepted names.
    ///
    /// # Default
    ///
    /// `None` (passthrough)
    pub encoding: Option<String>,

    /// Nominal number of bytes requested from the source per refill.
    ///
    /// `None` and `0` select [`DEFAULT_BUFFER_SIZE`]. A negative size makes
    /// an in-memory source read everything in one shot, and makes a stream
    /// source fail at setup with [`Error::Resource`](crate::Error::Resource).
    ///
    /// # Default
    ///
    /// `None`
    pub buffer_size: Option<isize>,

    /// Whether the reader silently skips rows produced by empty lines.
    ///
    /// # Default
    ///
    /// `false`
    pub skip_blanks: bool,

    /// Rows whose raw line matches this pattern are silently skipped.
    ///
    /// # Default
    ///
    /// `None`
    pub skip_lines: Option<Regex>,
}

impl ParseOptions {
    /// Builds options from string key/value pairs.
    ///
    /// Recognized keys are `encoding`, `buffer_size`, `skip_blanks` and
    /// `skip_lines`. Anything else, or a value that does not parse, is a
    /// configuration error.
    ///
    /// A `skip_lines` value written as `/pattern/` is a regular expression;
    /// any other value is matched literally, anywhere in the raw line.
    ///
    /// ```rust
    /// use fastcsv::ParseOptions;
    ///
    /// let options = ParseOptions::from_pairs([("buffer_size", "64"), ("skip_blanks", "true")])?;
    /// assert_eq!(options.buffer_size, Some(64));
    /// assert!(options.skip_blanks);
    ///
    /// let comments = ParseOptions::from_pairs([("skip_lines", "/^#/")])?;
    /// assert!(comments.skip_lines.unwrap().is_match("# note"));
    ///
    /// assert!(ParseOptions::from_pairs([("col_sep", ";")]).is_err());
    /// # Ok::<(), fastcsv::ConfigError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unknown keys, malformed integers or
    /// booleans, and patterns that fail to compile.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "encoding" => {
                    options.encoding = (!value.is_empty()).then(|| value.to_owned());
                }
                "buffer_size" => {
                    options.buffer_size = if value.is_empty() || value == "nil" {
                        None
                    } else {
                        Some(value.parse().map_err(|_| invalid("buffer_size", value))?)
                    };
                }
                "skip_blanks" => {
                    options.skip_blanks = parse_bool(value).ok_or_else(|| invalid("skip_blanks", value))?;
                }
                "skip_lines" => {
                    options.skip_lines = if value.is_empty() {
                        None
                    } else {
                        Some(skip_pattern(value)?)
                    };
                }
                other => return Err(ConfigError::UnknownOption(other.to_owned())),
            }
        }
        Ok(options)
    }

    /// Resolves the configured size into a refill chunk size, or `None` when a
    /// source should be read in a single shot.
    pub(crate) fn chunk_size(&self) -> Option<usize> {
        match self.buffer_size {
            None | Some(0) => Some(DEFAULT_BUFFER_SIZE),
            Some(n) => usize::try_from(n).ok(),
        }
    }
}

fn invalid(option: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        option,
        value: value.to_owned(),
    }
}

fn skip_pattern(value: &str) -> Result<Regex, regex::Error> {
    match value.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
        Some(pattern) => Regex::new(pattern),
        None => Regex::new(&regex::escape(value)),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
