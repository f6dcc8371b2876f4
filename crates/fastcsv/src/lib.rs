//! A fast, buffered CSV tokenizer with a pull-style row reader.
//!
//! Input is either borrowed text or any [`std::io::Read`] stream. Bytes are
//! pulled in bounded chunks, optionally transcoded to UTF-8, and split into
//! rows by a quote-aware state machine. Rows come out one at a time through a
//! [`Reader`], which can also report the raw source line of the row it just
//! returned.
//!
//! ```rust
//! use fastcsv::{Input, ParseOptions, parse};
//!
//! let mut reader = parse(Input::text("x,\"y\"\n\"a \"\"b\"\"\",c\n"), ParseOptions::default())?;
//! assert_eq!(reader.next_row()?.unwrap(), ["x", "y"]);
//! assert_eq!(reader.next_row()?.unwrap(), ["a \"b\"", "c"]);
//! assert_eq!(reader.raw_line(), Some("\"a \"\"b\"\"\",c"));
//! assert!(reader.next_row()?.is_none());
//! # Ok::<(), fastcsv::Error>(())
//! ```
//!
//! Syntax errors carry the line on which the malformed row starts and end the
//! parse:
//!
//! ```rust
//! use fastcsv::{Input, ParseOptions, SyntaxError, parse};
//!
//! let err = parse(Input::text("ok\n\"open"), ParseOptions::default())?
//!     .find_map(Result::err)
//!     .unwrap();
//! let malformed = err.as_malformed().unwrap();
//! assert_eq!(malformed.kind(), SyntaxError::UnclosedQuotedField);
//! assert_eq!(malformed.line(), 2);
//! # Ok::<(), fastcsv::Error>(())
//! ```

mod encoding;
mod error;
mod options;
mod reader;
mod row;
mod scanner;
mod source;
mod tokenizer;

#[cfg(test)]
mod tests;

pub use encoding::{Encoding, EncodingContext};
pub use error::{ConfigError, Error, MalformedCsvError, SyntaxError};
pub use options::{DEFAULT_BUFFER_SIZE, ParseOptions};
pub use reader::{Reader, parse};
pub use row::{Field, Row};
pub use source::{Input, NoStream};
pub use tokenizer::ParserState;
