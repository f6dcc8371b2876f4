mod parse_bad;
mod property_buffering;

use std::io::{Cursor, Read};

use crate::{Error, Input, ParseOptions, Row, parse};

pub(crate) type Rows = Vec<Vec<String>>;

/// Collects every row of `input` as plain strings.
pub(crate) fn collect<R: Read>(input: Input<'_, R>, options: ParseOptions) -> Result<Rows, Error> {
    parse(input, options)?.map(|row| row.map(Row::into_strings)).collect()
}

pub(crate) fn rows(text: &str) -> Result<Rows, Error> {
    collect(Input::text(text), ParseOptions::default())
}

/// Parses `text` through a stream read `buffer_size` bytes at a time.
pub(crate) fn stream_rows(text: &str, buffer_size: isize) -> Result<Rows, Error> {
    collect(
        Input::stream(Cursor::new(text.as_bytes())),
        ParseOptions {
            buffer_size: Some(buffer_size),
            ..Default::default()
        },
    )
}

pub(crate) fn quickcheck_tests() -> u64 {
    if is_ci::cached() { 10_000 } else { 1_000 }
}
