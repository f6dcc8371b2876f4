#![no_main]
use std::io::Cursor;

use arbitrary::Arbitrary;
use fastcsv::{Input, ParseOptions, Row, parse};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Case<'a> {
    buffer_size: u8,
    skip_blanks: bool,
    encoding: Option<&'a str>,
    data: &'a [u8],
}

type Outcome = (Vec<Vec<String>>, Vec<String>, Option<String>);

/// Drains a reader, keeping rows, raw lines and the terminating error.
fn drain(mut reader: fastcsv::Reader<'_, impl std::io::Read>) -> Outcome {
    let mut rows = Vec::new();
    let mut lines = Vec::new();
    loop {
        match reader.next_row() {
            Ok(Some(row)) => {
                rows.push(Row::into_strings(row));
                lines.push(reader.raw_line().unwrap_or_default().to_owned());
            }
            Ok(None) => return (rows, lines, None),
            Err(err) => {
                // Errors are terminal.
                assert!(reader.next_row().unwrap().is_none());
                return (rows, lines, Some(err.to_string()));
            }
        }
    }
}

fuzz_target!(|case: Case<'_>| {
    let options = |buffer_size| ParseOptions {
        encoding: case.encoding.map(str::to_owned),
        buffer_size,
        skip_blanks: case.skip_blanks,
        ..Default::default()
    };

    let whole = drain(parse(Input::bytes(case.data), options(Some(-1))).unwrap());
    let chunked = drain(
        parse(
            Input::stream(Cursor::new(case.data)),
            options(Some(isize::from(case.buffer_size))),
        )
        .unwrap(),
    );
    assert_eq!(whole, chunked);

    if case.skip_blanks {
        assert!(whole.0.iter().all(|row| !row.is_empty()));
    }
});
