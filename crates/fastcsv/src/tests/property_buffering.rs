use quickcheck::QuickCheck;

use super::{arbitrary::CsvText, quickcheck_tests, rows, stream_rows};

/// Property: rows and errors do not depend on how the input is chunked.
/// Parsing the whole text in one shot and streaming it a few bytes at a time
/// must agree, including on the message and line of any error.
#[test]
fn chunking_invariance_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: CsvText, size: u8) -> bool {
        let size = isize::from(size % 16) + 1;
        let whole = rows(&input.0).map_err(|err| err.to_string());
        let streamed = stream_rows(&input.0, size).map_err(|err| err.to_string());
        whole == streamed
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(CsvText, u8) -> bool);
}

#[test]
fn negative_size_reads_text_in_one_shot() {
    let csv = "a,b\n\"c\nd\"\n";
    assert_eq!(
        super::collect(
            crate::Input::text(csv),
            crate::ParseOptions {
                buffer_size: Some(-1),
                ..Default::default()
            }
        )
        .unwrap(),
        rows(csv).unwrap()
    );
}
