use rstest::rstest;

use super::{rows, stream_rows};
use crate::{Error, Input, ParseOptions, SyntaxError, parse};

fn malformed(result: Result<super::Rows, Error>) -> (SyntaxError, usize, String) {
    let err = result.unwrap_err();
    let message = err.to_string();
    let malformed = err.as_malformed().copied().unwrap();
    (malformed.kind(), malformed.line(), message)
}

#[rstest]
#[case::spaces_before_quote("   \"x\"", SyntaxError::IllegalQuoting)]
#[case::spaces_after_quote("\"x\"   ", SyntaxError::IllegalQuoting)]
#[case::spaces_around_quote("   \"x\"   ", SyntaxError::IllegalQuoting)]
#[case::tab_before_quote("\t\"x\"", SyntaxError::IllegalQuoting)]
#[case::tab_after_quote("\"x\"\t", SyntaxError::IllegalQuoting)]
#[case::tabs_around_quote("\t\"x\"\t", SyntaxError::IllegalQuoting)]
#[case::text_after_closing_quote("\"x\"x", SyntaxError::IllegalQuoting)]
#[case::quoted_inside_unquoted("x\"x\"", SyntaxError::IllegalQuoting)]
#[case::quoted_between_text("x\"x\"x", SyntaxError::IllegalQuoting)]
#[case::glued_quoted_segments("\"x\"x\"x\"", SyntaxError::IllegalQuoting)]
#[case::unclosed("\"x", SyntaxError::UnclosedQuotedField)]
#[case::stray_quote("x\"x", SyntaxError::IllegalQuoting)]
#[case::stray_after_closing("\"x\"x\"", SyntaxError::IllegalQuoting)]
#[case::unclosed_in_later_field("a,\"b", SyntaxError::UnclosedQuotedField)]
fn rejects(
    #[case] csv: &str,
    #[case] kind: SyntaxError,
    #[values(None, Some(1), Some(3))] stream_buffer: Option<isize>,
) {
    let run = |text: &str| match stream_buffer {
        None => rows(text),
        Some(size) => stream_rows(text, size),
    };

    let (actual, line, message) = malformed(run(csv));
    assert_eq!(actual, kind);
    assert_eq!(line, 1);
    let expected = match kind {
        SyntaxError::IllegalQuoting => "Illegal quoting in line 1.",
        SyntaxError::UnclosedQuotedField => "Unclosed quoted field on line 1.",
    };
    assert_eq!(message, expected);

    let (actual, line, _) = malformed(run(&format!("\n{csv}\n")));
    assert_eq!(actual, kind);
    assert_eq!(line, 2);
}

#[test]
fn blank_lines_before_the_error_count() {
    let (kind, line, _) = malformed(rows("\r\n\n\rok\nx\"y\n"));
    assert_eq!(kind, SyntaxError::IllegalQuoting);
    assert_eq!(line, 5);
}

#[test]
fn error_reports_the_row_start_of_a_multiline_field() {
    let (kind, line, _) = malformed(rows("a\n\"b\nc\nd"));
    assert_eq!(kind, SyntaxError::UnclosedQuotedField);
    assert_eq!(line, 2);
}

#[test]
fn rows_before_the_error_are_delivered_and_the_parse_stops() {
    let mut reader = parse(Input::text("a\nb\"\nc\n"), ParseOptions::default()).unwrap();
    assert_eq!(reader.next().unwrap().unwrap(), ["a"]);
    assert!(matches!(reader.next(), Some(Err(Error::Malformed(_)))));
    assert!(reader.next().is_none());
    assert_eq!(reader.raw_line(), Some("a"));
}
