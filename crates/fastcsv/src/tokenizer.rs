//! Field/row state machine.
//!
//! The tokenizer pulls bytes through a [`Scanner`] and assembles exactly one
//! row per call to [`Tokenizer::next_row`]. Between calls it keeps its scan
//! buffer, its [`ParserState`] and the line counter, so a call resumes
//! precisely where the previous one stopped.
//!
//! Character classes: `,` `"` CR LF, everything else, and end of input. Runs
//! of ordinary bytes are copied in bulk rather than byte by byte: unquoted
//! runs end at the next special byte, quoted runs at the next quote.
//!
//! The line counter advances once per row separator consumed. Separators
//! inside quoted fields are field content and do not count, so every error
//! reports the line on which the offending row starts.

use std::{io::Read, mem};

use bstr::ByteSlice;

use crate::{
    error::{Error, MalformedCsvError, SyntaxError},
    row::{Field, Row},
    scanner::{ScanState, Scanner},
    source::SourceAdapter,
};

/// Position of the tokenizer within the row grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    /// Nothing of the current row has been seen yet.
    RowStart,
    /// A comma was just consumed; the next field begins here.
    FieldStart,
    /// Inside a field that did not start with a quote.
    InUnquotedField,
    /// Inside a quoted field, where separators are content.
    InQuotedField,
    /// A quote was seen inside a quoted field; it either closes the field or
    /// starts a doubled-quote escape.
    AfterClosingQuote,
    /// A row was just emitted; the next pull starts a new one.
    RowComplete,
    /// The source is exhausted. Further pulls yield nothing.
    EndOfInput,
    /// A syntax or read error ended the parse. Further pulls yield nothing.
    Errored,
}

/// Bytes that end an unquoted run.
static SPECIAL: [bool; 256] = {
    let mut table = [false; 256];
    table[b',' as usize] = true;
    table[b'"' as usize] = true;
    table[b'\r' as usize] = true;
    table[b'\n' as usize] = true;
    table
};

fn find_special(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| SPECIAL[b as usize])
}

fn into_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| err.into_bytes().to_str_lossy().into_owned())
}

/// Resumable tokenizer state: scan buffer plus the row under construction.
#[derive(Debug)]
pub(crate) struct Tokenizer {
    scan: ScanState,
    rows: RowBuilder,
}

impl Tokenizer {
    pub(crate) fn new() -> Self {
        Self {
            scan: ScanState::new(),
            rows: RowBuilder::new(),
        }
    }

    pub(crate) fn state(&self) -> ParserState {
        self.rows.state
    }

    /// Scans the next row and returns it with its raw line (row separator
    /// excluded). `None` means end of input, now and on every later call.
    pub(crate) fn next_row<R: Read>(
        &mut self,
        input: &mut SourceAdapter<'_, R>,
    ) -> Result<Option<(Row, String)>, Error> {
        let mut scanner = Scanner::new(&mut self.scan, input);
        self.rows.run(&mut scanner)
    }
}

#[derive(Debug)]
struct RowBuilder {
    state: ParserState,
    line: usize,
    fields: Vec<Field>,
    field: Vec<u8>,
    quoted: bool,
}

impl RowBuilder {
    fn new() -> Self {
        Self {
            state: ParserState::RowStart,
            line: 1,
            fields: Vec::new(),
            field: Vec::new(),
            quoted: false,
        }
    }

    fn run<R: Read>(&mut self, sc: &mut Scanner<'_, '_, R>) -> Result<Option<(Row, String)>, Error> {
        match self.state {
            ParserState::EndOfInput | ParserState::Errored => return Ok(None),
            ParserState::RowComplete => self.state = ParserState::RowStart,
            _ => {}
        }

        let result = self.scan_row(sc);
        if result.is_err() {
            self.state = ParserState::Errored;
            self.fields.clear();
            self.field.clear();
        }
        result
    }

    fn scan_row<R: Read>(&mut self, sc: &mut Scanner<'_, '_, R>) -> Result<Option<(Row, String)>, Error> {
        use ParserState::{
            AfterClosingQuote, EndOfInput, Errored, FieldStart, InQuotedField, InUnquotedField,
            RowComplete, RowStart,
        };

        sc.set_mark();
        let start_line = self.line;

        loop {
            match self.state {
                RowStart | FieldStart => match sc.peek()? {
                    Some(b'"') => {
                        sc.bump();
                        self.quoted = true;
                        self.state = InQuotedField;
                    }
                    Some(b',') => {
                        sc.bump();
                        self.close_field();
                        self.state = FieldStart;
                    }
                    Some(sep @ (b'\r' | b'\n')) => {
                        // A separator at RowStart is a blank line: zero fields.
                        if self.state == FieldStart {
                            self.close_field();
                        }
                        return self.end_row(sc, sep, start_line).map(Some);
                    }
                    None if self.state == RowStart => {
                        self.state = EndOfInput;
                        return Ok(None);
                    }
                    None => {
                        self.close_field();
                        return Ok(Some(self.end_input(sc, start_line)));
                    }
                    Some(_) => self.state = InUnquotedField,
                },
                InUnquotedField => {
                    sc.copy_until(&mut self.field, find_special)?;
                    match sc.peek()? {
                        Some(b',') => {
                            sc.bump();
                            self.close_field();
                            self.state = FieldStart;
                        }
                        Some(b'"') => return Err(self.syntax_error(SyntaxError::IllegalQuoting)),
                        Some(sep) => {
                            self.close_field();
                            return self.end_row(sc, sep, start_line).map(Some);
                        }
                        None => {
                            self.close_field();
                            return Ok(Some(self.end_input(sc, start_line)));
                        }
                    }
                }
                InQuotedField => {
                    sc.copy_until(&mut self.field, |bytes| memchr::memchr(b'"', bytes))?;
                    if sc.advance()?.is_none() {
                        return Err(self.syntax_error(SyntaxError::UnclosedQuotedField));
                    }
                    self.state = AfterClosingQuote;
                }
                AfterClosingQuote => match sc.peek()? {
                    Some(b'"') => {
                        sc.bump();
                        self.field.push(b'"');
                        self.state = InQuotedField;
                    }
                    Some(b',') => {
                        sc.bump();
                        self.close_field();
                        self.state = FieldStart;
                    }
                    Some(sep @ (b'\r' | b'\n')) => {
                        self.close_field();
                        return self.end_row(sc, sep, start_line).map(Some);
                    }
                    None => {
                        self.close_field();
                        return Ok(Some(self.end_input(sc, start_line)));
                    }
                    Some(_) => return Err(self.syntax_error(SyntaxError::IllegalQuoting)),
                },
                RowComplete | EndOfInput | Errored => return Ok(None),
            }
        }
    }

    fn close_field(&mut self) {
        let text = into_text(mem::take(&mut self.field));
        self.fields.push(Field::new(text, mem::take(&mut self.quoted)));
    }

    fn take_row(&mut self, line: usize) -> Row {
        Row::new(mem::take(&mut self.fields), line)
    }

    /// Consumes the separator at the cursor (CR LF counts once) and emits the
    /// row.
    fn end_row<R: Read>(
        &mut self,
        sc: &mut Scanner<'_, '_, R>,
        sep: u8,
        line: usize,
    ) -> Result<(Row, String), Error> {
        let raw = sc.marked().to_str_lossy().into_owned();
        sc.bump();
        if sep == b'\r' && sc.peek()? == Some(b'\n') {
            sc.bump();
        }
        self.line += 1;
        self.state = ParserState::RowComplete;
        Ok((self.take_row(line), raw))
    }

    fn end_input<R: Read>(&mut self, sc: &mut Scanner<'_, '_, R>, line: usize) -> (Row, String) {
        let raw = sc.marked().to_str_lossy().into_owned();
        self.state = ParserState::EndOfInput;
        (self.take_row(line), raw)
    }

    fn syntax_error(&self, kind: SyntaxError) -> Error {
        let err = MalformedCsvError::new(kind, self.line);
        log::debug!("parse stopped: {err}");
        err.into()
    }
}
