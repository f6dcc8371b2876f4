use std::{
    io::{self, Read, Seek, SeekFrom},
    iter::FusedIterator,
};

use regex::Regex;

use crate::{
    encoding::EncodingContext,
    error::Error,
    options::ParseOptions,
    row::Row,
    source::{Input, NoStream, SourceAdapter},
    tokenizer::{ParserState, Tokenizer},
};

/// Starts a parse of `input`.
///
/// Options and the input shape are validated here, before any row is
/// produced. Rows are then pulled lazily from the returned [`Reader`].
///
/// ```rust
/// use fastcsv::{Input, ParseOptions, parse};
///
/// let rows = parse(Input::text("foo\nbar\nbaz"), ParseOptions::default())?
///     .map(|row| row.map(fastcsv::Row::into_strings))
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(rows, [["foo"], ["bar"], ["baz"]]);
/// # Ok::<(), fastcsv::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`Error::Resource`] when a stream input is paired with a buffer
/// size that cannot be allocated.
pub fn parse<R: Read>(input: Input<'_, R>, options: ParseOptions) -> Result<Reader<'_, R>, Error> {
    Reader::new(input, options)
}

/// Pull-style row reader over an [`Input`].
///
/// Each call to [`next_row`](Reader::next_row) resumes the tokenizer exactly
/// where the previous call left it and suspends again right after one row is
/// complete. End of input and errors are terminal: every later pull yields
/// `Ok(None)` until the reader is repositioned.
///
/// # Repositioning
///
/// The tokenizer state is only valid for the read position it was built
/// against. [`seek`](Reader::seek), [`rewind`](Reader::rewind),
/// [`source_mut`](Reader::source_mut) and [`invalidate`](Reader::invalidate)
/// all discard it, and the next pull starts fresh from wherever the source
/// then stands.
///
/// # Concurrency
///
/// Pulls take `&mut self`. A reader shared between threads must be
/// serialized by the caller.
#[derive(Debug)]
pub struct Reader<'a, R = NoStream> {
    input: SourceAdapter<'a, R>,
    tokenizer: Option<Tokenizer>,
    skip_blanks: bool,
    skip_lines: Option<Regex>,
    raw_line: Option<String>,
    lineno: usize,
}

impl<'a, R: Read> Reader<'a, R> {
    /// Creates a reader. See [`parse`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] when a stream input is paired with a
    /// buffer size that cannot be allocated.
    pub fn new(input: Input<'a, R>, options: ParseOptions) -> Result<Self, Error> {
        let context = options
            .encoding
            .as_deref()
            .map_or_else(EncodingContext::passthrough, EncodingContext::parse);
        let input = SourceAdapter::new(input, options.buffer_size, options.chunk_size(), context)?;

        Ok(Self {
            input,
            tokenizer: None,
            skip_blanks: options.skip_blanks,
            skip_lines: options.skip_lines,
            raw_line: None,
            lineno: 0,
        })
    }

    /// Pulls the next row, or `None` at end of input.
    ///
    /// Rows dropped by `skip_blanks` or `skip_lines` are consumed silently.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`] for a grammar violation and [`Error::Io`] for a
    /// failing stream. Either ends the parse.
    pub fn next_row(&mut self) -> Result<Option<Row>, Error> {
        let tokenizer = self.tokenizer.get_or_insert_with(|| {
            log::debug!("starting tokenizer");
            Tokenizer::new()
        });

        while let Some((row, raw)) = tokenizer.next_row(&mut self.input)? {
            if row.is_blank() && self.skip_blanks {
                // Skipped blank lines still count; pattern-skipped lines do not.
                self.lineno += 1;
                continue;
            }
            if self.skip_lines.as_ref().is_some_and(|re| re.is_match(&raw)) {
                log::trace!("skipping line {}", row.line());
                continue;
            }
            self.lineno += 1;
            self.raw_line = Some(raw);
            return Ok(Some(row));
        }
        Ok(None)
    }

    /// Calls `f` with every remaining row and returns how many there were.
    ///
    /// # Errors
    ///
    /// Stops at the first error, as [`next_row`](Reader::next_row) does.
    pub fn for_each_row<F>(&mut self, mut f: F) -> Result<usize, Error>
    where
        F: FnMut(Row),
    {
        let mut count = 0;
        while let Some(row) = self.next_row()? {
            f(row);
            count += 1;
        }
        Ok(count)
    }
}

impl<'a, R> Reader<'a, R> {
    /// Raw text of the row most recently returned, without its separator.
    ///
    /// A quoted field spanning lines makes this span lines too.
    #[must_use]
    pub fn raw_line(&self) -> Option<&str> {
        self.raw_line.as_deref()
    }

    /// Number of rows read since the start (or the last
    /// [`rewind`](Reader::rewind)). Blank rows dropped by `skip_blanks` are
    /// counted; rows dropped by `skip_lines` are not.
    #[must_use]
    pub fn lineno(&self) -> usize {
        self.lineno
    }

    /// Where the tokenizer stands. A reader that has not pulled yet, or has
    /// just been invalidated, is at [`ParserState::RowStart`].
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.tokenizer
            .as_ref()
            .map_or(ParserState::RowStart, Tokenizer::state)
    }

    /// Discards the tokenizer state, its buffered bytes and the decoder's
    /// pending input. The next pull reads from the source's current position.
    pub fn invalidate(&mut self) {
        if self.tokenizer.take().is_some() {
            log::debug!("tokenizer invalidated");
        }
        self.input.reset();
        self.raw_line = None;
    }

    /// Mutable access to the source. Because the caller may reposition it,
    /// the reader is invalidated.
    pub fn source_mut(&mut self) -> &mut Input<'a, R> {
        self.invalidate();
        self.input.input_mut()
    }

    /// Gives back the source.
    pub fn into_inner(self) -> Input<'a, R> {
        self.input.into_input()
    }
}

impl<R: Seek> Reader<'_, R> {
    /// Moves the source's read position and invalidates the reader.
    ///
    /// # Errors
    ///
    /// Whatever the underlying seek reports.
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.invalidate();
        self.input.input_mut().seek(pos)
    }

    /// Seeks back to the start and resets [`lineno`](Reader::lineno).
    ///
    /// # Errors
    ///
    /// Whatever the underlying seek reports.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.seek(SeekFrom::Start(0))?;
        self.lineno = 0;
        Ok(())
    }
}

impl<R: Read> Iterator for Reader<'_, R> {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<R: Read> FusedIterator for Reader<'_, R> {}
