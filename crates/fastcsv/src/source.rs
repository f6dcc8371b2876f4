use std::io::{self, Cursor, Read, Seek, SeekFrom};

use crate::{
    encoding::{Decoder, EncodingContext},
    error::Error,
};

/// Stream type of an [`Input`] that can only hold text.
///
/// It has no values, so `Input<'_, NoStream>` is always
/// [`Input::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoStream {}

impl Read for NoStream {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        match *self {}
    }
}

impl Seek for NoStream {
    fn seek(&mut self, _: SeekFrom) -> io::Result<u64> {
        match *self {}
    }
}

/// What a parse reads from: borrowed in-memory text, or a readable stream.
#[derive(Debug)]
pub enum Input<'a, R = NoStream> {
    /// In-memory text. Its read position can be moved with
    /// [`Reader::seek`](crate::Reader::seek) like any stream.
    Text(Cursor<&'a [u8]>),
    /// A stream supporting bounded reads.
    Stream(R),
}

impl<'a> Input<'a> {
    /// Wraps in-memory text.
    #[must_use]
    pub fn text(text: &'a str) -> Self {
        Input::Text(Cursor::new(text.as_bytes()))
    }

    /// Wraps in-memory bytes, decoded according to the parse's encoding.
    #[must_use]
    pub fn bytes(bytes: &'a [u8]) -> Self {
        Input::Text(Cursor::new(bytes))
    }
}

impl<R: Read> Input<'_, R> {
    /// Wraps a readable stream.
    pub fn stream(stream: R) -> Self {
        Input::Stream(stream)
    }
}

impl<R> Input<'_, R> {
    /// Whether this input is a stream rather than in-memory text.
    pub fn is_stream(&self) -> bool {
        matches!(self, Input::Stream(_))
    }

    fn kind(&self) -> &'static str {
        if self.is_stream() { "stream" } else { "text" }
    }
}

impl<R: Seek> Input<'_, R> {
    pub(crate) fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Input::Text(cursor) => cursor.seek(pos),
            Input::Stream(stream) => stream.seek(pos),
        }
    }
}

/// Pull-based supplier of UTF-8 bytes over an [`Input`].
///
/// Each [`pull`](SourceAdapter::pull) performs one bounded read of at most
/// the configured chunk size and transcodes it.
#[derive(Debug)]
pub(crate) struct SourceAdapter<'a, R> {
    input: Input<'a, R>,
    /// `None` reads the whole remaining text in one shot.
    chunk: Option<usize>,
    context: EncodingContext,
    decoder: Decoder,
    scratch: Vec<u8>,
    exhausted: bool,
}

impl<'a, R: Read> SourceAdapter<'a, R> {
    /// Validates the configuration against the input shape.
    ///
    /// A stream needs a real allocation of `chunk` bytes, so a negative or
    /// unsatisfiable size fails here rather than on the first pull.
    pub(crate) fn new(
        input: Input<'a, R>,
        buffer_size: Option<isize>,
        chunk: Option<usize>,
        context: EncodingContext,
    ) -> Result<Self, Error> {
        let mut scratch = Vec::new();
        if input.is_stream() {
            let requested = buffer_size.unwrap_or(0);
            let Some(size) = chunk else {
                return Err(Error::Resource { requested });
            };
            scratch
                .try_reserve_exact(size)
                .map_err(|_| Error::Resource { requested })?;
            scratch.resize(size, 0);
        }
        log::debug!(
            "reading {} input, chunk {:?}, encoding {:?}",
            input.kind(),
            chunk,
            context
        );

        Ok(Self {
            decoder: context.decoder(),
            input,
            chunk,
            context,
            scratch,
            exhausted: false,
        })
    }

    /// Reads one chunk and appends its UTF-8 form to `out`.
    ///
    /// Returns the number of source bytes read. Zero means the source is
    /// exhausted; anything the decoder was still holding has been flushed.
    pub(crate) fn pull(&mut self, out: &mut Vec<u8>) -> io::Result<usize> {
        if self.exhausted {
            return Ok(0);
        }

        let read = match &mut self.input {
            Input::Text(cursor) => {
                let text = *cursor.get_ref();
                let start = usize::try_from(cursor.position())
                    .map_or(text.len(), |pos| pos.min(text.len()));
                let remaining = &text[start..];
                let n = self.chunk.map_or(remaining.len(), |c| c.min(remaining.len()));
                self.decoder.decode(&remaining[..n], out);
                cursor.set_position((start + n) as u64);
                n
            }
            Input::Stream(stream) => {
                let n = loop {
                    match stream.read(&mut self.scratch) {
                        Ok(n) => break n,
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                        Err(err) => return Err(err),
                    }
                };
                self.decoder.decode(&self.scratch[..n], out);
                n
            }
        };

        if read == 0 {
            self.decoder.finish(out);
            self.exhausted = true;
        }
        log::trace!("pulled {read} source bytes");
        Ok(read)
    }
}

impl<'a, R> SourceAdapter<'a, R> {
    /// Forgets decoder carry and end-of-input, as after repositioning.
    pub(crate) fn reset(&mut self) {
        self.decoder.reset(&self.context);
        self.exhausted = false;
    }

    pub(crate) fn input_mut(&mut self) -> &mut Input<'a, R> {
        &mut self.input
    }

    pub(crate) fn into_input(self) -> Input<'a, R> {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<R: Read>(adapter: &mut SourceAdapter<'_, R>) -> (Vec<u8>, usize) {
        let mut out = Vec::new();
        let mut pulls = 0;
        while adapter.pull(&mut out).unwrap() > 0 {
            pulls += 1;
        }
        (out, pulls)
    }

    #[test]
    fn text_reads_in_chunks() {
        let mut adapter =
            SourceAdapter::new(Input::text("abcdefg"), Some(3), Some(3), EncodingContext::default())
                .unwrap();
        assert_eq!(drain(&mut adapter), (b"abcdefg".to_vec(), 3));
    }

    #[test]
    fn text_without_chunk_reads_once() {
        let mut adapter =
            SourceAdapter::new(Input::text("abcdefg"), Some(-1), None, EncodingContext::default())
                .unwrap();
        assert_eq!(drain(&mut adapter), (b"abcdefg".to_vec(), 1));
    }

    #[test]
    fn stream_rejects_negative_size() {
        let err = SourceAdapter::new(
            Input::stream(Cursor::new(b"x".to_vec())),
            Some(-1),
            None,
            EncodingContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Resource { requested: -1 }));
    }

    #[test]
    fn stream_transcodes() {
        let mut adapter = SourceAdapter::new(
            Input::stream(Cursor::new(b"\xE9t\xE9".to_vec())),
            Some(2),
            Some(2),
            EncodingContext::parse("latin1"),
        )
        .unwrap();
        assert_eq!(drain(&mut adapter), ("été".as_bytes().to_vec(), 2));
    }

    #[test]
    fn reset_allows_reading_again_after_seek() {
        let mut adapter =
            SourceAdapter::new(Input::text("ab"), None, Some(16), EncodingContext::default())
                .unwrap();
        assert_eq!(drain(&mut adapter).0, b"ab");
        adapter.input_mut().seek(SeekFrom::Start(1)).unwrap();
        adapter.reset();
        assert_eq!(drain(&mut adapter).0, b"b");
    }
}
