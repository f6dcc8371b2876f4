//! Scanner: bounded working buffer and byte lookahead over a source.
//!
//! What it does
//! - Owns a UTF-8 byte buffer with a cursor (`ScanState`), persisted between
//!   row pulls, and exposes `peek()`/`bump()`/`advance()`/`at_end()` through a
//!   short-lived `Scanner` view that pairs the state with its source.
//! - Refills on exhaustion by first discarding the consumed prefix, then
//!   appending one chunk from the `SourceAdapter`. Memory therefore tracks the
//!   chunk size plus the row in flight, never the total input.
//! - Keeps a `mark` at the start of the current row; compaction never drops
//!   bytes at or after it, so the raw text of a row is always a single slice.
//!
//! Invariants
//! - `mark <= cursor <= buf.len()`.
//! - Bytes before `cursor` are never handed out again, except as part of
//!   `marked()`.

use std::io::{self, Read};

use crate::source::SourceAdapter;

/// Buffer and positions persisted across pulls.
#[derive(Debug, Default)]
pub(crate) struct ScanState {
    buf: Vec<u8>,
    cursor: usize,
    mark: usize,
    eof: bool,
}

impl ScanState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn test_buffered(&self) -> usize {
        self.buf.len()
    }
}

/// A view over a [`ScanState`] and the source that refills it.
pub(crate) struct Scanner<'s, 'a, R> {
    state: &'s mut ScanState,
    input: &'s mut SourceAdapter<'a, R>,
}

impl<'s, 'a, R: Read> Scanner<'s, 'a, R> {
    pub(crate) fn new(state: &'s mut ScanState, input: &'s mut SourceAdapter<'a, R>) -> Self {
        Self { state, input }
    }

    /// Returns the next byte without consuming it, refilling if needed.
    #[inline]
    pub(crate) fn peek(&mut self) -> io::Result<Option<u8>> {
        if let Some(&byte) = self.state.buf.get(self.state.cursor) {
            return Ok(Some(byte));
        }
        if self.refill()? {
            Ok(self.state.buf.get(self.state.cursor).copied())
        } else {
            Ok(None)
        }
    }

    /// Consumes the byte just returned by [`peek`](Self::peek).
    #[inline]
    pub(crate) fn bump(&mut self) {
        debug_assert!(self.state.cursor < self.state.buf.len());
        self.state.cursor += 1;
    }

    /// Consumes and returns the next byte.
    pub(crate) fn advance(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.bump();
        }
        Ok(byte)
    }

    /// Whether both the buffer and the source are exhausted.
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn at_end(&mut self) -> io::Result<bool> {
        Ok(self.peek()?.is_none())
    }

    /// Copies bytes into `dst` up to (not including) the first position
    /// `find` reports, refilling as often as needed. Stops at end of input
    /// when `find` never matches.
    pub(crate) fn copy_until<F>(&mut self, dst: &mut Vec<u8>, find: F) -> io::Result<()>
    where
        F: Fn(&[u8]) -> Option<usize>,
    {
        loop {
            let start = self.state.cursor;
            let found = find(&self.state.buf[start..]);
            let end = found.map_or(self.state.buf.len(), |i| start + i);
            dst.extend_from_slice(&self.state.buf[start..end]);
            self.state.cursor = end;

            if found.is_some() || !self.refill()? {
                return Ok(());
            }
        }
    }

    /// Starts a new row at the cursor.
    pub(crate) fn set_mark(&mut self) {
        self.state.mark = self.state.cursor;
    }

    /// Everything consumed since the last [`set_mark`](Self::set_mark).
    pub(crate) fn marked(&self) -> &[u8] {
        &self.state.buf[self.state.mark..self.state.cursor]
    }

    /// Compacts the buffer and appends the next decoded chunk. Returns `false`
    /// once the source has nothing left.
    fn refill(&mut self) -> io::Result<bool> {
        let state = &mut *self.state;
        if state.eof {
            return Ok(false);
        }

        if state.mark > 0 {
            log::trace!("compacting {} consumed bytes", state.mark);
            state.buf.drain(..state.mark);
            state.cursor -= state.mark;
            state.mark = 0;
        }

        loop {
            let before = state.buf.len();
            let read = self.input.pull(&mut state.buf)?;
            if state.buf.len() > before {
                return Ok(true);
            }
            if read == 0 {
                state.eof = true;
                return Ok(false);
            }
        }
    }
}
