//! Streaming UTF-8 decoder with lookahead and one-step backtracking.
//!
//! The decoder owns a growable buffer of bytes read from the source but not
//! yet discarded. Two indices describe it: the start of the buffer (the last
//! [`ignore`](StreamDecoder::ignore) point) and the cursor. Everything
//! between them is the text of the current lexical unit; everything after
//! the cursor is lookahead.
//!
//! ```text
//! buf: [ consumed unit ... | lookahead ... ]
//!        ^                  ^              ^
//!        0 (ignore point)   pos            buf.len()
//! ```
//!
//! # Memory
//!
//! Bytes are only released by [`ignore`](StreamDecoder::ignore). A caller
//! that never ignores keeps the whole stream in memory.
//!
//! # Malformed Input
//!
//! Invalid UTF-8 decodes to U+FFFD one byte at a time, so every decode step
//! advances by at least one byte and scanning terminates on any input.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, ErrorKind, Read};
use std::iter::FusedIterator;

use tracing::{debug, trace};

use crate::CharSet;

/// Width of the longest UTF-8 sequence. The decoder refills whenever fewer
/// bytes than this remain beyond the cursor, so no sequence is ever split.
const MAX_CHAR_WIDTH: usize = 4;

/// Default number of bytes requested from the source per read.
const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Decode the first code point of `bytes`.
///
/// Returns the code point and its width in bytes. Malformed or truncated
/// sequences yield `(U+FFFD, 1)`. `bytes` must not be empty.
fn decode_char(bytes: &[u8]) -> (char, usize) {
    let valid = match std::str::from_utf8(bytes) {
        Ok(s) => s,
        // The prefix up to `valid_up_to` always re-validates.
        Err(e) => std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    };
    match valid.chars().next() {
        Some(c) => (c, c.len_utf8()),
        None => (char::REPLACEMENT_CHARACTER, 1),
    }
}

/// Position of the first byte of `hay` that is one of `needles`.
fn find_any(needles: &[u8], hay: &[u8]) -> Option<usize> {
    match *needles {
        [a] => memchr::memchr(a, hay),
        [a, b] => memchr::memchr2(a, b, hay),
        [a, b, c] => memchr::memchr3(a, b, c, hay),
        _ => hay.iter().position(|b| needles.contains(b)),
    }
}

/// Cursor over the code points of a byte stream.
///
/// Created with [`StreamDecoder::new`] over any [`Read`]. Pass `&mut reader`
/// to keep ownership of the source with the caller.
///
/// The decoder is an [`Iterator`] of `char`: [`next`](Iterator::next)
/// decodes the code point at the cursor and advances past it. End of stream
/// is `None`; a literal U+0000 in the input is `Some('\0')`.
///
/// Only one step of backtracking is supported: [`backup`](Self::backup)
/// undoes the most recent decode, and only once.
pub struct StreamDecoder<R> {
    reader: R,
    /// Bytes read but not yet discarded by `ignore`.
    buf: Vec<u8>,
    /// Scratch space for a single read from `reader`.
    chunk: Box<[u8]>,
    /// Cursor: index into `buf`. Invariant: `pos <= buf.len()`.
    pos: usize,
    /// Width of the last decoded code point, 0 when cleared.
    width: usize,
    /// Total bytes dropped by `ignore` since construction.
    discarded: usize,
    /// The source signalled end of stream or failed.
    closed: bool,
    /// First read failure, kept for the caller to inspect.
    read_error: Option<io::Error>,
}

impl<R: Read> StreamDecoder<R> {
    /// Create a decoder that reads from `reader` in 4 KiB chunks.
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Create a decoder that requests `chunk_size` bytes per read.
    ///
    /// A chunk size of 0 is treated as 1.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            chunk: vec![0; chunk_size.max(1)].into_boxed_slice(),
            pos: 0,
            width: 0,
            discarded: 0,
            closed: false,
            read_error: None,
        }
    }

    /// Read one chunk from the source and append it to the buffer.
    ///
    /// End of stream and read failures both close the decoder. A failure is
    /// recorded in `read_error`; `Interrupted` is retried.
    fn fill(&mut self) {
        loop {
            match self.reader.read(&mut self.chunk) {
                Ok(0) => {
                    trace!(buffered = self.buf.len(), "source exhausted");
                    self.closed = true;
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&self.chunk[..n]);
                    trace!(read = n, buffered = self.buf.len(), "refilled buffer");
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, offset = self.discarded + self.buf.len(), "read failed, treating as end of stream");
                    self.read_error = Some(e);
                    self.closed = true;
                }
            }
            return;
        }
    }

    /// Read until at least `MAX_CHAR_WIDTH` bytes follow the cursor or the
    /// source is closed.
    fn ensure_lookahead(&mut self) {
        while !self.closed && self.buf.len() < self.pos + MAX_CHAR_WIDTH {
            self.fill();
        }
    }

    /// Move the cursor back over the last decoded code point.
    ///
    /// Clears the recorded width, so a second call without an intervening
    /// decode does nothing. Never moves before the last `ignore` point.
    pub fn backup(&mut self) {
        self.pos = self.pos.saturating_sub(self.width);
        self.width = 0;
    }

    /// Observe the next code point without consuming it.
    ///
    /// Decodes and backs up, so it may read from the source, and it clears
    /// the recorded width.
    pub fn peek(&mut self) -> Option<char> {
        let c = self.next();
        self.backup();
        c
    }

    /// Observe the code point `n` steps ahead (1-based) without consuming
    /// anything.
    ///
    /// Returns `None` for `n == 0` (without reading) or when the stream ends
    /// before position `n`. Cursor and recorded width are restored.
    pub fn peek_nth(&mut self, n: usize) -> Option<char> {
        if n == 0 {
            return None;
        }

        let (pos, width) = (self.pos, self.width);
        let mut c = None;
        for _ in 0..n {
            c = self.next();
            if c.is_none() {
                break;
            }
        }
        self.pos = pos;
        self.width = width;
        c
    }

    /// Consume the next code point if it is in `set`.
    ///
    /// Returns `false` and leaves the cursor where it was otherwise.
    pub fn accept<S: CharSet + ?Sized>(&mut self, set: &S) -> bool {
        match self.next() {
            Some(c) if set.contains_char(c) => true,
            _ => {
                self.backup();
                false
            }
        }
    }

    /// Consume a maximal, possibly empty, run of code points in `set`.
    pub fn accept_run<S: CharSet + ?Sized>(&mut self, set: &S) {
        while let Some(c) = self.next() {
            if !set.contains_char(c) {
                self.backup();
                return;
            }
        }
    }

    /// Consume code points up to, not including, the first member of `stop`.
    ///
    /// Consumes to end of stream if no member appears.
    pub fn accept_run_until<S: CharSet + ?Sized>(&mut self, stop: &S) {
        if let Some(needles) = stop.ascii_needles() {
            self.skip_to_ascii(needles);
            return;
        }
        while let Some(c) = self.next() {
            if stop.contains_char(c) {
                self.backup();
                return;
            }
        }
    }

    /// Advance to the first of `needles` or end of stream using `memchr`.
    ///
    /// Same result as decoding one code point at a time: ASCII bytes never
    /// occur inside a multi-byte sequence, and malformed bytes are stepped
    /// over one at a time by the decoder anyway.
    fn skip_to_ascii(&mut self, needles: &[u8]) {
        debug_assert!(needles.is_ascii(), "needles must be ASCII");
        loop {
            if let Some(offset) = find_any(needles, &self.buf[self.pos..]) {
                self.pos += offset;
                break;
            }
            self.pos = self.buf.len();
            if self.closed {
                break;
            }
            self.fill();
        }
        self.width = 0;
    }

    /// Discard everything before the cursor and start a new lexical unit.
    pub fn ignore(&mut self) {
        self.buf.drain(..self.pos);
        self.discarded += self.pos;
        self.pos = 0;
        self.width = 0;
    }

    /// The code point at the cursor, without moving it.
    ///
    /// This is the most recently decoded code point when one was decoded
    /// since the last `backup`/`ignore`/`peek`, and the upcoming one
    /// otherwise.
    pub fn current(&mut self) -> Option<char> {
        if self.width == 0 {
            return self.peek();
        }
        self.backup();
        self.next()
    }

    /// Text consumed since the last [`ignore`](Self::ignore).
    pub fn current_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf[..self.pos])
    }

    /// Absolute byte offset of the cursor from the start of the stream.
    pub fn consumed(&self) -> usize {
        self.discarded + self.pos
    }

    /// Number of bytes currently held in the buffer.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// The read failure that closed the source, if any.
    pub fn read_error(&self) -> Option<&io::Error> {
        self.read_error.as_ref()
    }

    /// Take the read failure that closed the source, if any.
    pub fn take_read_error(&mut self) -> Option<io::Error> {
        self.read_error.take()
    }

    /// Give back the underlying source.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for StreamDecoder<R> {
    type Item = char;

    /// Decode the code point at the cursor and advance past it.
    ///
    /// May block on the source when fewer than four bytes of lookahead are
    /// buffered. Returns `None` once the source is closed and the buffer is
    /// exhausted.
    fn next(&mut self) -> Option<char> {
        self.ensure_lookahead();
        if self.pos >= self.buf.len() {
            self.width = 0;
            return None;
        }

        let end = self.buf.len().min(self.pos + MAX_CHAR_WIDTH);
        let (c, width) = decode_char(&self.buf[self.pos..end]);
        self.pos += width;
        self.width = width;
        Some(c)
    }
}

impl<R: Read> FusedIterator for StreamDecoder<R> {}

impl<R> fmt::Debug for StreamDecoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("buffered", &self.buf.len())
            .field("pos", &self.pos)
            .field("width", &self.width)
            .field("discarded", &self.discarded)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
