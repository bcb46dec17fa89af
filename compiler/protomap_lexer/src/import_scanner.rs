//! Import path extraction for proto files.
//!
//! A single forward pass over a [`StreamDecoder`] that recognizes only two
//! constructs:
//!
//! - `import "path";` (any run of space, tab, or newline between the
//!   keyword and the quote)
//! - `//` line comments
//!
//! Every other line is skipped verbatim. Paths are returned exactly as
//! written between the quotes, in source order.
//!
//! # States
//!
//! ```text
//! SkipSpace ──end──> Done
//!     │
//!     v
//! CheckComment ──"//"──> SkipLine ──> SkipSpace
//!     │                     ^
//!     v                     │ mismatch
//! MatchKeyword ─────────────┘
//!     │ "import"
//!     v
//! OpenQuote ──no '"'──> error
//!     │
//!     v
//! ReadPath ──> SkipSpace
//! ```

use std::io::Read;

use tracing::{debug, trace};

use crate::{ScanError, StreamDecoder};

/// The only keyword the scanner recognizes.
const KEYWORD: &str = "import";

/// Whitespace between statements and between `import` and its path.
const WHITESPACE: &str = " \t\n";

/// Scanner state. Each state consumes some input and names its successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// Skip whitespace between statements; end of input finishes the scan.
    SkipSpace,
    /// Divert `//` comments to `SkipLine`.
    CheckComment,
    /// Match `import` one code point at a time.
    MatchKeyword,
    /// Skip through the end of the current line.
    SkipLine,
    /// Skip whitespace after `import` and require an opening quote.
    OpenQuote,
    /// Capture everything up to the closing quote.
    ReadPath,
    /// Input exhausted.
    Done,
}

/// Extracts import paths from one proto source.
///
/// Drive it to completion with [`scan`](Self::scan), or one transition at a
/// time with [`step`](Self::step).
#[derive(Debug)]
pub struct ImportScanner<R> {
    decoder: StreamDecoder<R>,
    state: ScanState,
    imports: Vec<String>,
}

impl<R: Read> ImportScanner<R> {
    /// Create a scanner positioned at the start of `decoder`'s input.
    pub fn new(decoder: StreamDecoder<R>) -> Self {
        Self {
            decoder,
            state: ScanState::SkipSpace,
            imports: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Paths collected so far.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Run to the end of input and return every import path in source order.
    ///
    /// A missing quote after `import` fails the whole scan. A source that
    /// fails mid-stream fails with [`ScanError::Read`] rather than returning
    /// a truncated list.
    pub fn scan(mut self) -> Result<Vec<String>, ScanError> {
        while self.state != ScanState::Done {
            self.step()?;
        }
        debug!(imports = self.imports.len(), "scan complete");
        Ok(self.imports)
    }

    /// Perform one transition and return the new state.
    ///
    /// Calling `step` in `Done` stays in `Done`. After an error the state is
    /// `Done` and the paths collected so far remain in
    /// [`imports`](Self::imports).
    pub fn step(&mut self) -> Result<ScanState, ScanError> {
        let next = match self.state {
            ScanState::SkipSpace => Ok(self.skip_space()),
            ScanState::CheckComment => Ok(self.check_comment()),
            ScanState::MatchKeyword => Ok(self.match_keyword()),
            ScanState::SkipLine => Ok(self.skip_line()),
            ScanState::OpenQuote => self.open_quote(),
            ScanState::ReadPath => Ok(self.read_path()),
            ScanState::Done => Ok(ScanState::Done),
        };

        let next = match next {
            Ok(ScanState::Done) => match self.decoder.take_read_error() {
                Some(e) => Err(ScanError::Read(e)),
                None => Ok(ScanState::Done),
            },
            Err(e) => Err(self.decoder.take_read_error().map_or(e, ScanError::Read)),
            ok => ok,
        };

        self.state = next.as_ref().map_or(ScanState::Done, |&state| state);
        next
    }

    /// Give back the decoder, positioned wherever the scan stopped.
    pub fn into_decoder(self) -> StreamDecoder<R> {
        self.decoder
    }

    fn skip_space(&mut self) -> ScanState {
        self.decoder.accept_run(WHITESPACE);
        self.decoder.ignore();
        if self.decoder.peek().is_none() {
            return ScanState::Done;
        }
        ScanState::CheckComment
    }

    fn check_comment(&mut self) -> ScanState {
        if self.decoder.peek() == Some('/') && self.decoder.peek_nth(2) == Some('/') {
            return ScanState::SkipLine;
        }
        ScanState::MatchKeyword
    }

    /// On a mismatch the decoder is left just past the offending code point;
    /// `SkipLine` discards the rest of the line from there.
    fn match_keyword(&mut self) -> ScanState {
        for expected in KEYWORD.chars() {
            if self.decoder.next() != Some(expected) {
                return ScanState::SkipLine;
            }
        }
        ScanState::OpenQuote
    }

    fn skip_line(&mut self) -> ScanState {
        self.decoder.accept_run_until("\n");
        self.decoder.next();
        self.decoder.ignore();
        ScanState::SkipSpace
    }

    fn open_quote(&mut self) -> Result<ScanState, ScanError> {
        self.decoder.accept_run(WHITESPACE);
        self.decoder.ignore();
        if !self.decoder.accept("\"") {
            return Err(ScanError::MissingOpenQuote {
                offset: self.decoder.consumed(),
                found: self.decoder.peek(),
            });
        }
        Ok(ScanState::ReadPath)
    }

    /// No escape handling: the path ends at the next `"` or end of input.
    fn read_path(&mut self) -> ScanState {
        self.decoder.ignore();
        self.decoder.accept_run_until("\"");
        let path = self.decoder.current_text().into_owned();
        trace!(%path, "import");
        self.imports.push(path);
        self.decoder.next();
        self.decoder.ignore();
        ScanState::SkipSpace
    }
}

/// Scan `reader` for import paths.
pub fn scan_imports<R: Read>(reader: R) -> Result<Vec<String>, ScanError> {
    ImportScanner::new(StreamDecoder::new(reader)).scan()
}

/// Scan an in-memory source for import paths.
pub fn scan_imports_str(source: &str) -> Result<Vec<String>, ScanError> {
    scan_imports(source.as_bytes())
}
