//! Errors reported by the import scanner.

use std::io;

use thiserror::Error;

/// Why a scan failed.
///
/// Malformed UTF-8 is never an error; it decodes to U+FFFD.
#[derive(Debug, Error)]
pub enum ScanError {
    /// An `import` keyword was not followed by an opening `"`.
    #[error("expected `\"` after `import` at byte {offset}, found {}", describe(.found))]
    MissingOpenQuote {
        /// Absolute byte offset where the quote was expected.
        offset: usize,
        /// What was there instead (`None` at end of input).
        found: Option<char>,
    },

    /// The source failed mid-stream; the imports seen so far are incomplete.
    #[error("failed to read source")]
    Read(#[source] io::Error),
}

#[allow(clippy::ref_option, reason = "called with a borrowed field from the error attribute")]
fn describe(found: &Option<char>) -> String {
    match *found {
        Some(c) => format!("{c:?}"),
        None => "end of input".to_owned(),
    }
}
