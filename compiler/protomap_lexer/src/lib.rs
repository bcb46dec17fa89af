//! Streaming tokenizer core for proto files.
//!
//! Two layers, leaves first:
//!
//! - [`StreamDecoder`]: decodes UTF-8 code points one at a time from any
//!   [`std::io::Read`], with arbitrary lookahead, one-step backtracking,
//!   and explicit prefix compaction ([`StreamDecoder::ignore`]).
//! - [`ImportScanner`]: a small state machine on top of the decoder that
//!   extracts the paths of `import "path";` statements, skipping `//`
//!   line comments and every other line verbatim.
//!
//! ```
//! use protomap_lexer::scan_imports_str;
//!
//! let imports = scan_imports_str("import \"a/b.proto\";\nimport \"c.proto\";\n")?;
//! assert_eq!(imports, ["a/b.proto", "c.proto"]);
//! # Ok::<(), protomap_lexer::ScanError>(())
//! ```

mod char_set;
mod decoder;
mod import_scanner;
mod scan_error;

pub use char_set::CharSet;
pub use decoder::StreamDecoder;
pub use import_scanner::{scan_imports, scan_imports_str, ImportScanner, ScanState};
pub use scan_error::ScanError;
