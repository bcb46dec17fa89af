//! Driver errors.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use protomap_lexer::ScanError;
use thiserror::Error;

/// Anything that stops or fails part of a run.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),

    /// Filesystem access failed.
    #[error("failed to read `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A proto file could not be scanned for imports.
    #[error("failed to scan imports of `{}`", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: ScanError,
    },

    /// The compiler binary is not on `PATH`.
    #[error("`{name}` not found on PATH")]
    ProtocNotFound { name: String },

    /// An external program could not be started.
    #[error("failed to run `{}`", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external program ran and exited unsuccessfully.
    #[error("`{}` failed for `{}` ({status}): {}", .program.display(), .source_file.display(), .stderr.trim_end())]
    ToolFailed {
        program: PathBuf,
        source_file: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

impl DriverError {
    /// Whether this is a failed external run that should not abort the
    /// remaining sources.
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, Self::ToolFailed { .. } | Self::Spawn { .. })
    }
}
