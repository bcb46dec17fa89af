//! Compile a tree of proto files with `protoc`.
//!
//! For every `.proto` file under a root directory (outside `vendor/`), the
//! driver scans its `import` statements with [`protomap_lexer`], turns each
//! imported path into a `M<import>=<prefix>/<dir>` module mapping, and runs
//! `protoc` with the Go generator. When `protoc-go-inject-tag` is on `PATH`
//! it is run over each generated file afterwards.
//!
//! # Architecture
//!
//! ```text
//! Config ──> discover_sources ──> scan_all (rayon, one decoder per file)
//!                                     │
//!                                     v
//!                     ProtocInvocation per source (mapping options)
//!                                     │
//!                                     v
//!                         execute: protoc, then tag injection
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod protoc;

pub use config::{parse_args, Config, Invocation};
pub use error::DriverError;
pub use pipeline::{execute, plan, Summary};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for diagnostic output on stderr.
///
/// Call this once at startup. Safe to call multiple times.
/// `RUST_LOG` takes precedence; otherwise the level is `warn`, or `debug`
/// with `verbose`, which also switches to an indented span tree.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let default_level = if verbose { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let registry = tracing_subscriber::registry().with(filter);

        if verbose {
            registry
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .init();
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}
