//! Discover, scan, and compile.
//!
//! [`plan`] does all the reading: it finds the sources and scans each one
//! for imports (in parallel, one decoder per file, nothing shared). The
//! result is a list of [`ProtocInvocation`]s that [`execute`] runs in order.
//! A scan failure aborts planning; a failed `protoc` run is logged and
//! counted, and the remaining sources still compile.

use std::fs::File;
use std::path::{Path, PathBuf};

use protomap_lexer::scan_imports;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::discovery::discover_sources;
use crate::protoc::{find_executable, inject_tags, run_protoc, ProtocInvocation};
use crate::{Config, DriverError};

/// Imports found in one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedSource {
    /// Path relative to the root.
    pub path: PathBuf,
    /// Import paths in source order.
    pub imports: Vec<String>,
}

/// Outcome of [`execute`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Sources compiled successfully.
    pub compiled: usize,
    /// Sources whose `protoc` run failed.
    pub failed: usize,
    /// Generated files post-processed with the tag injector.
    pub tagged: usize,
}

/// Scan one source under `root` for its imports.
#[tracing::instrument(level = "debug", skip_all, fields(source = %relative.display()))]
pub fn scan_source(root: &Path, relative: &Path) -> Result<ScannedSource, DriverError> {
    let full = root.join(relative);
    let file = File::open(&full).map_err(|source| DriverError::Io {
        path: full.clone(),
        source,
    })?;
    let imports = scan_imports(file).map_err(|source| DriverError::Scan {
        path: full,
        source,
    })?;
    debug!(imports = imports.len(), "scanned");
    Ok(ScannedSource {
        path: relative.to_path_buf(),
        imports,
    })
}

/// Scan every source, preserving the input order.
pub fn scan_all(root: &Path, sources: &[PathBuf], parallel: bool) -> Result<Vec<ScannedSource>, DriverError> {
    if parallel {
        sources.par_iter().map(|source| scan_source(root, source)).collect()
    } else {
        sources.iter().map(|source| scan_source(root, source)).collect()
    }
}

/// Find and scan all sources and build their `protoc` invocations.
pub fn plan(config: &Config) -> Result<Vec<ProtocInvocation>, DriverError> {
    let sources = discover_sources(config)?;
    let scanned = scan_all(&config.root, &sources, config.parallel)?;
    Ok(scanned
        .iter()
        .map(|s| ProtocInvocation::new(&s.path, &s.imports, config))
        .collect())
}

/// Run `protoc` for each invocation, then the tag injector if enabled and
/// installed.
pub fn execute(config: &Config, invocations: &[ProtocInvocation]) -> Result<Summary, DriverError> {
    let program = config.protoc_program();
    let protoc = find_executable(program).ok_or_else(|| DriverError::ProtocNotFound {
        name: program.to_string(),
    })?;
    let injector = if config.inject_tags {
        find_executable(&config.inject_tag)
    } else {
        None
    };
    debug!(protoc = %protoc.display(), injector = ?injector, "resolved tools");

    let mut summary = Summary::default();
    for invocation in invocations {
        match run_protoc(&protoc, invocation, &config.root) {
            Ok(()) => summary.compiled += 1,
            Err(e) if e.is_tool_failure() => {
                warn!(source = %invocation.source.display(), error = %e, "protoc failed");
                summary.failed += 1;
                continue;
            }
            Err(e) => return Err(e),
        }

        if let Some(injector) = &injector {
            match inject_tags(injector, invocation, &config.root) {
                Ok(()) => summary.tagged += 1,
                Err(e) if e.is_tool_failure() => {
                    warn!(source = %invocation.source.display(), error = %e, "tag injection failed");
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
