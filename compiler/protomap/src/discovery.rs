//! Proto source discovery.
//!
//! Walks the root directory and collects every file with the configured
//! extension. Hidden directories and the top-level vendor directory are
//! skipped. Paths are returned relative to the root, sorted.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Config, DriverError};

/// Find all proto sources under `config.root`.
pub fn discover_sources(config: &Config) -> Result<Vec<PathBuf>, DriverError> {
    let mut sources = Vec::new();
    discover_recursive(config, &config.root, Path::new(""), &mut sources)?;
    sources.sort();
    debug!(count = sources.len(), root = %config.root.display(), "discovered sources");
    Ok(sources)
}

fn discover_recursive(
    config: &Config,
    dir: &Path,
    relative: &Path,
    sources: &mut Vec<PathBuf>,
) -> Result<(), DriverError> {
    let io_error = |source| DriverError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let name = entry.file_name();
        let rel_path = relative.join(&name);
        let file_type = entry.file_type().map_err(io_error)?;

        if file_type.is_dir() {
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with('.') || is_vendor(config, relative, name) {
                continue;
            }
            discover_recursive(config, &entry.path(), &rel_path, sources)?;
        } else if Path::new(&name)
            .extension()
            .is_some_and(|e| e == config.extension.as_str())
        {
            sources.push(rel_path);
        }
    }
    Ok(())
}

/// Only the vendor directory directly under the root is excluded.
fn is_vendor(config: &Config, relative: &Path, name: &str) -> bool {
    relative.as_os_str().is_empty() && name == config.vendor_dir
}
