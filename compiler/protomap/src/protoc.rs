//! `protoc` invocations and the optional tag-injection step.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::mapping::mapping_options;
use crate::{Config, DriverError};

/// Post-processor run over each generated Go file when it is installed.
pub const INJECT_TAG_BINARY: &str = "protoc-go-inject-tag";

/// Arguments for compiling one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocInvocation {
    /// Source path relative to the root.
    pub source: PathBuf,
    /// Arguments passed to `protoc`, in order.
    pub args: Vec<String>,
}

impl ProtocInvocation {
    /// Build `-I . ./<source> --go_out=<go_out><mappings>:.`.
    pub fn new<S: AsRef<str>>(source: &Path, imports: &[S], config: &Config) -> Self {
        let mappings = mapping_options(imports, &config.prefix);
        let args = vec![
            "-I".to_string(),
            ".".to_string(),
            format!("./{}", slash_path(source)),
            format!("--go_out={}{mappings}:.", config.go_out),
        ];
        ProtocInvocation {
            source: source.to_path_buf(),
            args,
        }
    }

    /// Shell-like rendering for dry runs and logs.
    pub fn command_line(&self, program: &str) -> String {
        let mut line = program.to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Path of the Go file `protoc-gen-go` writes for this source.
    pub fn generated_go_file(&self) -> PathBuf {
        self.source.with_extension("pb.go")
    }
}

/// `path` with `/` separators, as protoc expects for `-I`-relative paths.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Locate `name` the way a shell would.
///
/// A name containing a path separator is checked as given; anything else is
/// searched for in each `PATH` entry. The result is absolute, since tools
/// run with the root as their working directory.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| absolute(candidate.to_path_buf()));
    }
    let path = env::var_os("PATH")?;
    find_in(name, &path)
}

/// Search the entries of a `PATH`-style list for `name`.
///
/// Relative entries are resolved against the current directory.
pub fn find_in(name: &str, path_list: &OsStr) -> Option<PathBuf> {
    env::split_paths(path_list)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| executable_names(name).map(move |n| dir.join(n)))
        .find(|candidate| is_executable(candidate))
        .map(absolute)
}

/// `path` made absolute against the current directory, or unchanged if that
/// is unavailable.
fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(windows)]
fn executable_names(name: &str) -> impl Iterator<Item = String> + '_ {
    [String::new(), ".exe".to_string()]
        .into_iter()
        .map(move |ext| format!("{name}{ext}"))
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(name.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run `program` with `args` in `dir`, capturing stderr.
///
/// A non-zero exit is [`DriverError::ToolFailed`] carrying the captured
/// stderr.
pub fn run_tool<I, A>(program: &Path, args: I, dir: &Path, source: &Path) -> Result<(), DriverError>
where
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let Output { status, stderr, .. } = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| DriverError::Spawn {
            program: program.to_path_buf(),
            source: e,
        })?;

    if !status.success() {
        return Err(DriverError::ToolFailed {
            program: program.to_path_buf(),
            source_file: source.to_path_buf(),
            status,
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        });
    }
    Ok(())
}

/// Compile one source.
#[tracing::instrument(level = "debug", skip_all, fields(source = %invocation.source.display()))]
pub fn run_protoc(protoc: &Path, invocation: &ProtocInvocation, root: &Path) -> Result<(), DriverError> {
    debug!(args = ?invocation.args, "running protoc");
    run_tool(protoc, &invocation.args, root, &invocation.source)
}

/// Rewrite struct tags in the Go file generated for `invocation`.
#[tracing::instrument(level = "debug", skip_all, fields(source = %invocation.source.display()))]
pub fn inject_tags(injector: &Path, invocation: &ProtocInvocation, root: &Path) -> Result<(), DriverError> {
    let input = format!("-input={}", slash_path(&invocation.generated_go_file()));
    debug!(%input, "injecting tags");
    run_tool(injector, [input], root, &invocation.source)
}
