//! Run configuration and command-line parsing.

use std::path::PathBuf;

use crate::protoc::INJECT_TAG_BINARY;
use crate::DriverError;

/// Environment variable overriding the `protoc` binary.
pub const PROTOC_ENV: &str = "PROTOMAP_PROTOC";

/// `protoc` binary used when neither `--protoc` nor the environment names one.
pub const DEFAULT_PROTOC: &str = "protoc";

/// Command-line help.
pub const USAGE: &str = "\
Usage: protomap -p <prefix> [options]

Compiles every .proto file under the root with protoc, mapping each import
to <prefix>/<directory of the import>.

Options:
  -p, --prefix=<prefix>  Go package prefix for imported protos (required)
  --root=<dir>           Directory to search (default: .)
  --vendor=<name>        Top-level directory to skip (default: vendor)
  --protoc=<binary>      protoc binary (default: protoc, or $PROTOMAP_PROTOC)
  --go-out=<opts>        Options for --go_out before the mappings (default: plugins=grpc)
  --inject-tag=<binary>  Tag injector run on generated files (default: protoc-go-inject-tag)
  --no-inject-tags       Do not run the tag injector on generated files
  --no-parallel          Scan files on one thread
  --dry-run              Print protoc command lines instead of running them
  -v, --verbose          Debug logging as an indented span tree
  -h, --help             Show this help";

/// Everything a run needs to know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Go package prefix prepended to each import's directory.
    pub prefix: String,
    /// Directory searched for proto files; protoc runs here.
    pub root: PathBuf,
    /// Top-level directory under `root` that is never searched.
    pub vendor_dir: String,
    /// Extension of source files, without the dot.
    pub extension: String,
    /// `protoc` binary name or path given explicitly, if any.
    pub protoc: Option<String>,
    /// Options given to `--go_out` ahead of the module mappings.
    pub go_out: String,
    /// Tag injector binary name or path.
    pub inject_tag: String,
    /// Run the tag injector on generated files when it is available.
    pub inject_tags: bool,
    /// Print invocations instead of running them.
    pub dry_run: bool,
    /// Scan files in parallel.
    pub parallel: bool,
    /// Debug logging.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefix: String::new(),
            root: PathBuf::from("."),
            vendor_dir: "vendor".to_string(),
            extension: "proto".to_string(),
            protoc: None,
            go_out: "plugins=grpc".to_string(),
            inject_tag: INJECT_TAG_BINARY.to_string(),
            inject_tags: true,
            dry_run: false,
            parallel: true,
            verbose: false,
        }
    }
}

impl Config {
    /// Apply environment overrides.
    ///
    /// `lookup` is normally `|key| std::env::var(key).ok()`. An explicit
    /// `--protoc` wins over the environment.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.protoc.is_none() {
            self.protoc = lookup(PROTOC_ENV).filter(|p| !p.is_empty());
        }
        self
    }

    /// The `protoc` binary to run.
    pub fn protoc_program(&self) -> &str {
        self.protoc.as_deref().unwrap_or(DEFAULT_PROTOC)
    }
}

/// What the command line asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Compile with this configuration.
    Run(Config),
    /// Print [`USAGE`].
    Help,
}

/// Parse command-line arguments (without the program name).
///
/// Options take their value either inline (`--root=dir`, `-p=prefix`) or as
/// the following argument (`--root dir`, `-p prefix`).
pub fn parse_args<I, S>(args: I) -> Result<Invocation, DriverError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut config = Config::default();
    let mut args = args.into_iter().map(Into::into);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with('-') => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };

        let mut value = |name: &str| -> Result<String, DriverError> {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| DriverError::Usage(format!("missing value for {name}")))
        };

        match flag.as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "-p" | "--prefix" => config.prefix = value("--prefix")?,
            "--root" => config.root = PathBuf::from(value("--root")?),
            "--vendor" => config.vendor_dir = value("--vendor")?,
            "--protoc" => config.protoc = Some(value("--protoc")?),
            "--inject-tag" => config.inject_tag = value("--inject-tag")?,
            "--go-out" => config.go_out = value("--go-out")?,
            "--no-inject-tags" => config.inject_tags = false,
            "--no-parallel" => config.parallel = false,
            "--dry-run" => config.dry_run = true,
            "-v" | "--verbose" => config.verbose = true,
            _ => return Err(DriverError::Usage(format!("unknown argument `{arg}`"))),
        }
    }

    if config.prefix.is_empty() {
        return Err(DriverError::Usage("need to provide prefix".to_string()));
    }
    Ok(Invocation::Run(config))
}
