//! Go module mappings for imported protos.
//!
//! `protoc-gen-go` accepts `M<proto>=<go package>` options that override
//! the package of an imported file. Each import maps to the configured
//! prefix joined with the import's directory. Import paths always use `/`,
//! whatever the host platform.

/// The Go package for `import` under `prefix`.
///
/// The prefix and the import's directory are joined and cleaned: empty and
/// `.` components are dropped and `..` removes the component before it.
/// A result with no components is `.`.
///
/// ```
/// use protomap::mapping::module_path;
///
/// assert_eq!(module_path("acme/money.proto", "github.com/x/api"), "github.com/x/api/acme");
/// assert_eq!(module_path("money.proto", "github.com/x/api/"), "github.com/x/api");
/// assert_eq!(module_path("./acme//money.proto", "github.com/x/api"), "github.com/x/api/acme");
/// ```
pub fn module_path(import: &str, prefix: &str) -> String {
    let dir = match import.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((dir, _)) => dir,
        None => "",
    };
    clean_join(prefix, dir)
}

/// Join two slash-separated paths and normalize the result.
fn clean_join(prefix: &str, dir: &str) -> String {
    let rooted = if prefix.is_empty() {
        dir.starts_with('/')
    } else {
        prefix.starts_with('/')
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in prefix.split('/').chain(dir.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// A single `M<import>=<package>` option.
pub fn module_mapping(import: &str, prefix: &str) -> String {
    format!("M{import}={}", module_path(import, prefix))
}

/// All mappings for one source, each preceded by a comma, ready to append
/// to `--go_out` options.
pub fn mapping_options<S: AsRef<str>>(imports: &[S], prefix: &str) -> String {
    imports
        .iter()
        .map(|import| format!(",{}", module_mapping(import.as_ref(), prefix)))
        .collect()
}
