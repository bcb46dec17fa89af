use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::{tempdir, TempDir};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "billing/invoice.proto",
        "syntax = \"proto3\";\n\nimport \"common/money.proto\";\n// import \"old.proto\";\nimport \"google/protobuf/timestamp.proto\";\n",
    );
    write(dir.path(), "common/money.proto", "syntax = \"proto3\";\npackage common;\n");
    write(dir.path(), "vendor/google/protobuf/timestamp.proto", "import \"broken");
    dir
}

fn config_for(root: &Path) -> Config {
    Config {
        prefix: "github.com/acme/gen".to_string(),
        root: root.to_path_buf(),
        inject_tags: false,
        ..Config::default()
    }
}

#[test]
fn scan_all_keeps_order_in_parallel_and_serial() {
    let dir = fixture();
    let sources = vec![
        PathBuf::from("common/money.proto"),
        PathBuf::from("billing/invoice.proto"),
    ];
    let parallel = scan_all(dir.path(), &sources, true).unwrap();
    let serial = scan_all(dir.path(), &sources, false).unwrap();
    assert_eq!(parallel, serial);
    assert_eq!(
        parallel,
        vec![
            ScannedSource {
                path: PathBuf::from("common/money.proto"),
                imports: vec![],
            },
            ScannedSource {
                path: PathBuf::from("billing/invoice.proto"),
                imports: vec![
                    "common/money.proto".to_string(),
                    "google/protobuf/timestamp.proto".to_string(),
                ],
            },
        ]
    );
}

#[test]
fn plan_builds_one_invocation_per_source() {
    let dir = fixture();
    let invocations = plan(&config_for(dir.path())).unwrap();
    let lines: Vec<String> = invocations.iter().map(|i| i.command_line("protoc")).collect();
    assert_eq!(
        lines,
        vec![
            "protoc -I . ./billing/invoice.proto --go_out=plugins=grpc,Mcommon/money.proto=github.com/acme/gen/common,Mgoogle/protobuf/timestamp.proto=github.com/acme/gen/google/protobuf:.",
            "protoc -I . ./common/money.proto --go_out=plugins=grpc:.",
        ]
    );
}

#[test]
fn scan_failure_aborts_plan() {
    let dir = fixture();
    write(dir.path(), "bad.proto", "import weak \"x.proto\";\n");
    let err = plan(&config_for(dir.path())).unwrap_err();
    match err {
        DriverError::Scan { path, .. } => assert_eq!(path, dir.path().join("bad.proto")),
        other => panic!("expected scan error, got {other:?}"),
    }
}

#[test]
fn missing_source_is_io_error() {
    let dir = tempdir().unwrap();
    let err = scan_source(dir.path(), Path::new("gone.proto")).unwrap_err();
    assert!(matches!(err, DriverError::Io { .. }));
}

#[test]
fn execute_without_protoc() {
    let dir = fixture();
    let config = Config {
        protoc: Some(dir.path().join("no-protoc-here").display().to_string()),
        ..config_for(dir.path())
    };
    let err = execute(&config, &[]).unwrap_err();
    assert!(matches!(err, DriverError::ProtocNotFound { .. }));
}

#[cfg(unix)]
fn fake_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn execute_runs_protoc_in_root_for_each_source() {
    let dir = fixture();
    let bin = tempdir().unwrap();
    let protoc = fake_tool(bin.path(), "fake-protoc", "echo \"$@\" >> protoc.log");
    let config = Config {
        protoc: Some(protoc.display().to_string()),
        ..config_for(dir.path())
    };

    let invocations = plan(&config).unwrap();
    let summary = execute(&config, &invocations).unwrap();
    assert_eq!(
        summary,
        Summary {
            compiled: 2,
            failed: 0,
            tagged: 0,
        }
    );

    let log = fs::read_to_string(dir.path().join("protoc.log")).unwrap();
    let calls: Vec<&str> = log.lines().collect();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].starts_with("-I . ./billing/invoice.proto --go_out="));
    assert_eq!(calls[1], "-I . ./common/money.proto --go_out=plugins=grpc:.");
}

#[cfg(unix)]
#[test]
fn failed_protoc_is_counted_and_run_continues() {
    let dir = fixture();
    let bin = tempdir().unwrap();
    let protoc = fake_tool(
        bin.path(),
        "fake-protoc",
        "case \"$3\" in *invoice*) echo boom >&2; exit 1;; esac\ntouch ok.marker",
    );
    let config = Config {
        protoc: Some(protoc.display().to_string()),
        ..config_for(dir.path())
    };

    let invocations = plan(&config).unwrap();
    let summary = execute(&config, &invocations).unwrap();
    assert_eq!(summary.compiled, 1);
    assert_eq!(summary.failed, 1);
    assert!(dir.path().join("ok.marker").exists());
}

#[cfg(unix)]
#[test]
fn relative_protoc_outside_root() {
    let dir = fixture();
    // Relative to the test's working directory, which is not the root.
    let bin = tempfile::Builder::new()
        .prefix("protomap-bin")
        .tempdir_in(".")
        .unwrap();
    fake_tool(bin.path(), "fake-protoc", "echo \"$@\" >> protoc.log");
    let relative = Path::new(bin.path().file_name().unwrap()).join("fake-protoc");
    let config = Config {
        protoc: Some(relative.display().to_string()),
        ..config_for(dir.path())
    };

    let invocations = plan(&config).unwrap();
    let summary = execute(&config, &invocations).unwrap();
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.compiled, 2);
    assert_eq!(
        fs::read_to_string(dir.path().join("protoc.log")).unwrap().lines().count(),
        2
    );
}

#[cfg(unix)]
fn tagging_config(root: &Path, bin: &Path, injector_script: &str) -> Config {
    let protoc = fake_tool(bin, "fake-protoc", "exit 0");
    let injector = fake_tool(bin, "fake-inject-tag", injector_script);
    Config {
        protoc: Some(protoc.display().to_string()),
        inject_tag: injector.display().to_string(),
        inject_tags: true,
        ..config_for(root)
    }
}

#[cfg(unix)]
#[test]
fn injector_runs_on_each_generated_file() {
    let dir = fixture();
    let bin = tempdir().unwrap();
    let config = tagging_config(dir.path(), bin.path(), "echo \"$@\" >> inject.log");

    let invocations = plan(&config).unwrap();
    let summary = execute(&config, &invocations).unwrap();
    assert_eq!(
        summary,
        Summary {
            compiled: 2,
            failed: 0,
            tagged: 2,
        }
    );

    let log = fs::read_to_string(dir.path().join("inject.log")).unwrap();
    assert_eq!(
        log.lines().collect::<Vec<_>>(),
        vec![
            "-input=billing/invoice.pb.go",
            "-input=common/money.pb.go",
        ]
    );
}

#[cfg(unix)]
#[test]
fn failed_injection_only_warns() {
    let dir = fixture();
    let bin = tempdir().unwrap();
    let config = tagging_config(dir.path(), bin.path(), "echo 'bad tag' >&2; exit 3");

    let invocations = plan(&config).unwrap();
    let summary = execute(&config, &invocations).unwrap();
    assert_eq!(
        summary,
        Summary {
            compiled: 2,
            failed: 0,
            tagged: 0,
        }
    );
}

#[cfg(unix)]
#[test]
fn missing_injector_is_skipped() {
    let dir = fixture();
    let bin = tempdir().unwrap();
    let config = Config {
        inject_tag: bin.path().join("not-installed").display().to_string(),
        ..tagging_config(dir.path(), bin.path(), "exit 0")
    };

    let invocations = plan(&config).unwrap();
    let summary = execute(&config, &invocations).unwrap();
    assert_eq!(summary.compiled, 2);
    assert_eq!(summary.tagged, 0);
}

#[cfg(unix)]
#[test]
fn disabled_injection_skips_injector() {
    let dir = fixture();
    let bin = tempdir().unwrap();
    let config = Config {
        inject_tags: false,
        ..tagging_config(dir.path(), bin.path(), "touch injected")
    };

    let invocations = plan(&config).unwrap();
    let summary = execute(&config, &invocations).unwrap();
    assert_eq!(summary.tagged, 0);
    assert!(!dir.path().join("injected").exists());
}
