//! protomap CLI
//!
//! Compiles every proto file under a directory with protoc, mapping each
//! import to its Go package.

use std::error::Error;
use std::process::ExitCode;

use protomap::config::USAGE;
use protomap::{execute, init_tracing, parse_args, plan, DriverError, Invocation};

fn main() -> ExitCode {
    let config = match parse_args(std::env::args().skip(1)) {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!();
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };
    let config = config.with_env_overrides(|key| std::env::var(key).ok());
    init_tracing(config.verbose);

    let invocations = match plan(&config) {
        Ok(invocations) => invocations,
        Err(e) => return report(&e),
    };

    if config.dry_run {
        for invocation in &invocations {
            println!("{}", invocation.command_line(config.protoc_program()));
        }
        return ExitCode::SUCCESS;
    }

    match execute(&config, &invocations) {
        Ok(summary) => {
            eprintln!(
                "compiled {} of {} sources ({} failed, {} tagged)",
                summary.compiled,
                invocations.len(),
                summary.failed,
                summary.tagged
            );
            if summary.failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => report(&e),
    }
}

/// Print an error with its chain of causes.
fn report(e: &DriverError) -> ExitCode {
    eprintln!("error: {e}");
    let mut cause = e.source();
    while let Some(inner) = cause {
        eprintln!("  caused by: {inner}");
        cause = inner.source();
    }
    ExitCode::FAILURE
}
