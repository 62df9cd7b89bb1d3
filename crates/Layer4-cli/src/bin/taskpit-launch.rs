//! taskpit-launch - companion launcher
//!
//! `taskpit-launch [-o OUT] [-e ERR] [-d DIR] -- PROGRAM [ARGS...]`
//!
//! Redirects standard output and error into files (create/truncate),
//! changes directory, then replaces itself with PROGRAM. Any failure is
//! reported on the original standard error and the launcher exits 1
//! without running PROGRAM.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "taskpit-launch")]
#[command(version, about = "Run a program with redirected output and working directory")]
#[command(args_override_self = true)]
struct Args {
    /// Redirect standard output to this file
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Redirect standard error to this file
    #[arg(short = 'e', value_name = "PATH")]
    error: Option<PathBuf>,

    /// Working directory for the program
    #[arg(short = 'd', value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Program and its arguments
    #[arg(last = true, required = true, value_name = "PROGRAM")]
    command: Vec<OsString>,
}

#[cfg(unix)]
fn main() -> ExitCode {
    use std::io::Write;
    use std::os::fd::AsFd;

    let args = Args::parse();

    let mut original_stderr = match std::io::stderr().as_fd().try_clone_to_owned() {
        Ok(fd) => std::fs::File::from(fd),
        Err(e) => {
            eprintln!("taskpit-launch: cannot duplicate standard error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match launch(args) {
        Ok(never) => match never {},
        Err(e) => {
            let _ = writeln!(original_stderr, "taskpit-launch: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Apply `-o`, `-e`, `-d` in that order and exec the program.
/// Returns only on failure.
#[cfg(unix)]
fn launch(args: Args) -> anyhow::Result<std::convert::Infallible> {
    use anyhow::Context;
    use std::fs::File;
    use std::os::unix::process::CommandExt;
    use std::process::Command;

    let mut command = args.command.into_iter();
    let program = command.next().context("no program given")?;
    let mut process = Command::new(&program);
    process.args(command);

    if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("cannot open output file {}", path.display()))?;
        process.stdout(file);
    }
    if let Some(path) = &args.error {
        let file = File::create(path)
            .with_context(|| format!("cannot open error file {}", path.display()))?;
        process.stderr(file);
    }
    if let Some(dir) = &args.dir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("cannot change directory to {}", dir.display()))?;
    }

    let err = process.exec();
    Err(err).with_context(|| format!("cannot run {}", program.to_string_lossy()))
}

#[cfg(not(unix))]
fn main() -> ExitCode {
    let _ = Args::parse();
    eprintln!("taskpit-launch: only supported on unix hosts");
    ExitCode::FAILURE
}
