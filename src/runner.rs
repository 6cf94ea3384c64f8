//! Child-process invocation of buildpack scripts.
//!
//! Scripts run one at a time, in order. `supply`, `finalize` and `compile`
//! talk to humans: their stdout is drained into the parent's stderr so
//! buildpack logs land on the staging log stream. `detect` and `release`
//! talk to the engine: their stdout is captured instead. stderr is inherited
//! in all cases.

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::buildpack::BuildpackRef;

/// Result of a script whose stdout is captured.
#[derive(Debug)]
pub struct Captured {
    pub success: bool,
    pub stdout: String,
}

/// Runs `bin/detect <build_dir>` and captures its stdout.
///
/// # Errors
///
/// Returns `Err` if the script could not be spawned or waited on.
pub fn detect(buildpack: &BuildpackRef, build_dir: &Path) -> io::Result<Captured> {
    run_captured(&buildpack.script("detect"), &[build_dir.as_os_str()])
}

/// Runs `bin/supply <build_dir> <cache_slot> <deps_dir> <deps_index>`.
///
/// # Errors
///
/// Returns `Err` if the script could not be spawned or waited on.
pub fn supply(
    buildpack: &BuildpackRef,
    build_dir: &Path,
    cache_slot: &Path,
    deps_dir: &Path,
    deps_index: usize,
) -> io::Result<bool> {
    let deps_index = deps_index.to_string();

    run_streamed(
        &buildpack.script("supply"),
        &[
            build_dir.as_os_str(),
            cache_slot.as_os_str(),
            deps_dir.as_os_str(),
            OsStr::new(&deps_index),
        ],
    )
}

/// Runs `bin/finalize <build_dir> <cache_slot> <deps_dir> <deps_index>`.
///
/// # Errors
///
/// Returns `Err` if the script could not be spawned or waited on.
pub fn finalize(
    buildpack: &BuildpackRef,
    build_dir: &Path,
    cache_slot: &Path,
    deps_dir: &Path,
    deps_index: usize,
) -> io::Result<bool> {
    let deps_index = deps_index.to_string();

    run_streamed(
        &buildpack.script("finalize"),
        &[
            build_dir.as_os_str(),
            cache_slot.as_os_str(),
            deps_dir.as_os_str(),
            OsStr::new(&deps_index),
        ],
    )
}

/// Runs the legacy `bin/compile <build_dir> <cache_slot>`.
///
/// # Errors
///
/// Returns `Err` if the script could not be spawned or waited on.
pub fn compile(buildpack: &BuildpackRef, build_dir: &Path, cache_slot: &Path) -> io::Result<bool> {
    run_streamed(
        &buildpack.script("compile"),
        &[build_dir.as_os_str(), cache_slot.as_os_str()],
    )
}

/// Runs `bin/release <build_dir>` and captures its stdout.
///
/// # Errors
///
/// Returns `Err` if the script could not be spawned or waited on.
pub fn release(buildpack: &BuildpackRef, build_dir: &Path) -> io::Result<Captured> {
    run_captured(&buildpack.script("release"), &[build_dir.as_os_str()])
}

fn run_streamed(script: &Path, args: &[&OsStr]) -> io::Result<bool> {
    let mut child = Command::new(script)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()?;

    if let Some(mut stdout) = child.stdout.take() {
        io::copy(&mut stdout, &mut io::stderr())?;
    }

    Ok(child.wait()?.success())
}

fn run_captured(script: &Path, args: &[&OsStr]) -> io::Result<Captured> {
    let output = Command::new(script)
        .args(args)
        .stderr(Stdio::inherit())
        .output()?;

    Ok(Captured {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}
