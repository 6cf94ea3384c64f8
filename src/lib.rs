// https://rust-lang.github.io/rust-clippy/stable/index.html
#![warn(clippy::pedantic)]
// This lint is too noisy and enforces a style that reduces readability in many cases.
#![allow(clippy::module_name_repetitions)]

//! A buildpack-driven application staging engine.
//!
//! Staging transforms an unpacked application source tree into a runnable
//! droplet by driving an ordered sequence of external buildpack programs
//! through the multi-phase protocol (`detect`, `supply`, `finalize` or
//! `compile`, `release`) and packaging the results:
//!
//! - the droplet archive, a gzipped tar holding the staged application and
//!   its runtime layout,
//! - the build-artifacts cache archive, preserving per-buildpack cache slots
//!   for incremental restaging, and
//! - a JSON result manifest describing the detected buildpack and the
//!   effective process types.
//!
//! The [`stage::StagingPipeline`] is the entry point; the `stager` binary
//! wraps it with flag parsing and maps the [`error::StageError`] taxonomy
//! onto process exit codes.

pub mod buildpack;
pub mod cache;
pub mod cli;
pub mod detect;
pub mod droplet;
pub mod error;
pub mod exit_code;
pub mod manifest;
pub mod procfile;
pub mod release;
pub mod runner;
pub mod stage;

pub use error::{Result, StageError};
pub use stage::{StagingPipeline, Workspace};
