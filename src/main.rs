// https://rust-lang.github.io/rust-clippy/stable/index.html
#![warn(clippy::pedantic)]

use clap::Parser;
use log::error;
use stager::cli::StagerArgs;
use stager::{exit_code, StagingPipeline, Workspace};

fn main() {
    setup_logging();

    let args = StagerArgs::parse();

    // Per-run scratch space for the deps tree; TMPDIR overrides the root.
    let scratch = match tempfile::tempdir() {
        Ok(scratch) => scratch,
        Err(io_error) => {
            error!("Unable to create staging scratch directory: {io_error}");
            std::process::exit(exit_code::STAGING_FAILED);
        }
    };

    let workspace = Workspace {
        build_dir: args.build_dir,
        buildpacks_dir: args.buildpacks_dir,
        cache_dir: args.build_artifacts_cache_dir,
        deps_dir: scratch.path().join("deps"),
        droplet_path: args.output_droplet,
        cache_archive_path: args.output_build_artifacts_cache,
        manifest_path: args.output_metadata,
    };

    let pipeline = StagingPipeline::new(workspace, args.buildpack_order, args.skip_detect);
    if let Err(stage_error) = pipeline.run() {
        error!("{stage_error}");
        // process::exit skips destructors; drop the scratch space by hand.
        let _ = scratch.close();
        std::process::exit(stage_error.exit_code());
    }
}

fn setup_logging() {
    if let Err(error) = stderrlog::new()
        .verbosity(2) // LevelFilter::Info
        .init()
    {
        eprintln!("Unable to initialize logger: {error}");
        std::process::exit(exit_code::STAGING_FAILED);
    }
}
