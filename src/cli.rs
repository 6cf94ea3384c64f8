use clap::Parser;
use std::path::PathBuf;

/// Stages an application: runs an ordered sequence of buildpacks against the
/// build directory and packages the result as a droplet.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct StagerArgs {
    /// Directory containing the unpacked application source
    #[arg(long, value_name = "DIR")]
    pub build_dir: PathBuf,

    /// Directory containing buildpacks, keyed by the MD5 of their name
    #[arg(long, value_name = "DIR")]
    pub buildpacks_dir: PathBuf,

    /// Comma-separated buildpack names, the final buildpack last
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub buildpack_order: Vec<String>,

    /// Directory holding cached build artifacts from previous stagings
    #[arg(long, value_name = "DIR")]
    pub build_artifacts_cache_dir: PathBuf,

    /// Path at which the droplet archive is written
    #[arg(long, value_name = "FILE")]
    pub output_droplet: PathBuf,

    /// Path at which the build-artifacts cache archive is written
    #[arg(long, value_name = "FILE")]
    pub output_build_artifacts_cache: PathBuf,

    /// Path at which the result manifest is written
    #[arg(long, value_name = "FILE")]
    pub output_metadata: PathBuf,

    /// Take the buildpack order as authoritative instead of running detect
    #[arg(long)]
    pub skip_detect: bool,
}
