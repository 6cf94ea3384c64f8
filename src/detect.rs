//! Buildpack selection.

use std::path::Path;

use crate::buildpack::BuildpackRef;
use crate::error::StageError;
use crate::runner;

/// Runs `detect` across the ordered buildpacks and selects the first match.
///
/// Returns the index of the selected buildpack together with its
/// human-readable name, the trimmed `detect` stdout. A buildpack without a
/// `detect` script, a non-zero `detect` exit and a script that fails to
/// spawn all mean the same thing: the buildpack does not match, and
/// selection advances to the next candidate.
///
/// # Errors
///
/// Returns [`StageError::DetectNoneMatched`] when no buildpack matches.
pub fn first_matching(
    buildpacks: &[BuildpackRef],
    build_dir: &Path,
) -> Result<(usize, String), StageError> {
    for (index, buildpack) in buildpacks.iter().enumerate() {
        if !buildpack.scripts.detect {
            continue;
        }

        match runner::detect(buildpack, build_dir) {
            Ok(run) if run.success => return Ok((index, run.stdout.trim().to_string())),
            Ok(_) | Err(_) => {}
        }
    }

    Err(StageError::DetectNoneMatched)
}
