//! Parsing of `bin/release` output.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::StageError;

/// The YAML document a final buildpack prints from `bin/release`.
///
/// Only `default_process_types` is contractual. `detected_buildpack` is an
/// optional sibling some buildpacks emit to name themselves; it is used when
/// detection was skipped and no `detect` output exists.
#[derive(Debug, Default, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub detected_buildpack: Option<String>,
    #[serde(default)]
    pub default_process_types: BTreeMap<String, String>,
}

/// Parses captured `release` stdout.
///
/// # Errors
///
/// Returns [`StageError::ReleaseInvalid`] if the output is not a YAML
/// mapping of the expected shape.
pub fn parse(stdout: &str) -> Result<ReleaseInfo, StageError> {
    serde_yaml::from_str(stdout).map_err(|_| StageError::ReleaseInvalid)
}
