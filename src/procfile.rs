//! `Procfile` parsing.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::StageError;

/// Process-type overrides supplied by the application.
pub type Procfile = BTreeMap<String, String>;

/// Reads `Procfile` from the application root, if one exists.
///
/// An absent Procfile is not an error. An empty one yields an empty mapping,
/// which still replaces the buildpack's process types entirely.
///
/// # Errors
///
/// Returns [`StageError::ProcfileInvalid`] if the file is not a flat YAML
/// mapping of process-type names to commands.
pub fn read(build_dir: &Path) -> Result<Option<Procfile>, StageError> {
    let contents = match fs::read_to_string(build_dir.join("Procfile")) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };

    if contents.trim().is_empty() {
        return Ok(Some(Procfile::new()));
    }

    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|_| StageError::ProcfileInvalid)
}
