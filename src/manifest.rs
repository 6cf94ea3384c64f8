//! The result manifest handed back to the platform after staging.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::StageError;

const LIFECYCLE_TYPE: &str = "buildpack";

/// The JSON result document written to the configured metadata path.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub process_types: BTreeMap<String, String>,
    pub lifecycle_type: &'static str,
    pub lifecycle_metadata: LifecycleMetadata,
    pub execution_metadata: String,
}

#[derive(Debug, Serialize)]
pub struct LifecycleMetadata {
    pub detected_buildpack: String,
    pub buildpack_key: String,
}

impl Manifest {
    #[must_use]
    pub fn new(
        process_types: BTreeMap<String, String>,
        detected_buildpack: String,
        buildpack_key: String,
    ) -> Self {
        Self {
            process_types,
            lifecycle_type: LIFECYCLE_TYPE,
            lifecycle_metadata: LifecycleMetadata {
                detected_buildpack,
                buildpack_key,
            },
            execution_metadata: String::new(),
        }
    }

    /// Serializes the manifest as JSON to the given path.
    ///
    /// # Errors
    ///
    /// Returns `Err` if serialization fails or the file could not be
    /// written.
    pub fn write(&self, destination: &Path) -> Result<(), StageError> {
        fs::write(destination, serde_json::to_vec(self)?)?;

        Ok(())
    }
}
