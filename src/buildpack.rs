use md5::{Digest, Md5};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StageError;

/// Directory and cache-slot key for a buildpack: the lowercase hex MD5 of
/// the name the buildpack was configured under.
#[must_use]
pub fn buildpack_key(name: &str) -> String {
    format!("{:x}", Md5::digest(name.as_bytes()))
}

/// Presence of the per-phase executables under a buildpack's `bin/`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Scripts {
    pub detect: bool,
    pub supply: bool,
    pub finalize: bool,
    pub compile: bool,
    pub release: bool,
}

impl Scripts {
    fn probe(root: &Path) -> Self {
        let bin = root.join("bin");

        Self {
            detect: bin.join("detect").is_file(),
            supply: bin.join("supply").is_file(),
            finalize: bin.join("finalize").is_file(),
            compile: bin.join("compile").is_file(),
            release: bin.join("release").is_file(),
        }
    }

    /// Dispatch variant for the final staging phase.
    #[must_use]
    pub fn mode(self) -> Mode {
        if self.finalize {
            Mode::SupplyFinalize
        } else {
            Mode::LegacyCompile
        }
    }
}

/// How a final buildpack writes the application: the split
/// `supply`/`finalize` protocol, or the single legacy `compile` step that
/// predates multi-buildpack staging.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    SupplyFinalize,
    LegacyCompile,
}

/// A buildpack from the configured order, resolved to its on-disk root.
#[derive(Debug, Clone)]
pub struct BuildpackRef {
    /// The name the buildpack was configured under, used to compute its key.
    pub name: String,
    /// Lowercase hex MD5 of `name`.
    pub key: String,
    /// Resolved root directory, after nested-root unwrapping.
    pub root: PathBuf,
    pub scripts: Scripts,
}

impl BuildpackRef {
    /// Path of one of the buildpack's phase executables.
    #[must_use]
    pub fn script(&self, name: &str) -> PathBuf {
        self.root.join("bin").join(name)
    }
}

/// Resolves ordered buildpack names against the on-disk buildpacks
/// directory.
pub struct Registry {
    buildpacks_dir: PathBuf,
}

impl Registry {
    pub fn new(buildpacks_dir: impl Into<PathBuf>) -> Self {
        Self {
            buildpacks_dir: buildpacks_dir.into(),
        }
    }

    /// Resolves a declared buildpack name to its keyed directory.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::BuildpackNotFound`] if the keyed directory does
    /// not exist or exposes no `bin/` subtree.
    pub fn resolve(&self, name: &str) -> Result<BuildpackRef, StageError> {
        let key = buildpack_key(name);

        let root = self.buildpacks_dir.join(&key);
        if !root.is_dir() {
            return Err(StageError::BuildpackNotFound(name.to_string()));
        }

        let root = unwrap_nested_root(root)?;
        if !root.join("bin").is_dir() {
            return Err(StageError::BuildpackNotFound(name.to_string()));
        }

        let scripts = Scripts::probe(&root);

        Ok(BuildpackRef {
            name: name.to_string(),
            key,
            root,
            scripts,
        })
    }
}

// Buildpack archives sometimes unpack with a single wrapping folder. A root
// with no top-level `bin/` and exactly one subdirectory is unwrapped to that
// subdirectory.
fn unwrap_nested_root(root: PathBuf) -> io::Result<PathBuf> {
    if root.join("bin").is_dir() {
        return Ok(root);
    }

    let mut entries = fs::read_dir(&root)?;
    match (entries.next(), entries.next()) {
        (Some(only_entry), None) => {
            let only_entry = only_entry?;
            if only_entry.file_type()?.is_dir() {
                Ok(only_entry.path())
            } else {
                Ok(root)
            }
        }
        _ => Ok(root),
    }
}
