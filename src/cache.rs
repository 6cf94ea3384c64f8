//! Build-artifacts cache maintenance.
//!
//! The cache directory is partitioned into slots: `primary`, reserved for
//! the final buildpack's `finalize`/`compile` output, and one keyed slot per
//! supplying buildpack. Slots written by previous stagings survive only
//! while their buildpack remains in the configured order.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::buildpack::BuildpackRef;

/// Name of the cache slot reserved for the final buildpack.
pub const PRIMARY_SLOT: &str = "primary";

/// Maintains the per-invocation cache directory and its output archive.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Path of the slot keyed by a buildpack key.
    #[must_use]
    pub fn slot(&self, key: &str) -> PathBuf {
        self.cache_dir.join(key)
    }

    /// Path of the `primary` slot.
    #[must_use]
    pub fn primary(&self) -> PathBuf {
        self.slot(PRIMARY_SLOT)
    }

    /// Deletes cache entries no buildpack in the current order can claim.
    ///
    /// Runs before any buildpack script so a stale slot that is about to
    /// disappear can never be observed or repopulated.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the cache directory could not be read or an entry
    /// could not be removed.
    pub fn prune(&self, buildpacks: &[BuildpackRef]) -> io::Result<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let name = entry.file_name();

            let retained = name == PRIMARY_SLOT
                || buildpacks
                    .iter()
                    .any(|buildpack| name == buildpack.key.as_str());
            if retained {
                continue;
            }

            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }

    /// Ensures the slots for this staging exist: one keyed slot per
    /// supplying buildpack, plus `primary` for the final phase.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a slot directory could not be created.
    pub fn prepare_slots(
        &self,
        buildpacks: &[BuildpackRef],
        final_index: usize,
    ) -> io::Result<()> {
        for (index, buildpack) in buildpacks.iter().enumerate() {
            if index != final_index {
                fs::create_dir_all(self.slot(&buildpack.key))?;
            }
        }

        fs::create_dir_all(self.primary())
    }

    /// Writes the cache archive: a gzipped tar with one `./<slot>/` tree per
    /// slot that holds anything. Slots left empty are not represented.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the cache directory could not be read or the archive
    /// could not be written.
    pub fn write_archive(&self, destination: &Path) -> io::Result<()> {
        let destination_file = File::create(destination)?;
        let mut tar_builder =
            tar::Builder::new(GzEncoder::new(destination_file, Compression::default()));
        tar_builder.follow_symlinks(false);

        let mut slots = fs::read_dir(&self.cache_dir)?.collect::<io::Result<Vec<_>>>()?;
        slots.sort_by_key(fs::DirEntry::file_name);

        for slot in slots {
            if slot.file_type()?.is_dir() && fs::read_dir(slot.path())?.next().is_none() {
                continue;
            }

            tar_builder.append_dir_all(Path::new(".").join(slot.file_name()), slot.path())?;
        }

        tar_builder.into_inner()?.finish()?.flush()
    }
}
