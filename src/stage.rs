//! The staging pipeline.
//!
//! Orchestrates buildpack selection, the supply phase, the final
//! `finalize`/`compile` phase, release parsing, the Procfile merge and the
//! packaging of the droplet, the cache archive and the result manifest.

use log::warn;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::buildpack::{BuildpackRef, Mode, Registry};
use crate::cache::CacheManager;
use crate::detect;
use crate::droplet::{self, StagingInfo};
use crate::error::StageError;
use crate::manifest::Manifest;
use crate::procfile;
use crate::release;
use crate::runner;

/// On-disk locations a staging run reads and writes.
///
/// The build, buildpacks and cache directories are owned by the caller. The
/// deps directory is per-run scratch space and should live under the
/// caller's temp root; it is laid out as one numbered slot per staged
/// buildpack.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub build_dir: PathBuf,
    pub buildpacks_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub deps_dir: PathBuf,
    pub droplet_path: PathBuf,
    pub cache_archive_path: PathBuf,
    pub manifest_path: PathBuf,
}

/// Drives one staging run to completion.
pub struct StagingPipeline {
    workspace: Workspace,
    buildpack_order: Vec<String>,
    skip_detect: bool,
}

impl StagingPipeline {
    #[must_use]
    pub fn new(workspace: Workspace, buildpack_order: Vec<String>, skip_detect: bool) -> Self {
        Self {
            workspace,
            buildpack_order,
            skip_detect,
        }
    }

    /// Runs the full pipeline: resolve, prune, detect (unless skipped),
    /// supply, finalize or compile, release, Procfile merge, package.
    ///
    /// # Errors
    ///
    /// Returns the [`StageError`] describing the first failed step; each
    /// variant corresponds to one exit code of the staging binary.
    pub fn run(&self) -> Result<(), StageError> {
        let registry = Registry::new(&self.workspace.buildpacks_dir);
        let ordered = self
            .buildpack_order
            .iter()
            .map(|name| registry.resolve(name))
            .collect::<Result<Vec<_>, _>>()?;

        if ordered.is_empty() {
            return Err(StageError::OrderEmpty);
        }

        let cache = CacheManager::new(&self.workspace.cache_dir);
        cache.prune(&ordered)?;

        // Detection picks a single buildpack to stage; skip-detect takes the
        // whole order as authoritative, the last entry being final.
        let (staged, detected_name) = if self.skip_detect {
            (ordered, None)
        } else {
            let (index, name) = detect::first_matching(&ordered, &self.workspace.build_dir)?;
            let mut ordered = ordered;
            (vec![ordered.swap_remove(index)], Some(name))
        };

        let final_index = staged.len() - 1;
        let final_buildpack = &staged[final_index];

        for index in 0..staged.len() {
            fs::create_dir_all(self.workspace.deps_dir.join(index.to_string()))?;
        }
        cache.prepare_slots(&staged, final_index)?;

        let multi_buildpack =
            staged.len() > 1 || final_buildpack.scripts.mode() == Mode::SupplyFinalize;

        if multi_buildpack {
            self.run_supply_phase(&staged[..final_index], &cache)?;
        }
        self.run_final_phase(final_buildpack, final_index, &cache)?;

        let release_run = runner::release(final_buildpack, &self.workspace.build_dir)
            .map_err(|_| StageError::ReleaseFailed)?;
        if !release_run.success {
            return Err(StageError::ReleaseFailed);
        }
        let release_info = release::parse(&release_run.stdout)?;

        // In skip-detect mode no detect output exists; the buildpack may
        // name itself in its release document, and its declared name is the
        // fallback.
        let detected_buildpack = detected_name.unwrap_or_else(|| {
            release_info
                .detected_buildpack
                .clone()
                .unwrap_or_else(|| final_buildpack.name.clone())
        });

        let process_types = match procfile::read(&self.workspace.build_dir)? {
            Some(procfile) => procfile,
            None => release_info.default_process_types,
        };

        if !process_types.contains_key("web") {
            warn!("No start command specified by buildpack or via Procfile.");
            warn!("App will not start unless a command is provided at runtime.");
        }
        let start_command = process_types.get("web").cloned().unwrap_or_default();

        prune_empty_deps_slots(&self.workspace.deps_dir)?;
        let deps_dir = (multi_buildpack && dir_has_entries(&self.workspace.deps_dir)?)
            .then(|| self.workspace.deps_dir.as_path());

        droplet::write_droplet(
            &self.workspace.droplet_path,
            &self.workspace.build_dir,
            deps_dir,
            &StagingInfo {
                detected_buildpack: detected_buildpack.clone(),
                start_command,
            },
        )?;

        cache.write_archive(&self.workspace.cache_archive_path)?;

        Manifest::new(
            process_types,
            detected_buildpack,
            final_buildpack.key.clone(),
        )
        .write(&self.workspace.manifest_path)?;

        Ok(())
    }

    fn run_supply_phase(
        &self,
        suppliers: &[BuildpackRef],
        cache: &CacheManager,
    ) -> Result<(), StageError> {
        for (index, buildpack) in suppliers.iter().enumerate() {
            if !buildpack.scripts.supply {
                continue;
            }

            let succeeded = runner::supply(
                buildpack,
                &self.workspace.build_dir,
                &cache.slot(&buildpack.key),
                &self.workspace.deps_dir,
                index,
            )
            .map_err(|_| StageError::SupplyFailed)?;

            if !succeeded {
                return Err(StageError::SupplyFailed);
            }
        }

        Ok(())
    }

    fn run_final_phase(
        &self,
        buildpack: &BuildpackRef,
        deps_index: usize,
        cache: &CacheManager,
    ) -> Result<(), StageError> {
        let succeeded = match buildpack.scripts.mode() {
            Mode::SupplyFinalize => {
                if buildpack.scripts.supply {
                    let slot = cache.slot(&buildpack.key);
                    fs::create_dir_all(&slot)?;

                    let supplied = runner::supply(
                        buildpack,
                        &self.workspace.build_dir,
                        &slot,
                        &self.workspace.deps_dir,
                        deps_index,
                    )
                    .map_err(|_| StageError::CompileFailed)?;
                    if !supplied {
                        return Err(StageError::CompileFailed);
                    }
                }

                runner::finalize(
                    buildpack,
                    &self.workspace.build_dir,
                    &cache.primary(),
                    &self.workspace.deps_dir,
                    deps_index,
                )
            }
            Mode::LegacyCompile => {
                runner::compile(buildpack, &self.workspace.build_dir, &cache.primary())
            }
        }
        .map_err(|_| StageError::CompileFailed)?;

        if succeeded {
            Ok(())
        } else {
            Err(StageError::CompileFailed)
        }
    }
}

// Deps slots nothing wrote to are dropped so the droplet only carries
// dependency directories with content.
fn prune_empty_deps_slots(deps_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(deps_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && fs::read_dir(entry.path())?.next().is_none() {
            fs::remove_dir(entry.path())?;
        }
    }

    Ok(())
}

fn dir_has_entries(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_some())
}
