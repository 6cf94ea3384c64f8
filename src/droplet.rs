//! Droplet assembly.

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tar::{EntryType, Header};

use crate::error::StageError;

/// Top-of-archive record describing what staging produced.
///
/// Written as `./staging_info.yml`, serialized as JSON (which is valid
/// YAML) so both YAML and JSON consumers can read it.
#[derive(Debug, Serialize)]
pub struct StagingInfo {
    pub detected_buildpack: String,
    pub start_command: String,
}

/// Writes the droplet archive.
///
/// The droplet is a gzipped tar with the staged application under `./app`,
/// the dependency tree under `./deps` when staging produced one, empty
/// `./tmp` and `./logs` runtime directories and a `./staging_info.yml`
/// describing the result. All paths are relative with a leading `./`; file
/// modes follow the on-disk values and symlinks are preserved.
///
/// # Errors
///
/// Returns `Err` if the archive could not be written or the staging info
/// could not be serialized.
pub fn write_droplet(
    destination: &Path,
    build_dir: &Path,
    deps_dir: Option<&Path>,
    staging_info: &StagingInfo,
) -> Result<(), StageError> {
    let destination_file = File::create(destination)?;
    let mut tar_builder =
        tar::Builder::new(GzEncoder::new(destination_file, Compression::default()));
    tar_builder.follow_symlinks(false);

    tar_builder.append_dir_all("./app", build_dir)?;
    if let Some(deps_dir) = deps_dir {
        tar_builder.append_dir_all("./deps", deps_dir)?;
    }
    append_empty_dir(&mut tar_builder, "./tmp/")?;
    append_empty_dir(&mut tar_builder, "./logs/")?;
    append_regular(
        &mut tar_builder,
        "./staging_info.yml",
        &serde_json::to_vec(staging_info)?,
    )?;

    tar_builder.into_inner()?.finish()?.flush()?;

    Ok(())
}

fn append_empty_dir<W: Write>(tar_builder: &mut tar::Builder<W>, path: &str) -> io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Directory);
    header.set_path(path)?;
    header.set_mode(0o755);
    header.set_size(0);
    header.set_mtime(current_unix_time());
    header.set_cksum();

    tar_builder.append(&header, &[][..])
}

fn append_regular<W: Write>(
    tar_builder: &mut tar::Builder<W>,
    path: &str,
    contents: &[u8],
) -> io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_path(path)?;
    header.set_mode(0o644);
    header.set_size(contents.len() as u64);
    header.set_mtime(current_unix_time());
    header.set_cksum();

    tar_builder.append(&header, contents)
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(std::time::Duration::ZERO)
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    fn entries(droplet_path: &Path) -> Vec<(String, EntryType)> {
        let mut archive = tar::Archive::new(GzDecoder::new(File::open(droplet_path).unwrap()));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                (
                    entry
                        .path()
                        .unwrap()
                        .to_string_lossy()
                        .trim_end_matches('/')
                        .to_string(),
                    entry.header().entry_type(),
                )
            })
            .collect()
    }

    fn entry_contents(droplet_path: &Path, name: &str) -> String {
        let mut archive = tar::Archive::new(GzDecoder::new(File::open(droplet_path).unwrap()));
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.path().unwrap().to_string_lossy() == name {
                let mut contents = String::new();
                entry.read_to_string(&mut contents).unwrap();
                return contents;
            }
        }
        panic!("no entry named {name}");
    }

    #[test]
    fn droplet_contains_the_canonical_layout() {
        let build_dir = tempdir().unwrap();
        fs::write(build_dir.path().join("app.sh"), "#!/bin/sh\n").unwrap();

        let output_dir = tempdir().unwrap();
        let droplet_path = output_dir.path().join("droplet.tgz");
        write_droplet(
            &droplet_path,
            build_dir.path(),
            None,
            &StagingInfo {
                detected_buildpack: String::from("Test Buildpack"),
                start_command: String::from("./app.sh"),
            },
        )
        .unwrap();

        let entries = entries(&droplet_path);
        let names: Vec<_> = entries.iter().map(|(name, _)| name.as_str()).collect();

        assert!(names.contains(&"./app"));
        assert!(names.contains(&"./app/app.sh"));
        assert!(names.contains(&"./tmp"));
        assert!(names.contains(&"./logs"));
        assert!(names.contains(&"./staging_info.yml"));
        assert!(!names.iter().any(|name| name.starts_with("./deps")));

        for runtime_dir in ["./tmp", "./logs"] {
            let (_, entry_type) = entries
                .iter()
                .find(|(name, _)| name == runtime_dir)
                .unwrap();
            assert_eq!(*entry_type, EntryType::Directory);
            assert!(!names
                .iter()
                .any(|name| name.starts_with(runtime_dir) && *name != runtime_dir));
        }
    }

    #[test]
    fn staging_info_is_json() {
        let build_dir = tempdir().unwrap();

        let output_dir = tempdir().unwrap();
        let droplet_path = output_dir.path().join("droplet.tgz");
        write_droplet(
            &droplet_path,
            build_dir.path(),
            None,
            &StagingInfo {
                detected_buildpack: String::from("Always Matching"),
                start_command: String::from("the start command"),
            },
        )
        .unwrap();

        assert_eq!(
            entry_contents(&droplet_path, "./staging_info.yml"),
            r#"{"detected_buildpack":"Always Matching","start_command":"the start command"}"#
        );
    }

    #[test]
    fn deps_tree_is_included_when_present() {
        let build_dir = tempdir().unwrap();
        let deps_dir = tempdir().unwrap();
        fs::create_dir(deps_dir.path().join("0")).unwrap();
        fs::write(deps_dir.path().join("0").join("supplied"), "dependency").unwrap();

        let output_dir = tempdir().unwrap();
        let droplet_path = output_dir.path().join("droplet.tgz");
        write_droplet(
            &droplet_path,
            build_dir.path(),
            Some(deps_dir.path()),
            &StagingInfo {
                detected_buildpack: String::new(),
                start_command: String::new(),
            },
        )
        .unwrap();

        let names: Vec<_> = entries(&droplet_path)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert!(names.contains(&String::from("./deps/0/supplied")));
    }

    #[test]
    #[cfg(unix)]
    fn symlinks_are_preserved() {
        use std::os::unix::fs::symlink;

        let build_dir = tempdir().unwrap();
        fs::write(build_dir.path().join("target.txt"), "contents").unwrap();
        symlink("target.txt", build_dir.path().join("link")).unwrap();

        let output_dir = tempdir().unwrap();
        let droplet_path = output_dir.path().join("droplet.tgz");
        write_droplet(
            &droplet_path,
            build_dir.path(),
            None,
            &StagingInfo {
                detected_buildpack: String::new(),
                start_command: String::new(),
            },
        )
        .unwrap();

        let (_, entry_type) = entries(&droplet_path)
            .into_iter()
            .find(|(name, _)| name == "./app/link")
            .unwrap();
        assert_eq!(entry_type, EntryType::Symlink);
    }
}
