//! Source-root resolution for extracted packages.
//!
//! A package is valid when its lifecycle scripts sit either at the archive
//! root or directly inside one top-level directory. Nothing deeper is
//! searched.

use crate::error::{InstallerError, Result};
use crate::script::{INSTALL_SCRIPT, LifecycleScript, UNINSTALL_SCRIPT};
use std::path::{Path, PathBuf};

/// Locate the directory holding both lifecycle scripts below `scratch_root`.
///
/// The root itself wins when it holds both scripts. Otherwise immediate
/// subdirectories are scanned in file-name order and the first one holding
/// both scripts is returned.
///
/// The scan is sorted so the chosen directory does not depend on the order
/// in which the filesystem lists entries.
///
/// # Errors
///
/// Returns [`InstallerError::EmptyArchive`] when `scratch_root` has no
/// entries, [`InstallerError::InvalidPackageLayout`] when no candidate holds
/// both scripts, or [`InstallerError::Io`] if the directory cannot be listed.
pub fn resolve_source_root(scratch_root: &Path) -> Result<PathBuf> {
    let entries = sorted_entries(scratch_root)?;
    if entries.is_empty() {
        return Err(InstallerError::EmptyArchive);
    }

    if contains_lifecycle_scripts(scratch_root) {
        log::debug!("package scripts found at archive root");
        return Ok(scratch_root.to_owned());
    }

    entries
        .into_iter()
        .filter(|entry| entry.is_dir())
        .find(|dir| contains_lifecycle_scripts(dir))
        .inspect(|dir| log::debug!("package scripts found in {}", dir.display()))
        .ok_or_else(|| InstallerError::InvalidPackageLayout {
            root: scratch_root.to_owned(),
            install: INSTALL_SCRIPT,
            uninstall: UNINSTALL_SCRIPT,
        })
}

/// Return `true` when `dir` directly holds every lifecycle script as a file.
fn contains_lifecycle_scripts(dir: &Path) -> bool {
    LifecycleScript::ALL
        .iter()
        .all(|script| dir.join(script.file_name()).is_file())
}

/// List the immediate entries of `dir`, sorted by file name.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn scratch() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, b"#!/bin/sh\n").expect("write file");
    }

    #[rstest]
    fn flat_layout_resolves_to_root(scratch: TempDir) {
        touch(scratch.path(), "install.sh");
        touch(scratch.path(), "uninstall.sh");
        let root = resolve_source_root(scratch.path()).expect("resolves");
        assert_eq!(root, scratch.path());
    }

    #[rstest]
    fn nested_layout_resolves_to_subdirectory(scratch: TempDir) {
        touch(scratch.path(), "pkg-1.0/install.sh");
        touch(scratch.path(), "pkg-1.0/uninstall.sh");
        let root = resolve_source_root(scratch.path()).expect("resolves");
        assert_eq!(root, scratch.path().join("pkg-1.0"));
    }

    #[rstest]
    fn first_matching_subdirectory_wins(scratch: TempDir) {
        touch(scratch.path(), "a-incomplete/install.sh");
        touch(scratch.path(), "b-pkg/install.sh");
        touch(scratch.path(), "b-pkg/uninstall.sh");
        touch(scratch.path(), "c-pkg/install.sh");
        touch(scratch.path(), "c-pkg/uninstall.sh");
        let root = resolve_source_root(scratch.path()).expect("resolves");
        assert_eq!(root, scratch.path().join("b-pkg"));
    }

    #[rstest]
    fn root_takes_precedence_over_subdirectories(scratch: TempDir) {
        touch(scratch.path(), "install.sh");
        touch(scratch.path(), "uninstall.sh");
        touch(scratch.path(), "nested/install.sh");
        touch(scratch.path(), "nested/uninstall.sh");
        let root = resolve_source_root(scratch.path()).expect("resolves");
        assert_eq!(root, scratch.path());
    }

    #[rstest]
    #[case::two_levels_deep(&["outer/inner/install.sh", "outer/inner/uninstall.sh"])]
    #[case::missing_uninstall(&["install.sh", "pkg/install.sh"])]
    #[case::split_across_levels(&["install.sh", "pkg/uninstall.sh"])]
    #[case::unrelated_files(&["README", "pkg/Makefile"])]
    fn invalid_layouts_are_rejected(scratch: TempDir, #[case] files: &[&str]) {
        for file in files {
            touch(scratch.path(), file);
        }
        let result = resolve_source_root(scratch.path());
        assert!(
            matches!(result, Err(InstallerError::InvalidPackageLayout { .. })),
            "expected InvalidPackageLayout for {files:?}, got {result:?}"
        );
    }

    #[rstest]
    fn directories_named_like_scripts_do_not_count(scratch: TempDir) {
        std::fs::create_dir_all(scratch.path().join("install.sh")).expect("mkdir");
        touch(scratch.path(), "uninstall.sh");
        let result = resolve_source_root(scratch.path());
        assert!(matches!(
            result,
            Err(InstallerError::InvalidPackageLayout { .. })
        ));
    }

    #[rstest]
    fn empty_scratch_is_empty_archive(scratch: TempDir) {
        let result = resolve_source_root(scratch.path());
        assert!(matches!(result, Err(InstallerError::EmptyArchive)));
    }
}
