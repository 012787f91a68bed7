//! Package lifecycle orchestration.
//!
//! A [`Package`] is a parsed descriptor waiting to be fetched. Fetching
//! downloads and verifies the archive, stages it in a temporary file,
//! extracts it into a private scratch directory, and resolves the source
//! root, yielding a [`FetchedPackage`]. Installing or uninstalling consumes
//! the fetched package, so each transition happens at most once per value.
//!
//! Scratch storage is owned by RAII guards from `tempfile`. It is removed
//! when the owning value is dropped, including on every early error return.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};

use crate::descriptor::{Algorithm, ResourceDescriptor};
use crate::download::ResourceFetcher;
use crate::error::Result;
use crate::extraction::ArchiveExtractor;
use crate::layout::resolve_source_root;
use crate::output::{progress, success_message, unverified_warning, write_stderr_line};
use crate::resource::fetch_verified;
use crate::script::{LifecycleScript, ScriptInvocation, ScriptRunner};

/// Prefix for scratch directories and staged archives.
const SCRATCH_PREFIX: &str = "ezsetup-";

/// Per-invocation settings for a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageOptions {
    /// Directory in which scratch storage is created. `None` uses the
    /// platform temporary directory.
    pub scratch_parent: Option<PathBuf>,
    /// When true, suppress progress output.
    pub quiet: bool,
}

/// A package that has not been fetched yet.
#[derive(Debug)]
pub struct Package {
    descriptor: ResourceDescriptor,
    options: PackageOptions,
}

impl Package {
    /// Parse `descriptor` into a package ready to fetch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::InstallerError::MalformedDescriptor`] if the
    /// descriptor does not split into `algorithm=digest=url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ezsetup::package::{Package, PackageOptions};
    ///
    /// let package = Package::new("none==http://test/pkg.tar.gz", PackageOptions::default())?;
    /// assert_eq!(package.descriptor().url(), "http://test/pkg.tar.gz");
    /// assert!(Package::new("not-a-descriptor", PackageOptions::default()).is_err());
    /// # Ok::<(), ezsetup::error::InstallerError>(())
    /// ```
    pub fn new(descriptor: &str, options: PackageOptions) -> Result<Self> {
        Ok(Self {
            descriptor: ResourceDescriptor::parse(descriptor)?,
            options,
        })
    }

    /// The parsed descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Fetch, verify, and extract with the given collaborators.
    ///
    /// Verification always completes before extraction starts; nothing is
    /// extracted from unverified data.
    ///
    /// # Errors
    ///
    /// Returns a fetch or verification error from the resource locator,
    /// an extraction error, [`crate::error::InstallerError::EmptyArchive`],
    /// or [`crate::error::InstallerError::InvalidPackageLayout`].
    pub fn fetch_with(
        self,
        fetcher: &dyn ResourceFetcher,
        extractor: &dyn ArchiveExtractor,
        stderr: &mut dyn Write,
    ) -> Result<FetchedPackage> {
        let Self {
            descriptor,
            options,
        } = self;
        let scratch = scratch_dir(&options)?;
        log::debug!("scratch directory: {}", scratch.path().display());

        if *descriptor.algorithm() == Algorithm::None {
            write_stderr_line(stderr, unverified_warning(descriptor.url()));
        }
        progress(
            stderr,
            options.quiet,
            format!("Fetching {}...", descriptor.url()),
        );
        let data = fetch_verified(&descriptor, fetcher)?;

        let staged = stage_archive(&data, &options)?;
        drop(data);

        progress(stderr, options.quiet, "Extracting package...");
        let entries = extractor.extract(staged.path(), scratch.path())?;
        log::debug!("extracted {} entries", entries.len());
        drop(staged);

        let source_root = resolve_source_root(scratch.path())?;
        Ok(FetchedPackage {
            scratch,
            source_root,
            quiet: options.quiet,
        })
    }
}

/// A verified, extracted package whose lifecycle scripts are ready to run.
#[derive(Debug)]
pub struct FetchedPackage {
    scratch: TempDir,
    source_root: PathBuf,
    quiet: bool,
}

impl FetchedPackage {
    /// The directory that directly contains both lifecycle scripts.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// The scratch directory the archive was extracted into.
    #[must_use]
    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Run `install.sh` with an injected runner.
    ///
    /// # Errors
    ///
    /// Returns the runner's error when the script cannot be launched or
    /// exits unsuccessfully.
    pub fn install_with(self, runner: &dyn ScriptRunner, stderr: &mut dyn Write) -> Result<()> {
        self.run(LifecycleScript::Install, runner, stderr)
    }

    /// Run `uninstall.sh` with an injected runner.
    ///
    /// # Errors
    ///
    /// Returns the runner's error when the script cannot be launched or
    /// exits unsuccessfully.
    pub fn uninstall_with(self, runner: &dyn ScriptRunner, stderr: &mut dyn Write) -> Result<()> {
        self.run(LifecycleScript::Uninstall, runner, stderr)
    }

    /// Run `script` in the source root, then remove scratch storage.
    fn run(
        self,
        script: LifecycleScript,
        runner: &dyn ScriptRunner,
        stderr: &mut dyn Write,
    ) -> Result<()> {
        let Self {
            scratch,
            source_root,
            quiet,
        } = self;
        let invocation =
            ScriptInvocation::with_current_env(source_root.join(script.file_name()), source_root);

        progress(
            stderr,
            quiet,
            format!(
                "Running {} in {}...",
                script.file_name(),
                invocation.working_dir().display()
            ),
        );
        let outcome = runner.exec(&invocation);

        if let Err(err) = scratch.close() {
            log::warn!("failed to remove scratch directory: {err}");
        }

        if outcome.is_ok() {
            progress(stderr, quiet, success_message(script.file_name()));
        }
        outcome
    }
}

/// Create a fresh, empty scratch directory.
fn scratch_dir(options: &PackageOptions) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let dir = match &options.scratch_parent {
        Some(parent) => builder.tempdir_in(parent)?,
        None => builder.tempdir()?,
    };
    Ok(dir)
}

/// Write the verified archive bytes to a temporary file for extraction.
fn stage_archive(data: &[u8], options: &PackageOptions) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX).suffix(".archive");
    let mut staged = match &options.scratch_parent {
        Some(parent) => builder.tempfile_in(parent)?,
        None => builder.tempfile()?,
    };
    staged.write_all(data)?;
    staged.flush()?;
    Ok(staged)
}

#[cfg(test)]
#[path = "package_tests.rs"]
mod tests;
