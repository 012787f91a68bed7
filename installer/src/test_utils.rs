//! Shared test utilities for the installer crate.

use crate::download::{FetchError, ResourceFetcher};
use crate::error::{InstallerError, Result};
use crate::extraction::{ArchiveExtractor, ExtractionError, TarExtractor};
use crate::script::{ScriptInvocation, ScriptRunner};
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::path::{Path, PathBuf};

pub use crate::checksum::sha256_hex;

/// Container format produced by [`TarballBuilder::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Uncompressed tar.
    Tar,
    /// gzip-compressed tar.
    TarGz,
    /// bzip2-compressed tar.
    TarBz2,
    /// xz-compressed tar.
    TarXz,
    /// Zstandard-compressed tar.
    TarZst,
}

#[derive(Debug, Clone)]
enum Entry {
    File {
        path: String,
        contents: Vec<u8>,
        mode: u32,
    },
    Dir {
        path: String,
    },
    Link {
        path: String,
        target: String,
        kind: tar::EntryType,
    },
}

/// Builds in-memory tarballs for tests.
///
/// # Examples
///
/// ```
/// use ezsetup::test_utils::{ArchiveFormat, TarballBuilder};
///
/// let bytes = TarballBuilder::new()
///     .script("install.sh", "#!/bin/sh\nexit 0\n")
///     .script("uninstall.sh", "#!/bin/sh\nexit 0\n")
///     .build(ArchiveFormat::TarGz);
/// assert!(!bytes.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TarballBuilder {
    entries: Vec<Entry>,
}

impl TarballBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular, non-executable file.
    #[must_use]
    pub fn file(mut self, path: &str, contents: &[u8]) -> Self {
        self.entries.push(Entry::File {
            path: path.to_owned(),
            contents: contents.to_vec(),
            mode: 0o644,
        });
        self
    }

    /// Add an executable script.
    #[must_use]
    pub fn script(mut self, path: &str, body: &str) -> Self {
        self.entries.push(Entry::File {
            path: path.to_owned(),
            contents: body.as_bytes().to_vec(),
            mode: 0o755,
        });
        self
    }

    /// Add a directory entry.
    #[must_use]
    pub fn dir(mut self, path: &str) -> Self {
        self.entries.push(Entry::Dir {
            path: path.to_owned(),
        });
        self
    }

    /// Add a symbolic link at `path` pointing to `target`.
    #[must_use]
    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        self.entries.push(Entry::Link {
            path: path.to_owned(),
            target: target.to_owned(),
            kind: tar::EntryType::Symlink,
        });
        self
    }

    /// Add a hard link at `path` to `target`.
    #[must_use]
    pub fn hard_link(mut self, path: &str, target: &str) -> Self {
        self.entries.push(Entry::Link {
            path: path.to_owned(),
            target: target.to_owned(),
            kind: tar::EntryType::Link,
        });
        self
    }

    /// Add `install.sh` and `uninstall.sh` under `prefix` exiting with the
    /// given codes. An empty prefix places them at the archive root.
    #[must_use]
    pub fn lifecycle_scripts(self, prefix: &str, install_code: i32, uninstall_code: i32) -> Self {
        let join = |name: &str| {
            if prefix.is_empty() {
                name.to_owned()
            } else {
                format!("{}/{name}", prefix.trim_end_matches('/'))
            }
        };
        self.script(&join("install.sh"), &exit_script(install_code))
            .script(&join("uninstall.sh"), &exit_script(uninstall_code))
    }

    /// Serialise the archive in `format`.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory archive cannot be written.
    #[must_use]
    pub fn build(&self, format: ArchiveFormat) -> Vec<u8> {
        match format {
            ArchiveFormat::Tar => self.write_tar(Vec::new()),
            ArchiveFormat::TarGz => {
                let encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                self.write_tar(encoder).finish().expect("gzip finish")
            }
            ArchiveFormat::TarBz2 => {
                let encoder =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                self.write_tar(encoder).finish().expect("bzip2 finish")
            }
            ArchiveFormat::TarXz => {
                let encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
                self.write_tar(encoder).finish().expect("xz finish")
            }
            ArchiveFormat::TarZst => {
                let encoder = zstd::Encoder::new(Vec::new(), 0).expect("zstd encoder");
                self.write_tar(encoder).finish().expect("zstd finish")
            }
        }
    }

    fn write_tar<W: Write>(&self, writer: W) -> W {
        let mut builder = tar::Builder::new(writer);
        for entry in &self.entries {
            let mut header = tar::Header::new_gnu();
            match entry {
                Entry::File {
                    path,
                    contents,
                    mode,
                } => {
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_size(contents.len() as u64);
                    header.set_mode(*mode);
                    builder
                        .append_data(&mut header, path, contents.as_slice())
                        .expect("append file");
                }
                Entry::Dir { path } => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    builder
                        .append_data(&mut header, path, std::io::empty())
                        .expect("append dir");
                }
                Entry::Link { path, target, kind } => {
                    header.set_entry_type(*kind);
                    header.set_size(0);
                    header.set_mode(0o777);
                    builder
                        .append_link(&mut header, path, target)
                        .expect("append link");
                }
            }
        }
        builder.into_inner().expect("tar finish")
    }
}

/// A shell script body that exits with `code`.
#[must_use]
pub fn exit_script(code: i32) -> String {
    format!("#!/bin/sh\nexit {code}\n")
}

/// A fetcher that serves the same bytes for every URL and records requests.
#[derive(Debug)]
pub struct StubFetcher {
    body: Option<Vec<u8>>,
    requested: RefCell<Vec<String>>,
}

impl StubFetcher {
    /// Serve `body` for every request.
    #[must_use]
    pub fn serving(body: Vec<u8>) -> Self {
        Self {
            body: Some(body),
            requested: RefCell::new(Vec::new()),
        }
    }

    /// Fail every request with a network error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            body: None,
            requested: RefCell::new(Vec::new()),
        }
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl ResourceFetcher for StubFetcher {
    fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        self.requested.borrow_mut().push(url.to_owned());
        self.body.clone().ok_or_else(|| FetchError::Http {
            url: url.to_owned(),
            reason: "connection refused".to_owned(),
        })
    }
}

/// An extractor that delegates to [`TarExtractor`] and counts calls.
#[derive(Debug, Default)]
pub struct CountingExtractor {
    calls: Cell<usize>,
}

impl CountingExtractor {
    /// Number of extraction attempts so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ArchiveExtractor for CountingExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> std::result::Result<Vec<PathBuf>, ExtractionError> {
        self.calls.set(self.calls.get() + 1);
        TarExtractor.extract(archive_path, dest_dir)
    }
}

/// A runner that records invocations and reports a fixed exit code.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    exit_code: i32,
    invocations: RefCell<Vec<ScriptInvocation>>,
}

impl RecordingRunner {
    /// Report `exit_code` for every invocation; zero means success.
    #[must_use]
    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            invocations: RefCell::new(Vec::new()),
        }
    }

    /// Invocations received so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<ScriptInvocation> {
        self.invocations.borrow().clone()
    }
}

impl ScriptRunner for RecordingRunner {
    fn exec(&self, invocation: &ScriptInvocation) -> Result<()> {
        // Scripts must exist in the scratch tree at the time they are run.
        assert!(
            invocation.script().is_file(),
            "script missing: {}",
            invocation.script().display()
        );
        self.invocations.borrow_mut().push(invocation.clone());
        if self.exit_code == 0 {
            Ok(())
        } else {
            Err(InstallerError::ScriptExecution {
                script: invocation.script().to_owned(),
                code: Some(self.exit_code),
            })
        }
    }
}
