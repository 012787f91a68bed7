//! Archive extraction for downloaded packages.
//!
//! Extracts tar archives to a scratch directory with path traversal
//! protection to prevent zip-slip attacks. Entry paths and link targets
//! must stay relative to the destination, and every write goes through
//! [`tar::Entry::unpack_in`] so an entry cannot reach outside it through a
//! previously unpacked symlink. The compression layer is
//! detected from the archive's leading magic bytes, so uncompressed,
//! gzip, bzip2, xz, and zstd tarballs are all accepted.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Component, Path, PathBuf};

/// Number of leading bytes needed to recognise every supported format.
const MAGIC_LEN: u64 = 6;

/// Trait for extracting package archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use ezsetup::extraction::TarExtractor;
///
/// let extractor = TarExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the archive-relative paths of every unpacked entry. An
    /// archive without entries is not an error at this layer.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory.
    /// Returns [`ExtractionError::Io`] on I/O failures, including corrupt
    /// or unsupported archive data.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },
}

/// Compression layer wrapped around a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// A bare tar stream.
    Uncompressed,
    /// gzip (`.tar.gz`, `.tgz`).
    Gzip,
    /// bzip2 (`.tar.bz2`).
    Bzip2,
    /// xz (`.tar.xz`).
    Xz,
    /// Zstandard (`.tar.zst`).
    Zstd,
}

impl Compression {
    /// Identify the compression layer from the archive's leading bytes.
    ///
    /// Anything unrecognised is treated as an uncompressed tar stream and
    /// left for the tar reader to accept or reject.
    ///
    /// # Examples
    ///
    /// ```
    /// use ezsetup::extraction::Compression;
    ///
    /// assert_eq!(Compression::detect(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
    /// assert_eq!(Compression::detect(b"ustar"), Compression::Uncompressed);
    /// ```
    #[must_use]
    pub fn detect(header: &[u8]) -> Self {
        if header.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if header.starts_with(b"BZh") {
            Self::Bzip2
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Self::Xz
        } else if header.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Self::Zstd
        } else {
            Self::Uncompressed
        }
    }
}

/// Default extractor using the `tar` crate with transparent decompression.
///
/// Validates each entry path and link target before extraction to guard
/// against path traversal attacks (zip-slip).
#[derive(Debug, Clone, Copy, Default)]
pub struct TarExtractor;

impl ArchiveExtractor for TarExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let mut file = File::open(archive_path)?;
        let compression = sniff_compression(&mut file)?;
        log::debug!("extracting {compression:?} archive into {}", dest_dir.display());

        let reader = decoder_for(compression, file)?;
        unpack_entries(reader, dest_dir)
    }
}

/// Read the leading bytes of `file` and rewind it.
fn sniff_compression(file: &mut File) -> Result<Compression, ExtractionError> {
    let mut header = Vec::new();
    file.by_ref().take(MAGIC_LEN).read_to_end(&mut header)?;
    file.rewind()?;
    Ok(Compression::detect(&header))
}

/// Wrap `file` in the decoder for `compression`.
fn decoder_for(compression: Compression, file: File) -> Result<Box<dyn Read>, ExtractionError> {
    Ok(match compression {
        Compression::Uncompressed => Box::new(file),
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(file)),
        Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(file)),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new(file)),
        Compression::Zstd => Box::new(zstd::Decoder::new(file)?),
    })
}

/// Unpack every entry of a tar stream below `dest_dir`.
fn unpack_entries(reader: impl Read, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    std::fs::create_dir_all(dest_dir)?;
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;
        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            let target = entry.link_name()?.map(Cow::into_owned).unwrap_or_default();
            validate_link_target(&entry_path, &target)?;
        }

        if !entry.unpack_in(dest_dir)? {
            return Err(traversal(&entry_path));
        }
        log::trace!("unpacked {}", entry_path.display());
        extracted.push(entry_path);
    }

    Ok(extracted)
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if escapes(path) {
        return Err(traversal(path));
    }
    Ok(())
}

/// Symlink and hard link targets follow the same rule as entry paths.
fn validate_link_target(entry_path: &Path, target: &Path) -> Result<(), ExtractionError> {
    if escapes(target) {
        return Err(ExtractionError::PathTraversal {
            path: format!("{} -> {}", entry_path.display(), target.display()),
        });
    }
    Ok(())
}

fn escapes(path: &Path) -> bool {
    path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::RootDir))
}

fn traversal(path: &Path) -> ExtractionError {
    ExtractionError::PathTraversal {
        path: path.display().to_string(),
    }
}
