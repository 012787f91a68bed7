//! Checksum verification for downloaded archives.
//!
//! Verification is a pure function over the bytes and the descriptor's
//! algorithm and digest. The `none` algorithm is an intentionally insecure
//! escape hatch and always succeeds.

use crate::descriptor::Algorithm;
use crate::error::{InstallerError, Result};
use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 digest of `data`.
///
/// # Examples
///
/// ```
/// use ezsetup::checksum::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Verify `data` against `expected` using `algorithm`.
///
/// The comparison is exact and case-sensitive: an uppercase digest never
/// matches.
///
/// # Errors
///
/// Returns [`InstallerError::ChecksumMismatch`] with both digests when the
/// computed SHA-256 differs from `expected`, or
/// [`InstallerError::UnsupportedAlgorithm`] for any token other than
/// `none` or `sha256`.
///
/// # Examples
///
/// ```
/// use ezsetup::checksum::{sha256_hex, verify};
/// use ezsetup::descriptor::Algorithm;
///
/// let data = b"payload";
/// assert!(verify(data, &Algorithm::Sha256, &sha256_hex(data)).is_ok());
/// assert!(verify(data, &Algorithm::Sha256, "0").is_err());
/// assert!(verify(data, &Algorithm::None, "ignored").is_ok());
/// ```
pub fn verify(data: &[u8], algorithm: &Algorithm, expected: &str) -> Result<()> {
    match algorithm {
        Algorithm::None => Ok(()),
        Algorithm::Sha256 => {
            let actual = sha256_hex(data);
            if actual == expected {
                Ok(())
            } else {
                Err(InstallerError::ChecksumMismatch {
                    expected: expected.to_owned(),
                    actual,
                })
            }
        }
        Algorithm::Unsupported(token) => Err(InstallerError::UnsupportedAlgorithm {
            algorithm: token.clone(),
        }),
    }
}
