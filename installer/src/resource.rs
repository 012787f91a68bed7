//! Resource location: fetch the bytes behind a descriptor and verify them.
//!
//! Verification always follows a complete download. When verification fails
//! the fetched bytes are dropped before the error propagates, so unverified
//! data never reaches the caller.

use crate::checksum::verify;
use crate::descriptor::ResourceDescriptor;
use crate::download::ResourceFetcher;
use crate::error::Result;

/// Fetch and verify the archive named by `descriptor`.
///
/// # Errors
///
/// Returns [`crate::error::InstallerError::Fetch`] if the transport fails,
/// or a verification error from [`crate::checksum::verify`].
pub fn fetch_verified(
    descriptor: &ResourceDescriptor,
    fetcher: &dyn ResourceFetcher,
) -> Result<Vec<u8>> {
    let data = fetcher.fetch(descriptor.url())?;
    log::debug!(
        "fetched {} bytes from {}; verifying with {}",
        data.len(),
        descriptor.url(),
        descriptor.algorithm()
    );
    verify(&data, descriptor.algorithm(), descriptor.digest())?;
    Ok(data)
}
