//! Archive transport.
//!
//! Provides a trait-based abstraction over retrieving the raw bytes behind a
//! descriptor URL, enabling dependency injection for testing. The production
//! implementation performs a single unauthenticated HTTP(S) GET with the
//! transport's default redirect and timeout behaviour, and reads `file://`
//! URLs straight from the local filesystem.

use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

/// Scheme prefix for local filesystem URLs.
const FILE_SCHEME: &str = "file://";

/// Trait for fetching the raw bytes behind a URL.
///
/// # Examples
///
/// ```
/// use ezsetup::download::UrlFetcher;
///
/// let fetcher = UrlFetcher;
/// // Use fetcher.fetch("https://example.org/pkg.tar.gz") in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ResourceFetcher {
    /// Download the full body at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the resource is missing, or
    /// the body cannot be read.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Errors arising from fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource does not exist (HTTP 404 or missing file).
    #[error("resource not found: {url}")]
    NotFound {
        /// The URL that could not be found.
        url: String,
    },

    /// I/O error while reading the body or a local file.
    #[error("I/O error reading {url}: {source}")]
    Io {
        /// The URL being read.
        url: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Fetcher for `http://`, `https://`, and `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlFetcher;

impl ResourceFetcher for UrlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match url.strip_prefix(FILE_SCHEME) {
            Some(path) => read_local(url, Path::new(path)),
            None => download_bytes(url),
        }
    }
}

/// Read a `file://` URL from disk.
fn read_local(url: &str, path: &Path) -> Result<Vec<u8>, FetchError> {
    log::debug!("reading local resource {}", path.display());
    std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FetchError::NotFound {
                url: url.to_owned(),
            }
        } else {
            FetchError::Io {
                url: url.to_owned(),
                source,
            }
        }
    })
}

/// Download a URL and return the body.
fn download_bytes(url: &str) -> Result<Vec<u8>, FetchError> {
    log::debug!("GET {url}");
    let response = http_agent()
        .get(url)
        .call()
        .map_err(|e| map_ureq_error(url, &e))?;
    let mut body = response.into_body();
    let mut bytes = Vec::new();
    body.as_reader()
        .read_to_end(&mut bytes)
        .map_err(|source| FetchError::Io {
            url: url.to_owned(),
            source,
        })?;
    log::trace!("received {} bytes from {url}", bytes.len());
    Ok(bytes)
}

/// Shared `ureq` agent using the transport's default configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| ureq::Agent::new_with_config(ureq::Agent::config_builder().build()))
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
