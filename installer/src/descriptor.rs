//! Package descriptor parsing.
//!
//! A descriptor is the `algorithm=digest=url` string that identifies a
//! fetchable, verifiable package. Only the first two `=` separators are
//! significant, so the URL may itself contain `=` characters.

use crate::error::{InstallerError, Result};
use std::fmt;
use std::str::FromStr;

/// The separator between descriptor fields.
const SEPARATOR: char = '=';

/// Number of fields a descriptor must split into.
const FIELD_COUNT: usize = 3;

/// Checksum algorithm named by a descriptor.
///
/// Unknown tokens are kept rather than rejected at parse time: the
/// installer downloads first and verifies afterwards, so an unsupported
/// algorithm surfaces as a verification failure.
///
/// # Examples
///
/// ```
/// use ezsetup::descriptor::Algorithm;
///
/// assert_eq!(Algorithm::from("sha256"), Algorithm::Sha256);
/// assert_eq!(Algorithm::from("none"), Algorithm::None);
/// assert_eq!(
///     Algorithm::from("md5"),
///     Algorithm::Unsupported("md5".to_owned())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// No verification. Disables integrity protection entirely.
    None,
    /// Lowercase hex-encoded SHA-256.
    Sha256,
    /// Any other token, retained verbatim for diagnostics.
    Unsupported(String),
}

impl Algorithm {
    /// Return the token as it appears in a descriptor.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Sha256 => "sha256",
            Self::Unsupported(token) => token,
        }
    }
}

impl From<&str> for Algorithm {
    fn from(token: &str) -> Self {
        match token {
            "none" => Self::None,
            "sha256" => Self::Sha256,
            other => Self::Unsupported(other.to_owned()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `algorithm=digest=url` descriptor.
///
/// # Examples
///
/// ```
/// use ezsetup::descriptor::{Algorithm, ResourceDescriptor};
///
/// let descriptor: ResourceDescriptor = "none==http://test/pkg.tar.gz".parse()?;
/// assert_eq!(descriptor.algorithm(), &Algorithm::None);
/// assert_eq!(descriptor.digest(), "");
/// assert_eq!(descriptor.url(), "http://test/pkg.tar.gz");
/// # Ok::<(), ezsetup::error::InstallerError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    algorithm: Algorithm,
    digest: String,
    url: String,
}

impl ResourceDescriptor {
    /// Parse a descriptor string.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::MalformedDescriptor`] unless the input
    /// splits into exactly three `=`-separated fields.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut fields = descriptor.splitn(FIELD_COUNT, SEPARATOR);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(algorithm), Some(digest), Some(url)) => Ok(Self {
                algorithm: Algorithm::from(algorithm),
                digest: digest.to_owned(),
                url: url.to_owned(),
            }),
            _ => Err(InstallerError::MalformedDescriptor {
                descriptor: descriptor.to_owned(),
            }),
        }
    }

    /// The checksum algorithm.
    #[must_use]
    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// The expected digest. Ignored when the algorithm is [`Algorithm::None`].
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The location to download the archive from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FromStr for ResourceDescriptor {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.algorithm, self.digest, self.url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_sha256_descriptor() {
        let digest = "a".repeat(64);
        let raw = format!("sha256={digest}=https://example.org/pkg.tar.gz");
        let descriptor = ResourceDescriptor::parse(&raw).expect("valid descriptor");
        assert_eq!(descriptor.algorithm(), &Algorithm::Sha256);
        assert_eq!(descriptor.digest(), digest);
        assert_eq!(descriptor.url(), "https://example.org/pkg.tar.gz");
    }

    #[test]
    fn preserves_equals_signs_in_url() {
        let raw = "none==https://example.org/dl?file=pkg.tar.gz&sig=a==";
        let descriptor = ResourceDescriptor::parse(raw).expect("valid descriptor");
        assert_eq!(
            descriptor.url(),
            "https://example.org/dl?file=pkg.tar.gz&sig=a=="
        );
    }

    #[test]
    fn keeps_unknown_algorithm_tokens() {
        let descriptor = ResourceDescriptor::parse("md5=abc=http://test/pkg.tar.gz")
            .expect("parsing defers algorithm checks");
        assert_eq!(
            descriptor.algorithm(),
            &Algorithm::Unsupported("md5".to_owned())
        );
    }

    #[rstest]
    #[case::no_separator("http://test/pkg.tar.gz")]
    #[case::one_separator("none=http://test/pkg.tar.gz")]
    #[case::empty("")]
    fn rejects_too_few_fields(#[case] raw: &str) {
        let result = ResourceDescriptor::parse(raw);
        assert!(
            matches!(result, Err(InstallerError::MalformedDescriptor { .. })),
            "expected MalformedDescriptor for {raw:?}"
        );
    }

    #[test]
    fn display_reconstructs_input() {
        let raw = "none==http://test/pkg.tar.gz?a=b";
        let descriptor: ResourceDescriptor = raw.parse().expect("valid descriptor");
        assert_eq!(descriptor.to_string(), raw);
    }

    #[test]
    fn algorithm_tokens_are_case_sensitive() {
        assert_eq!(
            Algorithm::from("SHA256"),
            Algorithm::Unsupported("SHA256".to_owned())
        );
    }
}
