//! Error types for the ezsetup installer.
//!
//! Every failure is terminal for the invocation: nothing is retried or
//! recovered locally. Each variant renders as a human-readable message and
//! maps to a non-zero process exit code via [`InstallerError::exit_code`].

use crate::download::FetchError;
use crate::extraction::ExtractionError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code used for every failure that carries no more specific code.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Exit code used for command-line usage errors.
pub const USAGE_EXIT_CODE: i32 = 2;

/// Errors that can occur while fetching, verifying, extracting, or running a
/// package.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The package descriptor did not split into `algorithm=digest=url`.
    #[error("invalid resource location: {descriptor} (expected algorithm=digest=url)")]
    MalformedDescriptor {
        /// The rejected descriptor string.
        descriptor: String,
    },

    /// The descriptor named a checksum algorithm this installer cannot verify.
    #[error("unexpected verifier algorithm (got {algorithm}); expected one of: none, sha256")]
    UnsupportedAlgorithm {
        /// The unrecognised algorithm token.
        algorithm: String,
    },

    /// The network or filesystem transport failed to deliver the archive.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The downloaded bytes do not hash to the expected digest.
    #[error("unexpected checksum (expected {expected}; got {actual})")]
    ChecksumMismatch {
        /// The digest recorded in the descriptor.
        expected: String,
        /// The digest computed from the downloaded bytes.
        actual: String,
    },

    /// The archive could not be unpacked.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The archive unpacked to nothing.
    #[error("packaged archive has no contents")]
    EmptyArchive,

    /// Neither the archive root nor any top-level directory holds both
    /// lifecycle scripts.
    #[error(
        "failed to locate package scripts ({install} and {uninstall}) in {}",
        .root.display()
    )]
    InvalidPackageLayout {
        /// The scratch directory that was searched.
        root: PathBuf,
        /// The install script name that was looked for.
        install: &'static str,
        /// The uninstall script name that was looked for.
        uninstall: &'static str,
    },

    /// The shell could not be started for a lifecycle script.
    #[error("failed to launch {}", .script.display())]
    ScriptLaunch {
        /// Path to the script that could not be launched.
        script: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// A lifecycle script ran and reported failure.
    #[error("{} failed with {}", .script.display(), describe_exit(.code))]
    ScriptExecution {
        /// Path to the script that failed.
        script: PathBuf,
        /// The script's exit code, or `None` when it was killed by a signal.
        code: Option<i32>,
    },

    /// The command line could not be understood.
    #[error("{message}")]
    Usage {
        /// The rendered usage diagnostic.
        message: String,
    },

    /// An I/O operation on scratch storage failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallerError {
    /// Returns the process exit code this error should produce.
    ///
    /// Script failures propagate the script's own exit code so that callers
    /// can distinguish between failure modes of the packaged scripts. Every
    /// other error maps to a fixed non-zero code.
    ///
    /// # Examples
    ///
    /// ```
    /// use ezsetup::error::InstallerError;
    /// use std::path::PathBuf;
    ///
    /// let err = InstallerError::ScriptExecution {
    ///     script: PathBuf::from("uninstall.sh"),
    ///     code: Some(3),
    /// };
    /// assert_eq!(err.exit_code(), 3);
    /// assert_eq!(InstallerError::EmptyArchive.exit_code(), 1);
    /// ```
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ScriptExecution {
                code: Some(code), ..
            } if *code != 0 => *code,
            Self::Usage { .. } => USAGE_EXIT_CODE,
            _ => FAILURE_EXIT_CODE,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "termination by signal".to_owned(),
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
