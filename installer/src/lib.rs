//! ezsetup installer library.
//!
//! This crate fetches a packaged tar archive named by an
//! `algorithm=digest=url` descriptor, verifies it, extracts it into scratch
//! storage, and runs the package's `install.sh` or `uninstall.sh`. It is used
//! by the `ezsetup` CLI binary and can be driven programmatically with
//! injected collaborators for testing.
//!
//! # Modules
//!
//! - [`app`] - Command dispatch and exit-code policy
//! - [`checksum`] - Digest computation and verification
//! - [`cli`] - Command-line argument definitions
//! - [`descriptor`] - Parsing of `algorithm=digest=url` descriptors
//! - [`download`] - HTTP and `file://` transport
//! - [`error`] - Error types and exit-code mapping
//! - [`extraction`] - Tar extraction with compression detection
//! - [`layout`] - Source-root resolution inside an extracted package
//! - [`logging`] - `env_logger` setup driven by CLI flags
//! - [`output`] - Operator-facing progress and warning lines
//! - [`package`] - Package lifecycle from descriptor to script run
//! - [`resource`] - Fetch-then-verify resource location
//! - [`script`] - Lifecycle script execution through the host shell

pub mod app;
pub mod checksum;
pub mod cli;
pub mod descriptor;
pub mod download;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod logging;
pub mod output;
pub mod package;
pub mod resource;
pub mod script;
#[cfg(unix)]
mod signal;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
