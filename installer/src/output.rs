//! Operator-facing output helpers.
//!
//! Progress lines go to stderr so stdout stays free for the lifecycle
//! scripts, which inherit the process's standard streams.

use std::io::Write;

/// Write a single line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Write a progress line unless `quiet` is set.
pub fn progress(stderr: &mut dyn Write, quiet: bool, message: impl std::fmt::Display) {
    if !quiet {
        write_stderr_line(stderr, message);
    }
}

/// Format the warning printed when a descriptor disables verification.
///
/// # Example
///
/// ```
/// use ezsetup::output::unverified_warning;
///
/// let text = unverified_warning("http://test/pkg.tar.gz");
/// assert!(text.contains("integrity"));
/// assert!(text.contains("http://test/pkg.tar.gz"));
/// ```
#[must_use]
pub fn unverified_warning(url: &str) -> String {
    format!(
        "warning: checksum algorithm `none` disables integrity protection; {url} will not be verified"
    )
}

/// Format the message reported after a lifecycle script succeeds.
#[must_use]
pub fn success_message(script: &str) -> String {
    format!("{script} completed successfully")
}
