//! Command dispatch and exit-code policy.
//!
//! [`run_cli`] is the whole program minus process concerns: it parses
//! arguments, drives a [`Package`] through its lifecycle, reports the outcome
//! on the supplied streams, and returns the exit code. The binary passes the
//! production collaborators; tests pass doubles.

use crate::cli::{Cli, Command};
use crate::download::{ResourceFetcher, UrlFetcher};
use crate::error::{InstallerError, Result, USAGE_EXIT_CODE};
use crate::extraction::{ArchiveExtractor, TarExtractor};
use crate::logging;
use crate::output::write_stderr_line;
use crate::package::{Package, PackageOptions};
use crate::script::{LifecycleScript, ScriptRunner, ShellScriptRunner};
use clap::Parser;
use std::ffi::OsString;
use std::io::Write;

/// The effectful services a run depends on.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Retrieves archive bytes.
    pub fetcher: &'a dyn ResourceFetcher,
    /// Unpacks archives into scratch storage.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Runs lifecycle scripts.
    pub runner: &'a dyn ScriptRunner,
}

impl Collaborators<'static> {
    /// Network, filesystem, and shell implementations used by the binary.
    #[must_use]
    pub fn system() -> Self {
        Self {
            fetcher: &UrlFetcher,
            extractor: &TarExtractor,
            runner: &ShellScriptRunner,
        }
    }
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Parse `args`, run the requested command, and return the exit code.
///
/// Help and version requests print to `stdout` and return 0. Usage errors
/// print to `stderr` and return 2. Failures print `error: <message>` to
/// `stderr` and return [`InstallerError::exit_code`].
pub fn run_cli<I, T>(
    args: I,
    collaborators: &Collaborators<'_>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => return exit_code_for_parse_error(&err, stdout, stderr),
    };
    logging::init(&cli.global);
    let result = execute(&cli, collaborators, stderr);
    exit_code_for_run_result(result, stderr)
}

/// Run a parsed command line to completion.
///
/// # Errors
///
/// Returns the first error raised while fetching, verifying, extracting, or
/// running the package.
pub fn execute(cli: &Cli, collaborators: &Collaborators<'_>, stderr: &mut dyn Write) -> Result<()> {
    let options = PackageOptions::from(&cli.global);
    let package = Package::new(cli.command.package(), options)?;
    log::info!(
        "{} {}",
        action_name(&cli.command),
        package.descriptor().url()
    );

    let fetched = package.fetch_with(collaborators.fetcher, collaborators.extractor, stderr)?;
    match cli.command.script() {
        LifecycleScript::Install => fetched.install_with(collaborators.runner, stderr),
        LifecycleScript::Uninstall => fetched.uninstall_with(collaborators.runner, stderr),
    }
}

fn action_name(command: &Command) -> &'static str {
    match command {
        Command::Install(_) => "installing",
        Command::Uninstall(_) => "uninstalling",
    }
}

fn exit_code_for_parse_error(
    err: &clap::Error,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    let rendered = err.render();
    if err.use_stderr() {
        let usage = InstallerError::Usage {
            message: rendered.to_string().trim_end().to_owned(),
        };
        write_stderr_line(stderr, &usage);
        return USAGE_EXIT_CODE;
    }
    if write!(stdout, "{rendered}").is_err() {
        // Best-effort output; ignore write failures.
    }
    0
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            log::debug!("command failed: {err:?}");
            write_stderr_line(stderr, format_args!("error: {err}"));
            err.exit_code()
        }
    }
}
