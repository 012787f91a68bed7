//! Lifecycle script execution.
//!
//! Scripts run through the platform shell with their standard streams
//! inherited, so the operator sees their output in real time. The
//! environment is passed in explicitly as a snapshot rather than inherited
//! implicitly, which keeps the execution contract observable in tests.
//!
//! On Unix, termination signals received while a script runs are relayed to
//! it, so the installer outlives the script and still removes scratch
//! storage.

use crate::error::{InstallerError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name of the install entry point.
pub const INSTALL_SCRIPT: &str = "install.sh";

/// File name of the uninstall entry point.
pub const UNINSTALL_SCRIPT: &str = "uninstall.sh";

/// The two entry points every package must ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleScript {
    /// Runs `install.sh`.
    Install,
    /// Runs `uninstall.sh`.
    Uninstall,
}

impl LifecycleScript {
    /// Every lifecycle script, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Install, Self::Uninstall];

    /// Return the fixed file name of this script.
    ///
    /// # Examples
    ///
    /// ```
    /// use ezsetup::script::LifecycleScript;
    ///
    /// assert_eq!(LifecycleScript::Install.file_name(), "install.sh");
    /// assert_eq!(LifecycleScript::Uninstall.file_name(), "uninstall.sh");
    /// ```
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Install => INSTALL_SCRIPT,
            Self::Uninstall => UNINSTALL_SCRIPT,
        }
    }
}

/// A single request to run a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    script: PathBuf,
    working_dir: PathBuf,
    env: Vec<(OsString, OsString)>,
}

impl ScriptInvocation {
    /// Describe a script run with an explicit environment.
    #[must_use]
    pub fn new(
        script: PathBuf,
        working_dir: PathBuf,
        env: impl IntoIterator<Item = (OsString, OsString)>,
    ) -> Self {
        Self {
            script,
            working_dir,
            env: env.into_iter().collect(),
        }
    }

    /// Describe a script run with a snapshot of the current process
    /// environment.
    #[must_use]
    pub fn with_current_env(script: PathBuf, working_dir: PathBuf) -> Self {
        Self::new(script, working_dir, std::env::vars_os())
    }

    /// Path to the script file.
    #[must_use]
    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Directory the script runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Environment variables the script receives, and no others.
    #[must_use]
    pub fn env(&self) -> &[(OsString, OsString)] {
        &self.env
    }
}

/// Abstraction for running lifecycle scripts.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptRunner {
    /// Run the script and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ScriptLaunch`] if the shell cannot be
    /// started, or [`InstallerError::ScriptExecution`] carrying the exit
    /// code when the script exits unsuccessfully.
    fn exec(&self, invocation: &ScriptInvocation) -> Result<()>;
}

/// Runs scripts through the host shell.
///
/// # Examples
///
/// ```no_run
/// use ezsetup::script::{ScriptInvocation, ScriptRunner, ShellScriptRunner};
/// use std::path::PathBuf;
///
/// let invocation = ScriptInvocation::with_current_env(
///     PathBuf::from("/tmp/pkg/install.sh"),
///     PathBuf::from("/tmp/pkg"),
/// );
/// ShellScriptRunner.exec(&invocation)?;
/// # Ok::<(), ezsetup::error::InstallerError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellScriptRunner;

impl ScriptRunner for ShellScriptRunner {
    fn exec(&self, invocation: &ScriptInvocation) -> Result<()> {
        log::debug!(
            "running {} in {}",
            invocation.script().display(),
            invocation.working_dir().display()
        );
        let launch_error = |source| InstallerError::ScriptLaunch {
            script: invocation.script().to_owned(),
            source,
        };
        let mut child = shell_command(invocation.script())
            .current_dir(invocation.working_dir())
            .env_clear()
            .envs(invocation.env().iter().map(|(key, value)| (key, value)))
            .spawn()
            .map_err(launch_error)?;

        #[cfg(unix)]
        let _forwarding = crate::signal::ForwardGuard::install(child.id())
            .inspect_err(|err| log::warn!("signals will not be forwarded to the script: {err}"))
            .ok();
        let status = child.wait()?;

        if status.success() {
            return Ok(());
        }
        Err(InstallerError::ScriptExecution {
            script: invocation.script().to_owned(),
            code: status.code(),
        })
    }
}

/// Build a shell command that runs `script` as a command line.
///
/// The path travels as a positional parameter so it never needs quoting.
#[cfg(unix)]
fn shell_command(script: &Path) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg("\"$0\"").arg(script);
    cmd
}

#[cfg(windows)]
fn shell_command(script: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(script);
    cmd
}
