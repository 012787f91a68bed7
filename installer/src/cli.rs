//! CLI argument definitions for the ezsetup installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the entrypoint so the binary stays a thin shell over [`crate::app`].

use crate::package::PackageOptions;
use crate::script::LifecycleScript;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Fetch a packaged archive and run its install or uninstall script.
#[derive(Parser, Debug)]
#[command(name = "ezsetup")]
#[command(version, about)]
#[command(arg_required_else_help = true)]
#[command(long_about = concat!(
    "Fetch a packaged archive and run its install or uninstall script.\n\n",
    "A package is a tar archive (optionally gzip, bzip2, xz, or zstd compressed) ",
    "holding install.sh and uninstall.sh, either at the archive root or directly ",
    "inside one top-level directory. The archive is downloaded, verified, ",
    "extracted to a temporary directory, and the requested script is run from ",
    "there with the current environment. The temporary directory is removed ",
    "afterwards.",
))]
#[command(after_help = concat!(
    "PACKAGE FORMAT:\n",
    "  <algorithm>=<digest>=<url>\n\n",
    "  algorithm   sha256, or none to skip verification\n",
    "  digest      lowercase hex digest (empty when algorithm is none)\n",
    "  url         http://, https://, or file:// location of the archive\n\n",
    "EXAMPLES:\n",
    "  Install a verified package:\n",
    "    $ ezsetup install sha256=9f86d0...0a08=https://example.com/tool.tar.gz\n\n",
    "  Uninstall without verification:\n",
    "    $ ezsetup uninstall none==https://example.com/tool.tar.gz\n\n",
    "ENVIRONMENT:\n",
    "  EZSETUP_LOG   Log filter overriding -v/-q (e.g. debug, ezsetup=trace)",
))]
pub struct Cli {
    /// Lifecycle action to perform.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options accepted before or after the subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors and warnings still shown).
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Directory in which temporary package files are created
    /// [default: system temporary directory].
    #[arg(long, global = true, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch a package and run its install.sh.
    Install(PackageArgs),

    /// Fetch a package and run its uninstall.sh.
    Uninstall(PackageArgs),
}

impl Command {
    /// The package descriptor named on the command line.
    #[must_use]
    pub fn package(&self) -> &str {
        match self {
            Self::Install(args) | Self::Uninstall(args) => &args.package,
        }
    }

    /// The lifecycle script this command runs.
    #[must_use]
    pub fn script(&self) -> LifecycleScript {
        match self {
            Self::Install(_) => LifecycleScript::Install,
            Self::Uninstall(_) => LifecycleScript::Uninstall,
        }
    }
}

/// Arguments for the install and uninstall commands.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PackageArgs {
    /// Package descriptor in the form algorithm=digest=url.
    #[arg(value_name = "PACKAGE")]
    pub package: String,
}

impl From<&GlobalArgs> for PackageOptions {
    fn from(args: &GlobalArgs) -> Self {
        Self {
            scratch_parent: args.scratch_dir.clone(),
            quiet: args.quiet,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
