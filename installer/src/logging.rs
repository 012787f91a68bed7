//! Diagnostic logging setup.
//!
//! Library code logs through the `log` facade. The binary installs an
//! `env_logger` backend whose level comes from `-v`/`-q`, unless the
//! `EZSETUP_LOG` environment variable supplies an explicit filter.

use crate::cli::GlobalArgs;
use log::LevelFilter;

/// Environment variable holding an `env_logger` filter directive.
pub const LOG_ENV: &str = "EZSETUP_LOG";

/// Map the verbosity flags to a log level.
///
/// # Examples
///
/// ```
/// use ezsetup::logging::level_filter;
/// use log::LevelFilter;
///
/// assert_eq!(level_filter(0, false), LevelFilter::Warn);
/// assert_eq!(level_filter(2, false), LevelFilter::Debug);
/// assert_eq!(level_filter(0, true), LevelFilter::Error);
/// ```
#[must_use]
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the global logger for this process.
///
/// Later calls are ignored, so in-process test harnesses may call this once
/// per run.
pub fn init(args: &GlobalArgs) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_filter(args.verbosity, args.quiet))
        .format_timestamp(None)
        .format_target(false)
        .parse_env(env_logger::Env::new().filter(LOG_ENV));
    if builder.try_init().is_err() {
        log::trace!("logger already initialised");
    }
}
