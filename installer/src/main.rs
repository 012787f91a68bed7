//! ezsetup CLI entrypoint.
//!
//! This binary fetches a package archive, verifies and extracts it, and runs
//! the package's install or uninstall script. All behaviour lives in
//! [`ezsetup::app`]; this file only wires up the process streams and exit
//! status.

use ezsetup::app::{Collaborators, run_cli};

fn main() {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let exit_code = run_cli(
        std::env::args_os(),
        &Collaborators::system(),
        &mut stdout,
        &mut stderr,
    );
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
