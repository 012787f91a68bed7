//! Signal forwarding while a lifecycle script runs.
//!
//! An interrupt aimed at the installer must not kill it while a script is
//! running, or scratch storage would be left behind. [`ForwardGuard`]
//! replaces the termination handlers with one that relays the signal to the
//! script's process. The installer then sees the script exit, unwinds, and
//! removes scratch storage. Handled signals reset to their defaults across
//! `exec`, so the script itself keeps the usual behaviour.

use std::io;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Signals relayed to the running script.
const FORWARDED: [libc::c_int; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Process id of the script currently being waited on, or zero.
static TARGET: AtomicI32 = AtomicI32::new(0);

/// Serialises guards; the handler has a single target.
static EXCLUSIVE: Mutex<()> = Mutex::new(());

/// Relays termination signals to a child process until dropped.
pub(crate) struct ForwardGuard {
    previous: Vec<(libc::c_int, libc::sigaction)>,
    _exclusive: MutexGuard<'static, ()>,
}

impl ForwardGuard {
    /// Start relaying signals to the process `pid`.
    ///
    /// Handlers installed before a failure are restored when the partial
    /// guard is dropped.
    pub(crate) fn install(pid: u32) -> io::Result<Self> {
        let exclusive = EXCLUSIVE.lock().unwrap_or_else(PoisonError::into_inner);
        let pid = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::other(format!("process id {pid} out of range")))?;
        TARGET.store(pid, Ordering::SeqCst);

        let mut guard = Self {
            previous: Vec::with_capacity(FORWARDED.len()),
            _exclusive: exclusive,
        };
        for signal in FORWARDED {
            let previous = replace_action(signal)?;
            guard.previous.push((signal, previous));
        }
        log::trace!("forwarding termination signals to process {pid}");
        Ok(guard)
    }
}

impl Drop for ForwardGuard {
    fn drop(&mut self) {
        for (signal, previous) in self.previous.drain(..).rev() {
            // SAFETY: `previous` was filled in by a successful `sigaction`
            // call for the same signal.
            let restored = unsafe { libc::sigaction(signal, &previous, std::ptr::null_mut()) };
            if restored != 0 {
                log::warn!(
                    "failed to restore handler for signal {signal}: {}",
                    io::Error::last_os_error()
                );
            }
        }
        TARGET.store(0, Ordering::SeqCst);
    }
}

/// Install [`relay`] for `signal`, returning the action it replaces.
fn replace_action(signal: libc::c_int) -> io::Result<libc::sigaction> {
    // SAFETY: an all-zero `sigaction` is a valid empty action.
    let (mut action, mut previous): (libc::sigaction, libc::sigaction) =
        unsafe { (std::mem::zeroed(), std::mem::zeroed()) };
    action.sa_sigaction = relay_address();
    action.sa_flags = libc::SA_RESTART;
    // SAFETY: both pointers refer to live, properly aligned values.
    let installed = unsafe {
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(signal, &action, &mut previous)
    };
    if installed != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(previous)
}

fn relay_address() -> libc::sighandler_t {
    let handler: extern "C" fn(libc::c_int) = relay;
    handler as libc::sighandler_t
}

/// Signal handler; only async-signal-safe calls are allowed here.
extern "C" fn relay(signal: libc::c_int) {
    let pid = TARGET.load(Ordering::SeqCst);
    if pid > 0 {
        // SAFETY: `kill` is async-signal-safe.
        unsafe {
            libc::kill(pid, signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;

    fn current_handler(signal: libc::c_int) -> libc::sighandler_t {
        let mut current: libc::sigaction = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::sigaction(signal, std::ptr::null(), &mut current) };
        assert_eq!(rc, 0);
        current.sa_sigaction
    }

    #[test]
    fn relays_interrupt_to_the_child() {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg("exec sleep 30")
            .spawn()
            .expect("spawn sleep");

        let guard = ForwardGuard::install(child.id()).expect("install guard");
        for signal in FORWARDED {
            assert_eq!(current_handler(signal), relay_address());
        }
        relay(libc::SIGINT);
        let status = child.wait().expect("wait for child");
        drop(guard);

        assert_eq!(status.signal(), Some(libc::SIGINT));
    }
}
