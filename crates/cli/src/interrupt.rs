use std::io;
use std::process;
use std::thread::{self, JoinHandle};

use futures_util::future::AbortHandle;
use nix::sys::signal::{SigSet, Signal};
use tracing::{debug, info, warn};

/// Abort `handle` on SIGINT or SIGTERM.
///
/// Blocks both signals for the calling thread and every thread it spawns
/// afterwards, then waits for them on a dedicated thread. Call before the bus
/// connection starts its executor thread. A second signal exits the process
/// at once, so a stuck close or copy can still be killed.
pub fn watch(handle: AbortHandle) -> io::Result<()> {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTERM);
    set.thread_block()?;

    if let Err(e) = spawn_watcher(set, handle, |signal| process::exit(exit_code(signal))) {
        set.thread_unblock()?;
        return Err(e);
    }
    Ok(())
}

/// Conventional exit status for a process ended by `signal`
fn exit_code(signal: Signal) -> i32 {
    128 + signal as i32
}

/// Wait for a signal in `set`, abort `handle`, then hand a second one to
/// `on_second`. The signals must already be blocked.
fn spawn_watcher<F>(set: SigSet, handle: AbortHandle, on_second: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce(Signal) + Send + 'static,
{
    thread::Builder::new()
        .name("signal-watch".to_string())
        .spawn(move || {
            match set.wait() {
                Ok(signal) => {
                    info!(?signal, "Received signal, aborting wait");
                    handle.abort();
                }
                Err(errno) => {
                    debug!(%errno, "sigwait failed");
                    return;
                }
            }
            match set.wait() {
                Ok(signal) => {
                    warn!(?signal, "Received second signal, exiting");
                    on_second(signal);
                }
                Err(errno) => debug!(%errno, "sigwait failed"),
            }
        })
}
