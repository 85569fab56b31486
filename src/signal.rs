use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn on_signal(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Turn SIGINT and SIGTERM into a flag so the inhibitor is released on the way
/// out instead of the process dying with it held.
#[cfg(unix)]
pub fn install_handlers() {
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is async-signal-safe
        if unsafe { libc::signal(signal, handler) } == libc::SIG_ERR {
            log::warn!("could not install a handler for signal {signal}");
        }
    }
}

// Windows drops the execution state with the thread, so there is nothing to
// release by hand.
#[cfg(not(unix))]
pub fn install_handlers() {}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
