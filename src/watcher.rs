use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use tracing::{debug, trace, warn};

/// Blocks one signal and waits for it synchronously, instead of running a handler.
///
/// The signal must be blocked on every thread for `wait` to be the only place it
/// is ever delivered, so [`SignalWatcher::register`] has to run on the main thread
/// before anything else is spawned. Threads inherit the mask of their creator.
///
/// Works on raw signal numbers: real-time signals have no [`Signal`] variant.
#[derive(Clone, Copy)]
pub struct SignalWatcher {
    signum: i32,
    set: libc::sigset_t,
}

impl fmt::Debug for SignalWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalWatcher")
            .field("signal", &signal_name(self.signum))
            .finish()
    }
}

impl SignalWatcher {
    /// Blocks `signum` on the calling thread.
    ///
    /// Returns `None` for numbers that can't be watched: 0, numbers outside the
    /// platform's signal range (including ones reserved by libc) and the
    /// uncatchable `SIGKILL`/`SIGSTOP`. Those simply never trigger a clean stop.
    pub fn register(signum: i32) -> Result<Option<SignalWatcher>> {
        if signum == libc::SIGKILL || signum == libc::SIGSTOP {
            warn!("signal {} cannot be caught, not watching it", signum);
            return Ok(None);
        }
        if signum <= 0 || signum > max_signal() {
            warn!("{} is not a signal number, not watching it", signum);
            return Ok(None);
        }

        let set = match signal_set(signum) {
            Ok(set) => set,
            Err(e) => {
                warn!("signal {} can't be watched ({}), not watching it", signum, e);
                return Ok(None);
            }
        };

        let rc = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &set, ptr::null_mut()) };
        if rc != 0 {
            return Err(Errno::from_raw(rc))
                .with_context(|| format!("blocking {} on the main thread", signal_name(signum)));
        }
        debug!("watching for {}", signal_name(signum));

        Ok(Some(SignalWatcher { signum, set }))
    }

    pub fn signum(&self) -> i32 {
        self.signum
    }

    /// Blocks until the watched signal is pending, and consumes it.
    pub fn wait(&self) -> Result<i32> {
        let mut received: libc::c_int = 0;
        let rc = unsafe { libc::sigwait(&self.set, &mut received) };
        if rc != 0 {
            return Err(Errno::from_raw(rc))
                .with_context(|| format!("waiting for {}", signal_name(self.signum)));
        }
        trace!("received {}", signal_name(received));
        Ok(received)
    }

    /// Waits on a dedicated thread and hands the signal number to `on_signal`.
    pub fn spawn<F>(self, on_signal: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(i32) + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("signal-watcher".to_string())
            .spawn(move || match self.wait() {
                Ok(signum) => on_signal(signum),
                Err(e) => warn!("{:?}", e),
            })?;
        Ok(handle)
    }
}

/// `SIGTERM`, `SIGRTMIN+2`, or just the number when it has no name.
pub fn signal_name(signum: i32) -> String {
    if let Ok(signal) = Signal::try_from(signum) {
        return signal.as_str().to_string();
    }
    #[cfg(target_os = "linux")]
    if (libc::SIGRTMIN()..=libc::SIGRTMAX()).contains(&signum) {
        return format!("SIGRTMIN+{}", signum - libc::SIGRTMIN());
    }
    format!("signal {}", signum)
}

#[cfg(target_os = "linux")]
fn max_signal() -> i32 {
    libc::SIGRTMAX()
}

// no real-time signals, the named ones are all there is
#[cfg(not(target_os = "linux"))]
fn max_signal() -> i32 {
    Signal::iterator().map(|s| s as i32).max().unwrap_or(libc::SIGTERM)
}

// sigaddset rejects numbers libc keeps for itself (e.g. glibc's 32 and 33)
fn signal_set(signum: i32) -> Result<libc::sigset_t, Errno> {
    let mut set = MaybeUninit::<libc::sigset_t>::uninit();
    unsafe {
        Errno::result(libc::sigemptyset(set.as_mut_ptr()))?;
        Errno::result(libc::sigaddset(set.as_mut_ptr(), signum))?;
        Ok(set.assume_init())
    }
}
