use std::convert::Infallible;
use std::env;
use std::io::{self, Write};
use std::process;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::diagnostics::{format_umask, read_umask, write_environment, write_working_directory};
use crate::watcher::{SignalWatcher, signal_name};

pub const RECEIVED_SIGNAL_MESSAGE: &str = "Received signal. Waiting before clean stop...";

/// The long-running test subject: dumps its surroundings, then waits to be told to
/// stop (or gives up on its own).
#[derive(Debug)]
pub struct Fixture {
    config: Config,
}

impl Fixture {
    pub fn new(config: Config) -> Fixture {
        Fixture { config }
    }

    /// Runs the fixture to completion. Only returns on a setup error, otherwise the
    /// process ends from whichever of the two exit paths gets there first.
    ///
    /// Must be called from the main thread before any other thread is spawned,
    /// see [`SignalWatcher::register`].
    pub fn run(self) -> Result<Infallible> {
        let config = self.config;
        debug!("starting fixture with {:?}", config);

        // Block the signal before printing anything, a signal that shows up
        // mid-dump stays pending until the watcher picks it up.
        let watcher = SignalWatcher::register(config.signal())?;

        if let Err(e) = self.print_diagnostics() {
            warn!("failed writing diagnostics: {}", e);
        }

        if let Some(watcher) = watcher {
            watcher.spawn(move |signum| {
                info!("received {}, exiting in {:?}", signal_name(signum), config.grace());
                let _ = writeln!(io::stderr(), "{}", RECEIVED_SIGNAL_MESSAGE);
                pause("grace period", config.grace());
                terminate(config.exit_code());
            })?;
        }

        pause("sleep", config.sleep());
        let remaining = config.remaining_wait();
        if !remaining.is_zero() {
            pause("remaining wait", remaining);
        }

        terminate(config.exit_code())
    }

    /// Working directory to stderr; environment and umask to stdout.
    pub fn print_diagnostics(&self) -> io::Result<()> {
        write_working_directory(&mut io::stderr().lock())?;

        let mut stdout = io::stdout().lock();
        write_environment(&mut stdout, env::vars_os())?;
        writeln!(stdout, "{}", format_umask(read_umask()))?;
        stdout.flush()
    }
}

fn pause(what: &str, duration: Duration) {
    trace!("{}: sleeping for {:?}", what, duration);
    thread::sleep(duration);
}

/// Ends the whole process. Both exit paths funnel through here with the same code.
pub fn terminate(code: i32) -> ! {
    debug!("exiting with code {}", code);
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    process::exit(code)
}
