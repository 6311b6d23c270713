use std::time::Duration;

use crate::options::Options;

pub const DEFAULT_SLEEP_SECS: u64 = 5;
pub const DEFAULT_SIGNAL: i32 = libc::SIGTERM;
pub const DEFAULT_WAIT_SECS: u64 = 5;
pub const DEFAULT_EXIT_CODE: i32 = 0;

/// Resolved fixture behaviour. Built once at startup and only read afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// How long the main path runs before the default exit.
    sleep: Duration,
    /// Raw number of the signal to watch for.
    signal: i32,
    /// Pause between receiving the watched signal and exiting. Also the minimum
    /// total runtime when no signal arrives.
    grace: Duration,
    exit_code: i32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sleep: Duration::from_secs(DEFAULT_SLEEP_SECS),
            signal: DEFAULT_SIGNAL,
            grace: Duration::from_secs(DEFAULT_WAIT_SECS),
            exit_code: DEFAULT_EXIT_CODE,
        }
    }
}

impl From<&Options> for Config {
    fn from(options: &Options) -> Self {
        let defaults = Config::default();
        Config {
            sleep: options.sleep_time.map_or(defaults.sleep, seconds),
            signal: options.signal.unwrap_or(defaults.signal),
            grace: options.wait_time.map_or(defaults.grace, seconds),
            exit_code: options.exit_code.unwrap_or(defaults.exit_code),
        }
    }
}

impl Config {
    pub fn sleep(&self) -> Duration {
        self.sleep
    }

    pub fn signal(&self) -> i32 {
        self.signal
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Extra time the main path waits after `sleep` so that a no-signal exit never
    /// happens before `grace` has elapsed.
    pub fn remaining_wait(&self) -> Duration {
        self.grace.saturating_sub(self.sleep)
    }

    pub fn minimum_runtime(&self) -> Duration {
        self.sleep.max(self.grace)
    }
}

// negative values behave like zero, a sleep of -3s returns right away
fn seconds(secs: i64) -> Duration {
    Duration::from_secs(secs.max(0) as u64)
}
