use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use clap::Parser;

#[derive(Clone, Debug, Default, Parser)]
#[command(
    version,
    about = "Sleeps, dumps its environment and exits on cue; a fixture for process supervisor tests",
    args_override_self = true
)]
pub struct Options {
    /// Amount of time (seconds) it will run / sleep before exiting
    #[arg(long = "sleepTime", value_name = "SECONDS", allow_negative_numbers = true)]
    pub sleep_time: Option<i64>,

    /// Expected signal to cleanly stop on
    #[arg(long = "signal", value_name = "SIGNUM", allow_negative_numbers = true)]
    pub signal: Option<i32>,

    /// Amount of waiting time (seconds) when entering the clean stop
    #[arg(long = "waitTime", value_name = "SECONDS", allow_negative_numbers = true)]
    pub wait_time: Option<i64>,

    /// The exit code it returns
    #[arg(long = "exitCode", value_name = "CODE", allow_negative_numbers = true)]
    pub exit_code: Option<i32>,

    /// Flag parsing stops at the first non-flag argument, it and everything
    /// after it are ignored.
    #[arg(hide = true, trailing_var_arg = true)]
    pub rest: Vec<OsString>,
}

impl Options {
    /// Parse the process arguments, exiting with a usage error on bad input.
    pub fn parse_env() -> Options {
        Options::parse_from(go_style_args(std::env::args_os()))
    }

    /// Like [`Options::parse_env`] but returns the error instead of exiting.
    pub fn parse_args<I, T>(args: I) -> Result<Options, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Options::try_parse_from(go_style_args(args))
    }

    /// Number of fixture flags given explicitly on the command line.
    pub fn flags_set(&self) -> usize {
        [
            self.sleep_time.is_some(),
            self.signal.is_some(),
            self.wait_time.is_some(),
            self.exit_code.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// Rewrites `-flag` into `--flag` so that callers can keep using the single dash
/// spelling supervisor configs were written with. The first element is the
/// program name and is left alone, as is everything after a bare `--`. Flags that
/// follow a positional get rewritten too, but end up in [`Options::rest`] anyway.
pub fn go_style_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut rewriting = true;
    for (idx, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if idx == 0 || !rewriting {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            rewriting = false;
            out.push(arg);
            continue;
        }
        if is_single_dash_long(&arg) {
            let mut bytes = Vec::with_capacity(arg.len() + 1);
            bytes.push(b'-');
            bytes.extend_from_slice(arg.as_bytes());
            out.push(OsString::from_vec(bytes));
        } else {
            out.push(arg);
        }
    }
    out
}

// `-h` and negative numbers such as `-1` must pass through untouched.
fn is_single_dash_long(arg: &OsStr) -> bool {
    match arg.as_bytes() {
        [b'-', second, _, ..] => second.is_ascii_alphabetic(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.into_string().expect("test args are utf-8"))
            .collect()
    }

    #[test]
    fn single_dash_flags_get_a_second_dash() {
        let args = go_style_args(["sigsleep", "-sleepTime=3", "-signal", "10", "--exitCode=1"]);
        assert_eq!(
            strings(args),
            ["sigsleep", "--sleepTime=3", "--signal", "10", "--exitCode=1"]
        );
    }

    #[test]
    fn short_flags_negative_numbers_and_trailing_args_are_kept() {
        let args = go_style_args(["sigsleep", "-h", "-exitCode", "-1", "--", "-waitTime"]);
        assert_eq!(
            strings(args),
            ["sigsleep", "-h", "--exitCode", "-1", "--", "-waitTime"]
        );
    }

    #[test]
    fn no_flags_means_nothing_set() {
        let options = Options::parse_args(["sigsleep"]).unwrap();
        assert_eq!(options.flags_set(), 0);
    }

    #[test]
    fn every_spelling_parses() {
        let options =
            Options::parse_args(["sigsleep", "-sleepTime=0", "--waitTime", "2", "-exitCode", "7"])
                .unwrap();
        assert_eq!(options.sleep_time, Some(0));
        assert_eq!(options.wait_time, Some(2));
        assert_eq!(options.exit_code, Some(7));
        assert_eq!(options.signal, None);
        assert_eq!(options.flags_set(), 3);
    }

    #[test]
    fn negative_values_are_accepted() {
        let options = Options::parse_args(["sigsleep", "-exitCode", "-1"]).unwrap();
        assert_eq!(options.exit_code, Some(-1));
    }

    #[test]
    fn last_occurrence_wins() {
        let options = Options::parse_args(["sigsleep", "-sleepTime=1", "-sleepTime=4"]).unwrap();
        assert_eq!(options.sleep_time, Some(4));
        assert_eq!(options.flags_set(), 1);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let err = Options::parse_args(["sigsleep", "-sleepTime=soon"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn a_lone_positional_sets_nothing() {
        let options = Options::parse_args(["sigsleep", "foo"]).unwrap();
        assert_eq!(options.flags_set(), 0);
        assert_eq!(options.rest, ["foo"]);
    }

    #[test]
    fn flags_after_a_positional_are_ignored() {
        let options =
            Options::parse_args(["sigsleep", "-sleepTime", "1", "foo", "-exitCode", "3"]).unwrap();
        assert_eq!(options.sleep_time, Some(1));
        assert_eq!(options.exit_code, None);
        assert_eq!(options.flags_set(), 1);
        assert_eq!(options.rest, ["foo", "--exitCode", "3"]);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = Options::parse_args(["sigsleep", "-bogus=1"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
