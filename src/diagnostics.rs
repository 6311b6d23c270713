use std::ffi::OsStr;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use nix::sys::stat::{Mode, umask};
use nix::unistd::getcwd;
use tracing::warn;

pub const ENVIRONMENT_HEADER: &str = "Environment variables:";

/// The current working directory, or an empty path if it can't be resolved
/// (e.g. the directory was removed out from under us).
pub fn working_directory() -> PathBuf {
    match getcwd() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("unable to read current working directory: {}", e);
            PathBuf::new()
        }
    }
}

pub fn write_working_directory<W: Write>(out: &mut W) -> io::Result<()> {
    let dir = working_directory();
    out.write_all(b"Current working directory: ")?;
    out.write_all(dir.as_os_str().as_bytes())?;
    out.write_all(b"\n")
}

/// Writes the header followed by one `KEY=VALUE` line per variable. Bytes are
/// written as-is, variables need not be valid UTF-8.
pub fn write_environment<W, I, K, V>(out: &mut W, vars: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    writeln!(out, "{}", ENVIRONMENT_HEADER)?;
    for (key, value) in vars {
        out.write_all(key.as_ref().as_bytes())?;
        out.write_all(b"=")?;
        out.write_all(value.as_ref().as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Reads the file creation mask. There is no read-only syscall for it, so the
/// mask is cleared and the previous value put straight back.
pub fn read_umask() -> Mode {
    let previous = umask(Mode::empty());
    umask(previous);
    previous
}

pub fn format_umask(mode: Mode) -> String {
    format!("Umask: 0o{:03o}", mode.bits() as u32)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    use super::*;

    #[test]
    fn environment_lines_follow_the_header() {
        let mut out = Vec::new();
        write_environment(&mut out, [("HOME", "/root"), ("EMPTY", ""), ("EQ", "a=b")]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Environment variables:\nHOME=/root\nEMPTY=\nEQ=a=b\n"
        );
    }

    #[test]
    fn environment_bytes_are_written_verbatim() {
        let value = OsString::from_vec(vec![0x66, 0xff, 0x6f]);
        let mut out = Vec::new();
        write_environment(&mut out, [(OsString::from("RAW"), value)]).unwrap();
        assert!(out.ends_with(b"RAW=f\xffo\n"));
    }

    #[test]
    fn umask_is_three_octal_digits() {
        assert_eq!(format_umask(Mode::from_bits_truncate(0o22)), "Umask: 0o022");
        assert_eq!(format_umask(Mode::empty()), "Umask: 0o000");
        assert_eq!(format_umask(Mode::from_bits_truncate(0o777)), "Umask: 0o777");
    }

    #[test]
    fn reading_the_umask_leaves_it_unchanged() {
        let first = read_umask();
        let second = read_umask();
        assert_eq!(first, second);
    }

    #[test]
    fn working_directory_line_names_the_cwd() {
        let mut out = Vec::new();
        write_working_directory(&mut out).unwrap();
        let line = String::from_utf8(out).unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(line, format!("Current working directory: {}\n", cwd.display()));
    }
}
