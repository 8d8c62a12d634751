//! `sysctl(KERN_PROC_ARGS)` backed source for the BSDs.
//!
//! Reads argv and the environment straight from the kernel's copy of the
//! process, so it keeps working when the inherited environment has been
//! scrubbed. Everything is copied into buffers owned by the call.

use std::ffi::OsString;

use crate::environment::EnvironmentSnapshot;
use crate::error::SourceError;
use crate::source::ProcessInfo;

const SOURCE_NAME: &str = "kernel";

#[derive(Debug, Clone, Copy, Default)]
pub struct KernelSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    Argv,
    Env,
}

impl ProcessInfo for KernelSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn argv(&self) -> Result<Vec<OsString>, SourceError> {
        let strings = sys::proc_strings(Query::Argv)?;
        Ok(strings.into_iter().map(bytes_to_os).collect())
    }

    fn environment(&self) -> Result<EnvironmentSnapshot, SourceError> {
        let strings = sys::proc_strings(Query::Env)?;
        Ok(EnvironmentSnapshot::from_entries(strings))
    }
}

fn bytes_to_os(bytes: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes)
}

/// Splits a run of NUL-terminated strings. A final unterminated string
/// is kept; the terminator after the last string does not yield an
/// empty entry.
#[cfg_attr(not(any(target_os = "netbsd", target_os = "freebsd")), allow(dead_code))]
fn split_nul(buf: &[u8]) -> Vec<Vec<u8>> {
    let buf = buf.strip_suffix(&[0]).unwrap_or(buf);
    if buf.is_empty() {
        return Vec::new();
    }
    buf.split(|&b| b == 0).map(<[u8]>::to_vec).collect()
}

/// OpenBSD replies with a NULL-terminated pointer table followed by the
/// strings themselves, in table order. The pointers refer to the caller's
/// buffer, so only their count is needed.
#[cfg_attr(not(target_os = "openbsd"), allow(dead_code))]
fn split_pointer_table(buf: &[u8]) -> Result<Vec<Vec<u8>>, SourceError> {
    const WORD: usize = std::mem::size_of::<usize>();

    let mut count = 0;
    loop {
        let start = count * WORD;
        let Some(word) = buf.get(start..start + WORD) else {
            return Err(SourceError::Malformed {
                source_name: SOURCE_NAME,
                reason: "pointer table is not terminated".to_string(),
            });
        };
        let mut raw = [0u8; WORD];
        raw.copy_from_slice(word);
        if usize::from_ne_bytes(raw) == 0 {
            break;
        }
        count += 1;
    }

    let strings = &buf[(count + 1) * WORD..];
    let mut out = Vec::with_capacity(count);
    let mut rest = strings;
    for _ in 0..count {
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            return Err(SourceError::Malformed {
                source_name: SOURCE_NAME,
                reason: format!("expected {} strings, found {}", count, out.len()),
            });
        };
        out.push(rest[..end].to_vec());
        rest = &rest[end + 1..];
    }
    Ok(out)
}

#[cfg(any(target_os = "openbsd", target_os = "netbsd", target_os = "freebsd"))]
mod sys {
    use std::ptr;

    use libc::{c_int, c_uint, c_void, size_t};
    use nix::errno::Errno;

    use super::{Query, SOURCE_NAME};
    use crate::error::SourceError;

    const MAX_ATTEMPTS: usize = 4;

    #[cfg(target_os = "openbsd")]
    fn mib(query: Query) -> [c_int; 4] {
        const KERN_PROC_ARGS: c_int = 55;
        const KERN_PROC_ARGV: c_int = 1;
        const KERN_PROC_ENV: c_int = 3;
        let what = match query {
            Query::Argv => KERN_PROC_ARGV,
            Query::Env => KERN_PROC_ENV,
        };
        [libc::CTL_KERN, KERN_PROC_ARGS, nix::unistd::getpid().as_raw(), what]
    }

    #[cfg(target_os = "netbsd")]
    fn mib(query: Query) -> [c_int; 4] {
        const KERN_PROC_ARGS: c_int = 48;
        const KERN_PROC_ARGV: c_int = 1;
        const KERN_PROC_ENV: c_int = 3;
        let what = match query {
            Query::Argv => KERN_PROC_ARGV,
            Query::Env => KERN_PROC_ENV,
        };
        [libc::CTL_KERN, KERN_PROC_ARGS, nix::unistd::getpid().as_raw(), what]
    }

    #[cfg(target_os = "freebsd")]
    fn mib(query: Query) -> [c_int; 4] {
        const KERN_PROC: c_int = 14;
        const KERN_PROC_ARGS: c_int = 7;
        const KERN_PROC_ENV: c_int = 35;
        let what = match query {
            Query::Argv => KERN_PROC_ARGS,
            Query::Env => KERN_PROC_ENV,
        };
        [libc::CTL_KERN, KERN_PROC, what, nix::unistd::getpid().as_raw()]
    }

    pub(super) fn proc_strings(query: Query) -> Result<Vec<Vec<u8>>, SourceError> {
        let buf = read_sysctl(&mib(query)).map_err(|errno| SourceError::Query {
            source_name: SOURCE_NAME,
            errno,
        })?;

        #[cfg(target_os = "openbsd")]
        return super::split_pointer_table(&buf);

        #[cfg(not(target_os = "openbsd"))]
        return Ok(super::split_nul(&buf));
    }

    fn read_sysctl(mib: &[c_int]) -> Result<Vec<u8>, Errno> {
        let mut len: size_t = 0;
        // SAFETY: a null old pointer only asks the kernel for the reply size.
        let rc = unsafe {
            libc::sysctl(
                mib.as_ptr(),
                mib.len() as c_uint,
                ptr::null_mut::<c_void>(),
                &mut len,
                ptr::null_mut::<c_void>(),
                0,
            )
        };
        Errno::result(rc)?;

        for _ in 0..MAX_ATTEMPTS {
            let mut buf = vec![0u8; len.max(1)];
            let mut got = buf.len();
            // SAFETY: `buf` is valid for writes of `got` bytes and outlives the call.
            let rc = unsafe {
                libc::sysctl(
                    mib.as_ptr(),
                    mib.len() as c_uint,
                    buf.as_mut_ptr().cast::<c_void>(),
                    &mut got,
                    ptr::null_mut::<c_void>(),
                    0,
                )
            };
            match Errno::result(rc) {
                Ok(_) => {
                    buf.truncate(got);
                    return Ok(buf);
                }
                // grew between the probe and the read
                Err(Errno::ENOMEM) => len = buf.len() * 2,
                Err(errno) => return Err(errno),
            }
        }
        Err(Errno::ENOMEM)
    }
}

#[cfg(not(any(target_os = "openbsd", target_os = "netbsd", target_os = "freebsd")))]
mod sys {
    use super::{Query, SOURCE_NAME};
    use crate::error::SourceError;

    pub(super) fn proc_strings(_query: Query) -> Result<Vec<Vec<u8>>, SourceError> {
        Err(SourceError::Unsupported {
            source_name: SOURCE_NAME,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nul() {
        assert_eq!(
            split_nul(b"./prog\0-v\0\0last\0"),
            vec![b"./prog".to_vec(), b"-v".to_vec(), Vec::new(), b"last".to_vec()]
        );
        assert_eq!(split_nul(b"unterminated"), vec![b"unterminated".to_vec()]);
        assert!(split_nul(b"").is_empty());
        assert!(split_nul(b"\0").is_empty());
    }

    fn pointer_table(strings: &[&[u8]]) -> Vec<u8> {
        const WORD: usize = std::mem::size_of::<usize>();
        let mut buf = Vec::new();
        for i in 0..strings.len() {
            // any non-zero value will do
            buf.extend_from_slice(&(0x1000 + i * WORD).to_ne_bytes());
        }
        buf.extend_from_slice(&0usize.to_ne_bytes());
        for s in strings {
            buf.extend_from_slice(s);
            buf.push(0);
        }
        buf
    }

    #[test]
    fn test_split_pointer_table() {
        let buf = pointer_table(&[b"/usr/bin/prog", b"", b"PATH=/bin"]);
        let strings = split_pointer_table(&buf).unwrap();
        assert_eq!(
            strings,
            vec![b"/usr/bin/prog".to_vec(), Vec::new(), b"PATH=/bin".to_vec()]
        );
    }

    #[test]
    fn test_split_pointer_table_rejects_truncated_reply() {
        let mut buf = pointer_table(&[b"one", b"two"]);
        buf.truncate(buf.len() - 2);
        assert!(matches!(
            split_pointer_table(&buf),
            Err(SourceError::Malformed { .. })
        ));

        let unterminated = 7usize.to_ne_bytes();
        assert!(split_pointer_table(&unterminated).is_err());
    }

    #[cfg(not(any(target_os = "openbsd", target_os = "netbsd", target_os = "freebsd")))]
    #[test]
    fn test_unsupported_elsewhere() {
        assert!(matches!(
            KernelSource.argv(),
            Err(SourceError::Unsupported { source_name: "kernel" })
        ));
        assert!(KernelSource.environment().is_err());
    }

    #[cfg(any(target_os = "openbsd", target_os = "netbsd", target_os = "freebsd"))]
    #[test]
    fn test_kernel_argv_matches_inherited() {
        let argv = KernelSource.argv().unwrap();
        assert_eq!(argv, std::env::args_os().collect::<Vec<_>>());
    }
}
