use std::fs;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::unistd::AccessFlags;

use crate::error::CandidateError;

/// `realpath(3)`: absolute, symlink-free, no `.`/`..`. Fails on a missing
/// component or a symlink loop.
pub(crate) fn canonicalize(candidate: &Path) -> Result<PathBuf, CandidateError> {
    fs::canonicalize(candidate).map_err(|source| CandidateError::Canonicalize {
        path: candidate.to_path_buf(),
        source,
    })
}

/// Regular file that the effective user may execute. The file contents
/// are never inspected.
pub(crate) fn check_executable(path: &Path) -> Result<(), CandidateError> {
    if !path.is_file() {
        return Err(CandidateError::NotAFile(path.to_path_buf()));
    }
    access_effective(path, AccessFlags::X_OK).map_err(|source| CandidateError::NotExecutable {
        path: path.to_path_buf(),
        source,
    })
}

/// `access(2)` judged by the effective uid/gid rather than the real ones.
#[cfg(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
))]
fn access_effective(path: &Path, mode: AccessFlags) -> Result<(), Errno> {
    use nix::fcntl::AtFlags;
    nix::unistd::faccessat(None, path, mode, AtFlags::AT_EACCESS)
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
)))]
fn access_effective(path: &Path, mode: AccessFlags) -> Result<(), Errno> {
    // real uid only; identical unless the process is set-id
    nix::unistd::access(path, mode)
}

pub(crate) fn canonical_executable(candidate: &Path) -> Result<PathBuf, CandidateError> {
    let path = canonicalize(candidate)?;
    check_executable(&path)?;
    Ok(path)
}
