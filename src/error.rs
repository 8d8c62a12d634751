use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Terminal outcome of a resolution call.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No data source produced argv or an environment, and the absolute
    /// argv[0] strategy could not answer on its own.
    #[error("process environment unavailable: {0}")]
    EnvironmentUnavailable(#[source] SourceError),

    #[error("argument vector is empty or argv[0] is unreadable")]
    InvalidArgv0,

    /// Every strategy was exhausted. `program` is the unresolved argv[0],
    /// left for the caller to use (or not) as its own fallback.
    #[error("executable not found: {}", .program.to_string_lossy())]
    NotFound { program: OsString },
}

/// Why a single candidate was rejected. Never surfaced from `resolve`,
/// only logged while cascading to the next candidate.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("cannot canonicalize {}: {source}", .path.display())]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("{} is not executable: {source}", .path.display())]
    NotExecutable {
        path: PathBuf,
        #[source]
        source: Errno,
    },
}

/// Failure of one process-information source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} source is not supported on this platform")]
    Unsupported { source_name: &'static str },

    #[error("{source_name} query failed: {errno}")]
    Query {
        source_name: &'static str,
        #[source]
        errno: Errno,
    },

    #[error("{source_name} returned malformed data: {reason}")]
    Malformed {
        source_name: &'static str,
        reason: String,
    },

    #[error("no process-information source configured")]
    NoSources,
}
