//! Locate the running executable on systems without `/proc`.
//!
//! Resolution works from the process's argv and environment, read from
//! the kernel where it can be and from the inherited environment
//! otherwise, and tries in order:
//!
//! 1. an absolute `argv[0]`,
//! 2. a relative `argv[0]` joined onto the working directory,
//! 3. a `PATH` search for a bare name,
//! 4. the bare name inside `PWD` (or `OLDPWD`),
//! 5. the shell's `_` variable, when it names the same program.
//!
//! Candidates are canonicalized and, for searched names, checked for
//! execute permission. When nothing matches the caller gets
//! [`ResolveError::NotFound`] rather than an unverified name.

pub mod config;
pub mod environment;
pub mod error;
pub mod resolver;
pub mod source;

use std::path::PathBuf;

pub use config::{Config, ConfigError, ConfigLoader};
pub use environment::EnvironmentSnapshot;
pub use error::{CandidateError, ResolveError, SourceError};
pub use resolver::{ExecutableResolver, Resolution, Strategy};
pub use source::{InheritedSource, KernelSource, ProcessInfo, SourceKind, StaticSource};

/// Absolute path of the running executable, using the default sources.
pub fn resolve() -> Result<PathBuf, ResolveError> {
    ExecutableResolver::new().resolve()
}
