//! Process-information sources.
//!
//! A source answers the two questions resolution depends on: what argv
//! the process was started with, and what its environment looked like.
//! Sources are consulted in preference order; a failing source hands over
//! to the next one.

mod kernel;

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::environment::EnvironmentSnapshot;
use crate::error::SourceError;

pub use kernel::KernelSource;

pub trait ProcessInfo: Send + Sync {
    fn name(&self) -> &'static str;
    fn argv(&self) -> Result<Vec<OsString>, SourceError>;
    fn environment(&self) -> Result<EnvironmentSnapshot, SourceError>;

    /// Working directory used to anchor relative candidates when `PWD`
    /// cannot.
    fn current_dir(&self) -> Option<PathBuf> {
        std::env::current_dir().ok()
    }
}

/// The argv and environment this process inherited from its parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct InheritedSource;

impl ProcessInfo for InheritedSource {
    fn name(&self) -> &'static str {
        "inherited"
    }

    fn argv(&self) -> Result<Vec<OsString>, SourceError> {
        Ok(std::env::args_os().collect())
    }

    fn environment(&self) -> Result<EnvironmentSnapshot, SourceError> {
        Ok(EnvironmentSnapshot::capture())
    }
}

/// Caller-supplied process information.
///
/// Any part left unset is reported as unavailable, and no working
/// directory is invented for it.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    argv: Option<Vec<OsString>>,
    env: Option<EnvironmentSnapshot>,
    cwd: Option<PathBuf>,
}

impl StaticSource {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        StaticSource {
            argv: Some(argv.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// A source that can answer nothing.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn env(mut self, env: EnvironmentSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl ProcessInfo for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn argv(&self) -> Result<Vec<OsString>, SourceError> {
        self.argv.clone().ok_or(SourceError::Unsupported {
            source_name: self.name(),
        })
    }

    fn environment(&self) -> Result<EnvironmentSnapshot, SourceError> {
        self.env.clone().ok_or(SourceError::Unsupported {
            source_name: self.name(),
        })
    }

    fn current_dir(&self) -> Option<PathBuf> {
        self.cwd.clone()
    }
}

/// Names of the built-in sources, as used in configuration and on the
/// command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Kernel,
    Inherited,
}

impl SourceKind {
    pub fn into_source(self) -> Box<dyn ProcessInfo> {
        match self {
            SourceKind::Kernel => Box::new(KernelSource),
            SourceKind::Inherited => Box::new(InheritedSource),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "kernel" => Ok(SourceKind::Kernel),
            "inherited" => Ok(SourceKind::Inherited),
            other => Err(format!("unknown source: {}", other)),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Kernel => write!(f, "kernel"),
            SourceKind::Inherited => write!(f, "inherited"),
        }
    }
}
