use std::fmt;
use std::path::PathBuf;

/// The rule that produced a resolved path, in the order rules are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    /// argv[0] was already absolute.
    AbsoluteArgv0,
    /// argv[0] contained a `/` and was joined onto the working directory.
    RelativeArgv0,
    /// Bare argv[0] found by walking `PATH`.
    PathSearch,
    /// Bare argv[0] found in `PWD` (or `OLDPWD`).
    WorkingDirectory,
    /// The shell's `_` variable named the executable.
    ShellRecorded,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::AbsoluteArgv0 => "absolute-argv0",
            Strategy::RelativeArgv0 => "relative-argv0",
            Strategy::PathSearch => "path-search",
            Strategy::WorkingDirectory => "working-directory",
            Strategy::ShellRecorded => "shell-recorded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Absolute, canonical path of the executable.
    pub path: PathBuf,
    pub strategy: Strategy,
}

impl Resolution {
    pub fn new(path: PathBuf, strategy: Strategy) -> Self {
        Resolution { path, strategy }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.strategy)
    }
}
