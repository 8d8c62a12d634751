use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::config::{Config, ConfigLoader};
use crate::environment::EnvironmentSnapshot;
use crate::error::{ResolveError, SourceError};
use crate::resolver::probe;
use crate::resolver::strategy::{Resolution, Strategy};
use crate::source::ProcessInfo;

/// Finds the on-disk location of the running executable.
///
/// Each call takes fresh snapshots of argv and the environment and owns
/// every buffer it builds, so one resolver can be shared between threads.
pub struct ExecutableResolver {
    sources: Vec<Box<dyn ProcessInfo>>,
    shell_hint: bool,
    oldpwd_fallback: bool,
}

impl ExecutableResolver {
    pub fn new() -> Self {
        Self::with_config(&ConfigLoader::default_config())
    }

    pub fn with_config(config: &Config) -> Self {
        ExecutableResolver {
            sources: config.sources.iter().map(|kind| kind.into_source()).collect(),
            shell_hint: config.shell_hint,
            oldpwd_fallback: config.oldpwd_fallback,
        }
    }

    /// Uses `sources`, in order, instead of the configured built-ins.
    pub fn with_sources(sources: Vec<Box<dyn ProcessInfo>>) -> Self {
        let default = ConfigLoader::default_config();
        ExecutableResolver {
            sources,
            shell_hint: default.shell_hint,
            oldpwd_fallback: default.oldpwd_fallback,
        }
    }

    pub fn shell_hint(mut self, enabled: bool) -> Self {
        self.shell_hint = enabled;
        self
    }

    pub fn oldpwd_fallback(mut self, enabled: bool) -> Self {
        self.oldpwd_fallback = enabled;
        self
    }

    pub fn resolve(&self) -> Result<PathBuf, ResolveError> {
        self.resolve_detailed().map(|resolution| resolution.path)
    }

    pub fn resolve_detailed(&self) -> Result<Resolution, ResolveError> {
        let argv = self
            .capture(|source| source.argv())
            .map_err(ResolveError::EnvironmentUnavailable)?;
        let argv0 = argv
            .into_iter()
            .next()
            .filter(|arg| !arg.is_empty())
            .ok_or(ResolveError::InvalidArgv0)?;
        let program = PathBuf::from(&argv0);

        if program.is_absolute() {
            if let Some(path) = self.attempt(Strategy::AbsoluteArgv0, &program, false) {
                return Ok(Resolution::new(path, Strategy::AbsoluteArgv0));
            }
        }

        let env = self
            .capture(|source| source.environment())
            .map_err(ResolveError::EnvironmentUnavailable)?;
        let bases = self.working_bases(&env);

        if !program.is_absolute() && has_separator(&argv0) {
            for base in &bases {
                let candidate = base.join(&program);
                if let Some(path) = self.attempt(Strategy::RelativeArgv0, &candidate, false) {
                    return Ok(Resolution::new(path, Strategy::RelativeArgv0));
                }
            }
        }

        if !has_separator(&argv0) {
            if let Some(path) = self.search_path(&program, &env, &bases) {
                return Ok(Resolution::new(path, Strategy::PathSearch));
            }
            if let Some(path) = self.search_working_dir(&program, &env) {
                return Ok(Resolution::new(path, Strategy::WorkingDirectory));
            }
        }

        if self.shell_hint {
            if let Some(path) = self.search_shell_hint(&program, &env) {
                return Ok(Resolution::new(path, Strategy::ShellRecorded));
            }
        }

        debug!(program = %program.display(), "all strategies exhausted");
        Err(ResolveError::NotFound { program: argv0 })
    }

    /// Asks each source in turn, returning the first answer.
    fn capture<T>(
        &self,
        query: impl Fn(&dyn ProcessInfo) -> Result<T, SourceError>,
    ) -> Result<T, SourceError> {
        let mut last_err = SourceError::NoSources;
        for source in &self.sources {
            match query(source.as_ref()) {
                Ok(value) => {
                    trace!(source = source.name(), "source answered");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(source = source.name(), error = %err, "source failed, trying next");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    /// Absolute directories relative candidates are anchored to: `PWD`
    /// from the snapshot, then the process working directory.
    fn working_bases(&self, env: &EnvironmentSnapshot) -> Vec<PathBuf> {
        let mut bases = Vec::new();
        if let Some(pwd) = env.get_non_empty("PWD").map(PathBuf::from) {
            if pwd.is_absolute() {
                bases.push(pwd);
            }
        }
        let cwd = self
            .sources
            .iter()
            .find_map(|source| source.current_dir());
        if let Some(cwd) = cwd {
            if !bases.contains(&cwd) {
                bases.push(cwd);
            }
        }
        bases
    }

    fn search_path(
        &self,
        program: &Path,
        env: &EnvironmentSnapshot,
        bases: &[PathBuf],
    ) -> Option<PathBuf> {
        let dirs = env.path_dirs();
        if dirs.is_empty() {
            debug!("PATH is absent or empty");
            return None;
        }
        for dir in dirs {
            let dir = if dir.is_absolute() {
                dir
            } else {
                match bases.first() {
                    Some(base) => base.join(dir),
                    None => continue,
                }
            };
            let candidate = dir.join(program);
            if let Some(path) = self.attempt(Strategy::PathSearch, &candidate, true) {
                return Some(path);
            }
        }
        None
    }

    /// `PWD`, then `OLDPWD`; relative values are ignored.
    fn search_working_dir(&self, program: &Path, env: &EnvironmentSnapshot) -> Option<PathBuf> {
        let mut keys = vec!["PWD"];
        if self.oldpwd_fallback {
            keys.push("OLDPWD");
        }
        keys.into_iter()
            .filter_map(|key| env.get_non_empty(key).map(Path::new))
            .filter(|dir| dir.is_absolute())
            .find_map(|dir| self.attempt(Strategy::WorkingDirectory, &dir.join(program), true))
    }

    /// `_` only counts when it is absolute and ends in the program's name.
    fn search_shell_hint(&self, program: &Path, env: &EnvironmentSnapshot) -> Option<PathBuf> {
        let hint = Path::new(env.get_non_empty("_")?);
        if !hint.is_absolute() {
            trace!(hint = %hint.display(), "ignoring relative shell hint");
            return None;
        }
        if hint.file_name().is_none() || hint.file_name() != program.file_name() {
            trace!(hint = %hint.display(), "shell hint names another program");
            return None;
        }
        self.attempt(Strategy::ShellRecorded, hint, true)
    }

    fn attempt(&self, strategy: Strategy, candidate: &Path, executable: bool) -> Option<PathBuf> {
        let result = if executable {
            probe::canonical_executable(candidate)
        } else {
            probe::canonicalize(candidate)
        };
        match result {
            Ok(path) => {
                debug!(%strategy, candidate = %candidate.display(), path = %path.display(), "resolved");
                Some(path)
            }
            Err(err) => {
                trace!(%strategy, error = %err, "candidate rejected");
                None
            }
        }
    }
}

impl Default for ExecutableResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn has_separator(arg: &OsString) -> bool {
    arg.as_bytes().contains(&b'/')
}
