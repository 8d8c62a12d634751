use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::source::SourceKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Data sources in preference order.
    pub sources: Vec<SourceKind>,
    /// Consult the shell's `_` variable once the other strategies fail.
    pub shell_hint: bool,
    /// Try `OLDPWD` when `PWD` is unset or does not hold the program.
    pub oldpwd_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            sources: vec![SourceKind::Kernel, SourceKind::Inherited],
            shell_hint: true,
            oldpwd_fallback: true,
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path).map_err(ConfigError::Io)?;
        let mut src = String::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(ConfigError::Io)?;
            src.push_str(&line);
            src.push('\n');
        }
        Self::load_from_str(&src)
    }

    /// Reads `key=value` lines. Blank lines and `#` comments are skipped;
    /// keys left out keep their defaults.
    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut sources = None;
        let mut shell_hint = None;
        let mut oldpwd_fallback = None;

        for (lineno, line) in src.lines().enumerate() {
            let lineno = lineno + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse(format!("Line {}: No '=' found: {}", lineno, line)));
            };
            let value = value.trim();

            match key.trim() {
                "sources" => sources = Some(parse_sources(value, lineno)?),
                "shell_hint" => shell_hint = Some(parse_bool(value, lineno)?),
                "oldpwd_fallback" => oldpwd_fallback = Some(parse_bool(value, lineno)?),
                k => return Err(ConfigError::Parse(format!("Line {}: Unknown key: {}", lineno, k))),
            }
        }

        let default = ConfigLoader::default_config();
        Ok(Config {
            sources: sources.unwrap_or(default.sources),
            shell_hint: shell_hint.unwrap_or(default.shell_hint),
            oldpwd_fallback: oldpwd_fallback.unwrap_or(default.oldpwd_fallback),
        })
    }
}

fn parse_bool(value: &str, lineno: usize) -> Result<bool, ConfigError> {
    match value {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::Parse(format!("Line {}: Invalid bool: {}", lineno, value))),
    }
}

fn parse_sources(value: &str, lineno: usize) -> Result<Vec<SourceKind>, ConfigError> {
    let mut sources = Vec::new();
    for name in value.split(',') {
        let kind = name
            .parse::<SourceKind>()
            .map_err(|e| ConfigError::Parse(format!("Line {}: {}", lineno, e)))?;
        if !sources.contains(&kind) {
            sources.push(kind);
        }
    }
    Ok(sources)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = ConfigLoader::load_from_str("").unwrap();
        assert_eq!(config, ConfigLoader::default_config());
        assert_eq!(config.sources, vec![SourceKind::Kernel, SourceKind::Inherited]);
    }

    #[test]
    fn test_load_all_keys() {
        let src = "\
# prefer the inherited environment
sources = inherited, kernel, inherited
shell_hint=false

oldpwd_fallback = no
";
        let config = ConfigLoader::load_from_str(src).unwrap();
        assert_eq!(config.sources, vec![SourceKind::Inherited, SourceKind::Kernel]);
        assert!(!config.shell_hint);
        assert!(!config.oldpwd_fallback);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = ConfigLoader::load_from_str("shell_hint=true\nbogus").unwrap_err();
        assert!(err.to_string().contains("Line 2: No '=' found"));

        let err = ConfigLoader::load_from_str("\n\ncolor=red").unwrap_err();
        assert!(err.to_string().contains("Line 3: Unknown key: color"));

        let err = ConfigLoader::load_from_str("shell_hint=maybe").unwrap_err();
        assert!(err.to_string().contains("Line 1: Invalid bool: maybe"));

        let err = ConfigLoader::load_from_str("sources=kernel,procfs").unwrap_err();
        assert!(err.to_string().contains("unknown source: procfs"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sources=inherited").unwrap();
        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.sources, vec![SourceKind::Inherited]);
        assert!(config.shell_hint);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from_file(dir.path().join("none.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
