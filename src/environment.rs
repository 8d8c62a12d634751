use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

/// Owned copy of a process environment, taken once per resolution.
///
/// Edits only ever touch this copy; the live process environment is
/// never written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentSnapshot {
    vars: HashMap<OsString, OsString>,
}

impl EnvironmentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the environment this process inherited.
    pub fn capture() -> Self {
        Self::from_pairs(std::env::vars_os())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        EnvironmentSnapshot { vars }
    }

    /// Parses raw `NAME=value` entries as handed back by the kernel.
    /// Entries without `=` or with an empty name are skipped; the first
    /// occurrence of a name wins, as with `getenv(3)`.
    pub fn from_entries<I, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: AsRef<[u8]>,
    {
        let mut env = EnvironmentSnapshot::new();
        for entry in entries {
            let entry = entry.as_ref();
            let Some(eq) = entry.iter().position(|&b| b == b'=') else {
                continue;
            };
            if eq == 0 {
                continue;
            }
            let key = OsStr::from_bytes(&entry[..eq]).to_os_string();
            let value = OsStr::from_bytes(&entry[eq + 1..]).to_os_string();
            env.vars.entry(key).or_insert(value);
        }
        env
    }

    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(|v| v.as_os_str())
    }

    /// Like `get`, but treats an empty value as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<&OsStr> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<OsString>) {
        self.vars.insert(OsString::from(key), value.into());
    }

    pub fn unset(&mut self, key: &str) {
        self.vars.remove(OsStr::new(key));
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// `PATH` split on `:` in search order. Empty entries are dropped.
    pub fn path_dirs(&self) -> Vec<PathBuf> {
        let Some(path) = self.get("PATH") else {
            return Vec::new();
        };
        path.as_bytes()
            .split(|&b| b == b':')
            .filter(|dir| !dir.is_empty())
            .map(|dir| PathBuf::from(OsStr::from_bytes(dir)))
            .collect()
    }
}
