//! Picks the backing file for a call.
//!
//! Three tiers, first hit wins: a non-empty path passed by the caller, a
//! non-empty `PERSISTENT_FILE` environment variable, then `.persistR.json` in
//! the user's home directory. Resolution never fails.
//!
//! Implement [`PathResolver`] to swap the policy out, or hand [`EnvResolver`] a
//! fake [`Environment`] in tests.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable consulted when the caller gives no path.
pub const DEFAULT_ENV_VAR: &str = "PERSISTENT_FILE";

/// File name used under the home directory when nothing else is configured.
pub const DEFAULT_FILE_NAME: &str = ".persistR.json";

/// Which tier supplied the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSource {
    /// Passed explicitly to the call.
    Caller,
    /// Read from an environment variable.
    Environment {
        /// Name of the variable.
        var: String,
    },
    /// Fixed default under the home directory.
    Default,
}

impl PathSource {
    /// How to point the store somewhere else, for error messages.
    pub fn remedy(&self) -> String {
        match self {
            PathSource::Caller => {
                "Check the path argument, or write a key there first to create the store".into()
            }
            PathSource::Environment { var } => format!(
                "Point {var} at an existing store, unset it, or pass a path explicitly"
            ),
            PathSource::Default => format!(
                "Pass a path explicitly or set {DEFAULT_ENV_VAR} to an existing store file"
            ),
        }
    }
}

impl std::fmt::Display for PathSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSource::Caller => write!(f, "was passed explicitly by the caller"),
            PathSource::Environment { var } => {
                write!(f, "was taken from the {var} environment variable")
            }
            PathSource::Default => write!(
                f,
                "is the built-in default ({DEFAULT_FILE_NAME} in the home directory)"
            ),
        }
    }
}

/// A resolved backing-file path and the tier it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Where the snapshot lives.
    pub path: PathBuf,
    /// Which tier picked it.
    pub source: PathSource,
}

/// Decides which file backs a call.
pub trait PathResolver {
    /// Resolve the backing file. `explicit` is the caller's override, if any.
    fn resolve(&self, explicit: Option<&Path>) -> ResolvedPath;

    /// Reject unusable settings up front. Called once by the store builder.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Read access to process-level settings. Swappable so tests never touch the
/// real environment.
pub trait Environment {
    /// Value of the variable `name`, if set and valid unicode.
    fn var(&self, name: &str) -> Option<String>;

    /// The current user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// The real process environment plus [`dirs::home_dir`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// Caller path, then environment variable, then home-directory default.
#[derive(Debug, Clone)]
pub struct EnvResolver<E = SystemEnvironment> {
    env: E,
    var: String,
    file_name: String,
}

impl EnvResolver<SystemEnvironment> {
    /// Resolver over the real process environment.
    pub fn system() -> Self {
        Self::with_environment(SystemEnvironment)
    }
}

impl Default for EnvResolver<SystemEnvironment> {
    fn default() -> Self {
        Self::system()
    }
}

impl<E: Environment> EnvResolver<E> {
    /// Resolver over a custom environment source.
    pub fn with_environment(env: E) -> Self {
        Self {
            env,
            var: DEFAULT_ENV_VAR.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    /// Consult a different environment variable (default `PERSISTENT_FILE`).
    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        self.var = name.into();
        self
    }

    /// Use a different default file name under the home directory.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Name of the environment variable this resolver reads.
    pub fn var_name(&self) -> &str {
        &self.var
    }

    fn default_path(&self) -> PathBuf {
        match self.env.home_dir() {
            Some(home) => home.join(&self.file_name),
            None => {
                log::warn!(
                    "no home directory found; falling back to {} in the working directory",
                    self.file_name
                );
                PathBuf::from(&self.file_name)
            }
        }
    }
}

impl<E: Environment> PathResolver for EnvResolver<E> {
    fn validate(&self) -> Result<()> {
        if self.var.is_empty() || self.var.contains(['=', '\0']) {
            return Err(Error::Config(format!(
                "invalid environment variable name {:?}",
                self.var
            )));
        }
        if self.file_name.is_empty() {
            return Err(Error::Config("default file name must not be empty".into()));
        }
        Ok(())
    }

    fn resolve(&self, explicit: Option<&Path>) -> ResolvedPath {
        let (path, source) = match explicit.filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => (p.to_path_buf(), PathSource::Caller),
            None => match self.env.var(&self.var).filter(|v| !v.is_empty()) {
                Some(v) => (
                    PathBuf::from(v),
                    PathSource::Environment {
                        var: self.var.clone(),
                    },
                ),
                None => (self.default_path(), PathSource::Default),
            },
        };
        let path = absolutize(path);
        log::debug!("resolved store path {} ({source:?})", path.display());
        ResolvedPath { path, source }
    }
}

/// Always answers with the same file, unless the caller overrides it.
#[derive(Debug, Clone)]
pub struct FixedResolver(pub PathBuf);

impl PathResolver for FixedResolver {
    fn resolve(&self, explicit: Option<&Path>) -> ResolvedPath {
        match explicit.filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => ResolvedPath {
                path: absolutize(p.to_path_buf()),
                source: PathSource::Caller,
            },
            None => ResolvedPath {
                path: absolutize(self.0.clone()),
                source: PathSource::Default,
            },
        }
    }
}

// Falls back to the path as given if the working directory is unreadable.
fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}
