//! Core store type and builder.
//!
//! Every call is a full round trip: resolve the path, load the whole snapshot,
//! apply at most one mutation, write the whole snapshot back. Nothing is cached
//! between calls.

use crate::error::{Error, Result};
use crate::lock::{self, LockGuard, LockMode};
use crate::persist::{self, WriteMode};
use crate::resolve::{EnvResolver, Environment, PathResolver, ResolvedPath};
use crate::serializer::JsonSerializer;
use crate::Mapping;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// What [`Store::set`] should do with a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert or replace the entry wholesale.
    Put(Value),
    /// Drop the entry. Absent keys are a no-op.
    Remove,
}

impl From<Value> for Mutation {
    fn from(v: Value) -> Self {
        Mutation::Put(v)
    }
}

impl From<Option<Value>> for Mutation {
    fn from(v: Option<Value>) -> Self {
        match v {
            Some(v) => Mutation::Put(v),
            None => Mutation::Remove,
        }
    }
}

/// Result of [`Store::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// No key was asked for: every key in the snapshot, in file order.
    Keys(Vec<String>),
    /// The value under the requested key, `None` if it isn't there.
    Value(Option<Value>),
}

impl Fetched {
    /// The key list, if this came from a keyless lookup.
    pub fn into_keys(self) -> Option<Vec<String>> {
        match self {
            Fetched::Keys(k) => Some(k),
            Fetched::Value(_) => None,
        }
    }

    /// The looked-up value. `None` for a missing key or a key listing.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Fetched::Value(v) => v,
            Fetched::Keys(_) => None,
        }
    }
}

/// Persistent key-value stash backed by one JSON file.
///
/// Generic over the [`PathResolver`] that picks the file; the default reads
/// `PERSISTENT_FILE` and falls back to `~/.persistR.json`.
///
/// No locking by default: two processes calling [`set`](Self::set) on the same
/// file at once race, and the last save wins. Turn on
/// [`advisory_lock`](StoreBuilder::advisory_lock) if every writer uses this crate.
pub struct Store<R = EnvResolver> {
    resolver: R,
    serializer: JsonSerializer,
    write_mode: WriteMode,
    locking: bool,
}

impl Store<EnvResolver> {
    /// Store over the real environment with compact JSON and atomic writes.
    pub fn new() -> Self {
        Self {
            resolver: EnvResolver::system(),
            serializer: JsonSerializer::new(),
            write_mode: WriteMode::Atomic,
            locking: false,
        }
    }

    /// Start configuring a new store. Call [`.build()`](StoreBuilder::build)
    /// when ready.
    pub fn builder() -> StoreBuilder<EnvResolver> {
        StoreBuilder::new()
    }
}

impl Default for Store<EnvResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PathResolver> Store<R> {
    /// Which file a call with `path` would hit, and why.
    #[must_use]
    pub fn resolve(&self, path: Option<&Path>) -> ResolvedPath {
        self.resolver.resolve(path)
    }

    // ---- writes ----

    /// Put or remove `key` and save the snapshot. Returns the file written.
    ///
    /// A missing file starts as an empty mapping. Removing a key that isn't
    /// there still rewrites the file with unchanged content.
    pub fn set(
        &self,
        key: &str,
        value: impl Into<Mutation>,
        path: Option<&Path>,
    ) -> Result<PathBuf> {
        let ResolvedPath { path, .. } = self.resolver.resolve(path);
        let _guard = self.lock(&path, LockMode::Exclusive)?;

        let mut map = persist::load(&path, &self.serializer)?.unwrap_or_default();
        apply(&mut map, key, value.into());
        persist::save(&path, &map, &self.serializer, self.write_mode)?;
        Ok(path)
    }

    /// Serialize `value` and store it under `key`.
    pub fn put<T>(&self, key: &str, value: &T, path: Option<&Path>) -> Result<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        let v = serde_json::to_value(value).map_err(|e| Error::Serialize(e.to_string()))?;
        self.set(key, Mutation::Put(v), path)
    }

    /// Drop `key`. Fine if it was never there.
    pub fn remove(&self, key: &str, path: Option<&Path>) -> Result<PathBuf> {
        self.set(key, Mutation::Remove, path)
    }

    // ---- reads ----

    /// Look up `key`, or list every key when `key` is `None`.
    ///
    /// Unlike [`set`](Self::set), a missing file is an error: there is nothing
    /// to read, and the path was probably misconfigured. A path that can't be
    /// checked at all (unreadable parent directory, etc.) is an I/O error.
    #[must_use = "the lookup result carries the value or the error"]
    pub fn get(&self, key: Option<&str>, path: Option<&Path>) -> Result<Fetched> {
        let resolved = self.resolver.resolve(path);
        match resolved.path.try_exists() {
            Ok(true) => {}
            Ok(false) => return Err(missing(resolved)),
            Err(e) => return Err(Error::io_at(&resolved.path, e)),
        }
        let _guard = self.lock(&resolved.path, LockMode::Shared)?;

        let map = match persist::load(&resolved.path, &self.serializer)? {
            Some(map) => map,
            None => return Err(missing(resolved)),
        };
        Ok(match key {
            None => Fetched::Keys(map.keys().cloned().collect()),
            Some(k) => Fetched::Value(map.get(k).cloned()),
        })
    }

    /// Value under `key`, `None` if absent.
    #[must_use = "the lookup result carries the value or the error"]
    pub fn get_value(&self, key: &str, path: Option<&Path>) -> Result<Option<Value>> {
        self.get(Some(key), path).map(Fetched::into_value)
    }

    /// Value under `key`, decoded into `T`.
    #[must_use = "the lookup result carries the value or the error"]
    pub fn get_as<T>(&self, key: &str, path: Option<&Path>) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get_value(key, path)? {
            Some(v) => serde_json::from_value(v)
                .map(Some)
                .map_err(|e| Error::Deserialize(format!("value under {key:?}: {e}"))),
            None => Ok(None),
        }
    }

    /// Every key in the snapshot.
    #[must_use = "the lookup result carries the value or the error"]
    pub fn keys(&self, path: Option<&Path>) -> Result<Vec<String>> {
        self.get(None, path).map(|f| f.into_keys().unwrap_or_default())
    }

    // ---- internal ----

    fn lock(&self, path: &Path, mode: LockMode) -> Result<Option<LockGuard>> {
        if self.locking {
            lock::acquire(path, mode).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<R> std::fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("pretty", &self.serializer.is_pretty())
            .field("write_mode", &self.write_mode)
            .field("locking", &self.locking)
            .finish_non_exhaustive()
    }
}

fn apply(map: &mut Mapping, key: &str, mutation: Mutation) {
    match mutation {
        Mutation::Put(v) => {
            let replaced = map.insert(key.to_string(), v).is_some();
            log::trace!("put {key:?} (replaced: {replaced})");
        }
        Mutation::Remove => {
            // shift_remove keeps the remaining entries in file order
            let removed = map.shift_remove(key).is_some();
            log::trace!("remove {key:?} (was present: {removed})");
        }
    }
}

fn missing(resolved: ResolvedPath) -> Error {
    log::debug!(
        "read of missing store {} ({:?})",
        resolved.path.display(),
        resolved.source
    );
    Error::MissingFile {
        path: resolved.path,
        source: resolved.source,
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures a [`Store`].
///
/// ```rust,no_run
/// use keystash::{Store, WriteMode};
///
/// let stash = Store::builder()
///     .pretty(true)
///     .write_mode(WriteMode::Atomic)
///     .build()
///     .unwrap();
/// ```
pub struct StoreBuilder<R> {
    resolver: R,
    pretty: bool,
    write_mode: WriteMode,
    locking: bool,
}

impl StoreBuilder<EnvResolver> {
    fn new() -> Self {
        Self {
            resolver: EnvResolver::system(),
            pretty: false,
            write_mode: WriteMode::Atomic,
            locking: false,
        }
    }
}

impl<R> StoreBuilder<R> {
    /// Write human-readable JSON with indentation (default: compact).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// How snapshots replace the old file (default: [`WriteMode::Atomic`]).
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Hold an advisory lock across each load/save span (default: off).
    pub fn advisory_lock(mut self, yes: bool) -> Self {
        self.locking = yes;
        self
    }

    /// Swap in a different path resolver.
    pub fn resolver<R2: PathResolver>(self, resolver: R2) -> StoreBuilder<R2> {
        StoreBuilder {
            resolver,
            pretty: self.pretty,
            write_mode: self.write_mode,
            locking: self.locking,
        }
    }
}

impl<E: Environment> StoreBuilder<EnvResolver<E>> {
    /// Read a different environment variable instead of `PERSISTENT_FILE`.
    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        self.resolver = self.resolver.env_var(name);
        self
    }
}

impl<R: PathResolver> StoreBuilder<R> {
    /// Finish configuration. Fails if the resolver's settings are unusable.
    pub fn build(self) -> Result<Store<R>> {
        self.resolver.validate()?;
        let serializer = if self.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };
        Ok(Store {
            resolver: self.resolver,
            serializer,
            write_mode: self.write_mode,
            locking: self.locking,
        })
    }
}

impl<R> std::fmt::Debug for StoreBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("pretty", &self.pretty)
            .field("write_mode", &self.write_mode)
            .field("locking", &self.locking)
            .finish_non_exhaustive()
    }
}
