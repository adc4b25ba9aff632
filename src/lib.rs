//! Tiny persistent key-value stash backed by a single JSON file.
//!
//! Park credentials or config outside your source and read them back on the
//! next run. Each call loads the whole file, applies one change and writes the
//! whole file back.
//!
//! ```rust,no_run
//! use keystash::{Mutation, Store};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let stash = Store::new();
//! let file = Path::new("/tmp/t.dat");
//! stash.set("db:creds", json!({"user": "bob", "port": 3306}), Some(file)).unwrap();
//! let creds = stash.get_value("db:creds", Some(file)).unwrap();
//! stash.set("db:creds", Mutation::Remove, Some(file)).unwrap();
//! ```
//!
//! Without an explicit path the file comes from `PERSISTENT_FILE`, then
//! `~/.persistR.json`.
//!
//! **Single-process at a time.** Concurrent writers to one file lose updates
//! (last save wins) unless every writer enables
//! [`advisory_lock`](StoreBuilder::advisory_lock).

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod lock;
pub mod persist;
pub mod resolve;
pub mod serializer;
pub mod store;

pub use error::{Error, Result};
pub use persist::WriteMode;
pub use resolve::{
    EnvResolver, Environment, FixedResolver, PathResolver, PathSource, ResolvedPath,
    SystemEnvironment,
};
pub use serde_json::Value;
pub use store::{Fetched, Mutation, Store, StoreBuilder};

/// In-memory form of one snapshot. Keeps insertion order.
pub type Mapping = serde_json::Map<String, Value>;
