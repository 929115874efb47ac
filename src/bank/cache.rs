//! Persistent cache of parsed bank tables.
//!
//! Parsing the spreadsheet is the expensive part of building a registry, so
//! parsed tables are stored as JSON next to the source file. Each cache lives
//! in its own directory named after the source file's modification time: a
//! refreshed source file gets a new directory and is never served a parse of
//! the old one. Entries also carry an expiry time.
//!
//! Two entries are stored per directory, `banks` and `prefixToBankCode`.
//! Cache failures never fail a lookup; they are logged and treated as a miss.

use super::{BankRecord, BankTable};
use crate::error::RegistryError;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

const BANKS_KEY: &str = "banks";
const PREFIXES_KEY: &str = "prefixToBankCode";

/// A persisted value with its expiry time (Unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Unix timestamp after which the entry is stale.
    pub expires_at: i64,
    /// The cached value.
    pub value: T,
}

impl<T> CacheEntry<T> {
    /// Creates an entry expiring `ttl` from now.
    pub fn new(value: T, ttl: Duration) -> Self {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            expires_at: Utc::now().timestamp().saturating_add(ttl),
            value,
        }
    }

    /// Returns true if the entry has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Returns true if the entry is expired at the given Unix time.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Derives a cache key from a source file's modification time.
///
/// The key is in nanoseconds so a file replaced within the same second as
/// its predecessor still gets a fresh key.
pub fn cache_key(modified: SystemTime) -> u64 {
    modified
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// File-backed cache of parsed bank tables.
#[derive(Debug, Clone)]
pub struct RegistryCache {
    root: PathBuf,
    namespace: String,
}

impl RegistryCache {
    /// Creates a cache under `root`.
    ///
    /// `namespace` separates caches of different source files sharing the
    /// same root.
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
        }
    }

    /// Returns the directory holding entries for `key`.
    pub fn dir_for(&self, key: u64) -> PathBuf {
        self.root.join(format!("{}{}", self.dir_prefix(), key))
    }

    fn dir_prefix(&self) -> String {
        format!(".cache-norwegianbanks-{}-", self.namespace)
    }

    /// Removes this namespace's cache directories for keys other than `keep`.
    ///
    /// Failures are logged; directories of other namespaces are untouched.
    pub fn prune(&self, keep: u64) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "cannot list bank table caches");
                return;
            }
        };

        let prefix = self.dir_prefix();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let key = name
                .to_str()
                .and_then(|n| n.strip_prefix(prefix.as_str()))
                .and_then(|k| k.parse::<u64>().ok());

            let path = entry.path();
            match key {
                Some(key) if key != keep && path.is_dir() => match fs::remove_dir_all(&path) {
                    Ok(()) => debug!(dir = %path.display(), "removed outdated bank table cache"),
                    Err(e) => {
                        warn!(dir = %path.display(), error = %e, "cannot remove outdated bank table cache")
                    }
                },
                _ => {}
            }
        }
    }

    /// Returns the cached table for `key`, if present and unexpired.
    ///
    /// Unreadable or inconsistent entries count as a miss.
    pub fn get(&self, key: u64) -> Option<BankTable> {
        let dir = self.dir_for(key);
        match self.read_table(&dir) {
            Ok(Some(table)) => Some(table),
            Ok(None) => None,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "ignoring unreadable bank table cache");
                None
            }
        }
    }

    /// Stores a table under `key` with the given TTL.
    ///
    /// Directories left behind by earlier keys of this namespace are removed
    /// once the new entries are written.
    pub fn put(&self, key: u64, table: &BankTable, ttl: Duration) -> Result<(), RegistryError> {
        let dir = self.dir_for(key);
        fs::create_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;

        write_entry(
            &dir.join(BANKS_KEY),
            &CacheEntry::new(table.banks().to_vec(), ttl),
        )?;
        write_entry(
            &dir.join(PREFIXES_KEY),
            &CacheEntry::new(table.prefix_pairs(), ttl),
        )?;

        debug!(dir = %dir.display(), "stored bank table cache");
        self.prune(key);
        Ok(())
    }

    /// Returns the cached table for `key`, building and storing it on a miss.
    ///
    /// Only an error from `build` is returned; failing to store the result
    /// is logged.
    pub fn get_or_build<F>(
        &self,
        key: u64,
        ttl: Duration,
        build: F,
    ) -> Result<BankTable, RegistryError>
    where
        F: FnOnce() -> Result<BankTable, RegistryError>,
    {
        if let Some(table) = self.get(key) {
            debug!(key, "bank table cache hit");
            return Ok(table);
        }

        info!(key, "bank table cache miss, parsing source");
        let table = build()?;

        if let Err(e) = self.put(key, &table, ttl) {
            warn!(error = %e, "failed to store bank table cache");
        }

        Ok(table)
    }

    fn read_table(&self, dir: &Path) -> Result<Option<BankTable>, RegistryError> {
        let banks: Option<Vec<BankRecord>> = read_entry(&dir.join(BANKS_KEY))?;
        let prefixes: Option<Vec<(String, String)>> = read_entry(&dir.join(PREFIXES_KEY))?;

        match (banks, prefixes) {
            (Some(banks), Some(prefixes)) => BankTable::from_parts(banks, prefixes)
                .map(Some)
                .map_err(RegistryError::Parse),
            _ => Ok(None),
        }
    }
}

/// Reads an entry, returning `None` if it is missing or expired.
fn read_entry<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RegistryError> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RegistryError::io(path, e)),
    };

    let entry: CacheEntry<T> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| RegistryError::Parse(format!("{}: {}", path.display(), e)))?;

    if entry.is_expired() {
        return Ok(None);
    }
    Ok(Some(entry.value))
}

/// Writes an entry through a temporary file so readers never see it half written.
fn write_entry<T: Serialize>(path: &Path, entry: &CacheEntry<T>) -> Result<(), RegistryError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| RegistryError::io(dir, e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer(&mut writer, entry)
            .map_err(|e| RegistryError::io(path, io::Error::other(e)))?;
        writer.flush().map_err(|e| RegistryError::io(path, e))?;
    }

    tmp.persist(path)
        .map_err(|e| RegistryError::io(path, e.error))?;
    Ok(())
}
