//! Persistent collection store.
//!
//! Each collection (or scalar) lives in its own JSON file under the data
//! directory, addressed by key. Reads degrade to a caller-supplied default
//! on any failure; writes are atomic (locked temp file + fsync + rename)
//! and propagate failures to the caller.

use crate::Result;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Collection and scalar keys persisted by the store.
pub mod keys {
    pub const EXERCISES: &str = "exercises";
    pub const TEMPLATES: &str = "templates";
    pub const LOCATIONS: &str = "locations";
    pub const WORKOUTS: &str = "workouts";
    pub const SETS: &str = "sets";
    pub const SETTINGS: &str = "settings";
    pub const SUPPLEMENTS: &str = "supplements";
    pub const INTAKES: &str = "intakes";
    pub const ROUTINES: &str = "routines";
    pub const INITIALIZED: &str = "initialized";
    pub const MIGRATION_VERSION: &str = "migration_version";
}

/// File-backed key/collection store.
///
/// Each collection write is atomic in isolation; there are no
/// cross-collection transactions. Concurrent callers touching the same
/// collection must serialize read-modify-write cycles themselves.
#[derive(Clone, Debug)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Read the value stored under `key`, or `default` if the file is
    /// missing, unreadable or unparseable. Read failures are logged and
    /// never propagated; corruption degrades to "empty", not a crash.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let path = self.path_for(key);
        if !path.exists() {
            return default;
        }

        let contents = match read_locked(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}. Using default.", path, e);
                return default;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}. Using default.", path, e);
                default
            }
        }
    }

    /// Write `value` under `key` atomically:
    /// 1. Serialize to a locked temp file in the store directory
    /// 2. Sync to disk
    /// 3. Rename over the previous file
    ///
    /// A failed persist must be visible to the caller, so errors propagate.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path_for(key);

        let temp = NamedTempFile::new_in(&self.root)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(value)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&path).map_err(|e| crate::Error::Io(e.error))?;

        tracing::debug!("Wrote collection {:?}", path);
        Ok(())
    }

    /// Whether a value has ever been stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }
}

fn read_locked(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let result = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let _ = file.unlock();
    result?;
    Ok(contents)
}
