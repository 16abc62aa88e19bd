use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// The independently persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Applications,
    Files,
    Usage,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Applications, Collection::Files, Collection::Usage];

    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Applications => "apps.json",
            Collection::Files => "files.json",
            Collection::Usage => "usage.json",
        }
    }
}

/// Whole-document JSON snapshots, one file per collection.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(path = %dir.display(), error = %e, "cannot create cache directory");
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    /// Reads a collection. A missing file is an empty collection, not an error.
    pub fn load<T>(&self, collection: Collection) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(collection);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replaces a collection on disk.
    ///
    /// The document is written next to the target and renamed over it, so a
    /// crash mid-write leaves the previous snapshot intact.
    pub fn save<T>(&self, collection: Collection, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(collection);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
