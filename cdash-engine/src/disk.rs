//! # On-Disk Store
//!
//! Sled-backed implementation of `KVStore`. The database is opened once at
//! startup and held for the process lifetime; dropping the handle after a
//! final `flush` closes it.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use cdash_common::{CdashError, CdashResult};

use crate::store::KVStore;

/// Embedded ordered store backed by sled.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledStore {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Errors
    /// Returns `CdashError::Storage` if the directory cannot be created or the
    /// database is locked by another process.
    pub fn open(path: impl AsRef<Path>) -> CdashResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path).map_err(storage_err)?;
        info!(path = %path.display(), records = db.len(), "opened daily store");
        Ok(SledStore { db, path })
    }

    /// Returns the on-disk location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KVStore for SledStore {
    fn get(&self, key: &[u8]) -> CdashResult<Option<Vec<u8>>> {
        let value = self.db.get(key).map_err(storage_err)?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> CdashResult<()> {
        self.db.insert(key, value).map_err(storage_err)?;
        debug!(key = %String::from_utf8_lossy(key), "record written");
        Ok(())
    }

    fn scan(&self) -> CdashResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.db
            .iter()
            .map(|entry| {
                entry
                    .map(|(k, v)| (k.to_vec(), v.to_vec()))
                    .map_err(storage_err)
            })
            .collect()
    }

    fn flush(&self) -> CdashResult<()> {
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }
}

fn storage_err(err: sled::Error) -> CdashError {
    CdashError::Storage(err.to_string())
}
