//! On-disk store: one file per key
//!
//! Keys are encoded into file names (`[A-Za-z0-9_-]` kept verbatim, every
//! other byte written as `%XX`) with a `.json` extension. Writes go to a
//! hidden temporary file first and are renamed into place, so a reader never
//! observes a half-written value.

use crate::{KeyValueStore, Result, StoreError};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const EXTENSION: &str = "json";

/// Store keeping each key in its own file under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) a store rooted at `dir`
    ///
    /// ```rust,no_run
    /// use quranstore::FileStore;
    ///
    /// let store = FileStore::new(".quran/store")?;
    /// # Ok::<(), quranstore::StoreError>(())
    /// ```
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io("", e))?;
            info!("Created store directory: {}", dir.display());
        }

        Ok(Self { dir })
    }

    /// Root directory of the store
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", encode_key(key), EXTENSION)))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.tmp", encode_key(key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                Err(StoreError::InvalidValue(key.to_string()))
            }
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let temp = self.temp_path_for(key);

        fs::write(&temp, value)
            .await
            .map_err(|e| StoreError::io(key, e))?;
        fs::rename(&temp, &path)
            .await
            .map_err(|e| StoreError::io(key, e))?;

        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove_all(&self, keys: &[String]) -> Result<usize> {
        let mut removed = 0;

        for key in keys {
            let path = self.path_for(key)?;
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(key, e)),
            }
        }

        debug!("Removed {} of {} keys", removed, keys.len());
        Ok(removed)
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::io("", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io("", e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            if let Some(stem) = name.strip_suffix(".json") {
                if let Some(key) = decode_key(stem) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// Bytes written as `%XX` in file names: everything but `[A-Za-z0-9_-]`
const KEY_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ESCAPES).to_string()
}

fn decode_key(encoded: &str) -> Option<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}
