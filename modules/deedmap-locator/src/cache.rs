//! File cache of processed deeds: one JSON snapshot per deed under the cache
//! directory, named by a hash of the step and deed id, expired by mtime.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use deedmap_common::{CacheConfig, DeedMapError, Result};

pub const STEP_KEY: &str = "step4";

pub struct DeedCache {
    dir: PathBuf,
    expiry: Duration,
}

impl DeedCache {
    /// `None` when caching is disabled.
    pub fn new(config: &CacheConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let expiry = i64::try_from(config.expiry_days)
            .ok()
            .and_then(Duration::try_days)
            .unwrap_or(Duration::MAX);
        Some(Self {
            dir: config.dir.clone(),
            expiry,
        })
    }

    /// Hex sha256 of `"{step}_{deed_id}"`.
    pub fn key(step: &str, deed_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(step.as_bytes());
        hasher.update(b"_");
        hasher.update(deed_id.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn path_for(&self, deed_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(STEP_KEY, deed_id)))
    }

    /// A fresh entry for `deed_id`. Missing, expired and unreadable entries
    /// are all misses.
    pub fn load<T: DeserializeOwned>(&self, deed_id: &str) -> Option<T> {
        let path = self.path_for(deed_id);
        match self.try_load(&path) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(deed_id, path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    fn try_load<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let modified: DateTime<Utc> = metadata.modified()?.into();
        let age = Utc::now() - modified;
        if age > self.expiry {
            debug!(path = %path.display(), age_days = age.num_days(), "Cache entry expired");
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write-then-rename so readers never see a partial file. Failures are
    /// logged and swallowed.
    pub fn save<T: Serialize>(&self, deed_id: &str, value: &T) {
        let path = self.path_for(deed_id);
        if let Err(e) = self.try_save(&path, value) {
            warn!(deed_id, path = %path.display(), error = %e, "Failed to write cache entry");
        }
    }

    fn try_save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let body = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            DeedMapError::Cache(format!("rename into {}: {e}", path.display()))
        })
    }
}
