use crate::flatten::TokenMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// One cached flattening result, valid while the source hash matches.
#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    /// Source path the entry was written for. Sanitised file names can
    /// collide (`a/b.json`, `a_b.json`), so a hit also has to match this.
    #[serde(default)]
    pub path: String,
    pub hash: String,
    pub tokens: TokenMap,
}

/// Flattened documents keyed by source path and content hash.
pub struct IncrementalCache {
    cache_dir: PathBuf,
}

impl IncrementalCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            if let Err(e) = fs::create_dir_all(&cache_dir) {
                tracing::warn!(dir = %cache_dir.display(), error = %e, "cannot create cache dir");
            }
        }
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn get_cache_path(&self, file_path: &str) -> PathBuf {
        let safe_name = file_path
            .replace('/', "_")
            .replace('\\', "_")
            .replace(':', "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(&self, file_path: &str, source: &str) -> Option<TokenMap> {
        let cache_path = self.get_cache_path(file_path);
        let data = fs::read_to_string(&cache_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(file = file_path, error = %e, "discarding corrupt cache entry");
                fs::remove_file(cache_path).ok();
                return None;
            }
        };

        if entry.path != file_path {
            tracing::debug!(file = file_path, cached = %entry.path, "cache entry belongs to another source");
            return None;
        }

        if entry.hash == Self::compute_hash(source) {
            tracing::debug!(file = file_path, "flatten cache hit");
            Some(entry.tokens)
        } else {
            None
        }
    }

    /// Best effort: a failed write only costs a re-flatten next time.
    pub fn set(&self, file_path: &str, source: &str, tokens: &TokenMap) {
        let cache_path = self.get_cache_path(file_path);
        let entry = CacheEntry {
            path: file_path.to_string(),
            hash: Self::compute_hash(source),
            tokens: tokens.clone(),
        };

        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(e) = fs::write(&cache_path, data) {
                    tracing::warn!(file = file_path, error = %e, "cannot write cache entry");
                }
            }
            Err(e) => tracing::warn!(file = file_path, error = %e, "cannot serialize cache entry"),
        }
    }
}
