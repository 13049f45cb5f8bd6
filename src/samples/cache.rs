//! On-disk cache for fetched sample assets, keyed by URL hash.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::SampleError;

use super::fetch::fetch_bytes;

#[derive(Debug, Clone)]
pub struct SampleCache {
    dir: PathBuf,
}

impl SampleCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SampleCache { dir: dir.into() }
    }

    /// The platform cache directory, e.g. `~/.cache/drumpad/samples` on Linux.
    pub fn default_location() -> Option<Self> {
        directories::ProjectDirs::from("net", "drumpad", "drumpad")
            .map(|dirs| Self::new(dirs.cache_dir().join("samples")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a URL is stored under: SHA-256 of the URL plus its extension.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        let mut name = format!("{digest:x}");
        let file = url.rsplit('/').next().unwrap_or_default();
        if let Some((_, ext)) = file.rsplit_once('.') {
            let plain = ext.chars().all(|c| c.is_ascii_alphanumeric());
            if !ext.is_empty() && ext.len() <= 4 && plain {
                name.push('.');
                name.push_str(&ext.to_ascii_lowercase());
            }
        }
        self.dir.join(name)
    }

    pub async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, SampleError> {
        match tokio::fs::read(self.path_for(url)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn put(&self, url: &str, bytes: &[u8]) -> Result<PathBuf, SampleError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(url);
        // Write then rename so a half-written file is never read back.
        let tmp = path.with_extension("part");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    /// Cached bytes for `url`, fetching and storing them on a miss.
    pub async fn load_or_fetch(
        &self,
        client: &reqwest::Client,
        url: &str,
    ) -> Result<Vec<u8>, SampleError> {
        if let Some(bytes) = self.get(url).await? {
            debug!(url, "sample cache hit");
            return Ok(bytes);
        }
        info!(url, "fetching sample");
        let bytes = fetch_bytes(client, url).await?;
        let path = self.put(url, &bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "sample cached");
        Ok(bytes)
    }
}
