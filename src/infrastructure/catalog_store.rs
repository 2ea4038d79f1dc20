//! Catalog persistence
//!
//! The catalog lives in a single JSON file (`db.json`) that the bot
//! process reads concurrently. Writes go to a sibling temp file and
//! rename over the target, so a reader never sees a truncated catalog;
//! a failed write leaves the previous file untouched.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::catalog::{Catalog, series_index};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog at {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed catalog storage.
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted catalog; a missing file is an empty catalog,
    /// a corrupt file is an error (the previous run's data must not be
    /// silently discarded).
    pub async fn load(&self) -> Result<Catalog, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let catalog: Catalog =
                    serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                        path: self.path.clone(),
                        source,
                    })?;
                info!("Loaded catalog with {} entries from {:?}", catalog.len(), self.path);
                Ok(catalog)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No catalog at {:?}, starting empty", self.path);
                Ok(Catalog::new())
            }
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Atomically replace the catalog file.
    pub async fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(catalog)?;
        self.write_atomic(&self.path, json.as_bytes()).await?;
        info!("Wrote catalog with {} entries to {:?}", catalog.len(), self.path);
        Ok(())
    }

    /// Write the derived series aggregation next to the catalog.
    pub async fn save_series_index(
        &self,
        catalog: &Catalog,
        path: &Path,
    ) -> Result<(), StoreError> {
        let index = series_index(catalog);
        let json = serde_json::to_string_pretty(&index)?;
        self.write_atomic(path, json.as_bytes()).await?;
        info!("Wrote series index with {} series to {path:?}", index.len());
        Ok(())
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        // Temp file in the same directory so the rename stays on one
        // filesystem and is atomic.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        if let Err(source) = fs::rename(&tmp_path, path).await {
            // Don't leave the temp file around on failure.
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                warn!("Failed to clean up temp file {:?}: {}", tmp_path, cleanup);
            }
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}
