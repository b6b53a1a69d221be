//! File-backed VLAN Store
//!
//! Keeps the record set as a JSON array in a single file. Every save writes a
//! temporary file in the same directory, fsyncs it and renames it over the
//! target, so readers only ever see a complete document.
//!
//! The id high-water mark lives in a sidecar `<file>.seq`, written before the
//! data file. A crash between the two writes can skip an id but never reuse
//! one.

use crate::domain::ports::VlanStore;
use crate::domain::record_set::RecordSet;
use crate::domain::vlan::VlanRecord;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info, warn};

// =============================================================================
// File Store Configuration
// =============================================================================

/// Configuration for the file store
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Path of the JSON data file
    pub path: PathBuf,
    /// Whether to fsync data and directory on every save
    pub sync_writes: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("vlans.json"),
            sync_writes: true,
        }
    }
}

// =============================================================================
// Stored Document
// =============================================================================

/// Accepted on-disk layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    /// Current layout: a bare array of records
    Records(Vec<VlanRecord>),
    /// Envelope written by earlier deployments
    Legacy {
        vlans: Vec<VlanRecord>,
        next_id: u64,
    },
}

// =============================================================================
// File Store
// =============================================================================

/// VLAN store backed by one JSON file plus an id sequence sidecar
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Data file
    path: PathBuf,
    /// Id high-water mark file
    seq_path: PathBuf,
    /// Directory holding both files
    dir: PathBuf,
    /// Whether to fsync on save
    sync_writes: bool,
}

impl FileStore {
    /// Create a file store at `path` with default settings
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(FileStoreConfig {
            path: path.into(),
            ..Default::default()
        })
    }

    /// Create a file store with full config
    pub fn with_config(config: FileStoreConfig) -> Result<Self> {
        let file_name = config.path.file_name().ok_or_else(|| {
            Error::Configuration(format!(
                "data file path {} has no file name",
                config.path.display()
            ))
        })?;

        let mut seq_name = file_name.to_os_string();
        seq_name.push(".seq");

        let dir = match config.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            seq_path: config.path.with_file_name(seq_name),
            path: config.path,
            dir,
            sync_writes: config.sync_writes,
        })
    }

    /// Path of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the id sequence sidecar
    pub fn seq_path(&self) -> &Path {
        &self.seq_path
    }

    async fn read_seq(&self) -> Result<u64> {
        match fs::read_to_string(&self.seq_path).await {
            Ok(text) => text.trim().parse().map_err(|_| {
                Error::StorageUnavailable(format!(
                    "malformed id sequence in {}",
                    self.seq_path.display()
                ))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(storage_error("reading", &self.seq_path, e)),
        }
    }

    async fn read_data(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("reading", &self.path, e)),
        }
    }

    /// Create an empty data file unless one already exists
    ///
    /// Runs on the lock-free read path, so it must never replace a document
    /// a concurrent save has just renamed into place. The sequence sidecar is
    /// left alone.
    async fn create_empty(&self) -> Result<()> {
        let dir = self.dir.clone();
        let path = self.path.clone();
        let sync = self.sync_writes;

        let created = tokio::task::spawn_blocking(move || -> Result<bool> {
            std::fs::create_dir_all(&dir).map_err(|e| storage_error("creating", &dir, e))?;
            write_new(&dir, &path, b"[]\n", sync).map_err(|e| storage_error("creating", &path, e))
        })
        .await
        .map_err(|e| Error::Internal(format!("create task failed: {}", e)))??;

        if created {
            info!("Data file {} not found, initialized empty store", self.path.display());
        }
        Ok(())
    }

    fn parse_document(&self, bytes: &[u8]) -> Result<(Vec<VlanRecord>, u64)> {
        let document: StoredDocument = serde_json::from_slice(bytes).map_err(|e| {
            Error::StorageUnavailable(format!(
                "malformed data file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let (records, next_id) = match document {
            StoredDocument::Records(records) => (records, 0),
            StoredDocument::Legacy { vlans, next_id } => {
                info!(
                    "Loaded legacy envelope from {}; it will be rewritten as an array on next save",
                    self.path.display()
                );
                (vlans, next_id)
            }
        };

        for record in &records {
            if let Err(errors) = record.check() {
                return Err(Error::StorageUnavailable(format!(
                    "record {} in {} is invalid: {}",
                    record.id,
                    self.path.display(),
                    Error::Validation(errors)
                )));
            }
        }

        Ok((records, next_id))
    }
}

#[async_trait]
impl VlanStore for FileStore {
    async fn load(&self) -> Result<RecordSet> {
        let bytes = match self.read_data().await? {
            Some(bytes) => bytes,
            None => {
                self.create_empty().await?;
                self.read_data().await?.ok_or_else(|| {
                    Error::StorageUnavailable(format!(
                        "data file {} vanished after creation",
                        self.path.display()
                    ))
                })?
            }
        };

        let (records, legacy_next_id) = self.parse_document(&bytes)?;
        let seq = self.read_seq().await?;

        let mut set = RecordSet::from_records(records)?;
        set.raise_next_id(seq.max(legacy_next_id));

        debug!(
            "Loaded {} VLAN records from {} (next id {})",
            set.len(),
            self.path.display(),
            set.next_id()
        );
        Ok(set)
    }

    async fn save(&self, records: &RecordSet) -> Result<()> {
        let records_vec: Vec<&VlanRecord> = records.iter().collect();
        let mut document = serde_json::to_vec_pretty(&records_vec)?;
        document.push(b'\n');
        let seq = format!("{}\n", records.next_id());

        let dir = self.dir.clone();
        let path = self.path.clone();
        let seq_path = self.seq_path.clone();
        let sync = self.sync_writes;

        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&dir).map_err(|e| storage_error("creating", &dir, e))?;
            write_atomic(&dir, &seq_path, seq.as_bytes(), sync)
                .map_err(|e| storage_error("writing", &seq_path, e))?;
            write_atomic(&dir, &path, &document, sync)
                .map_err(|e| storage_error("writing", &path, e))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Internal(format!("save task failed: {}", e)))??;

        debug!("Saved {} VLAN records to {}", records.len(), self.path.display());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let dir = self.dir.clone();
        let path = self.path.clone();

        let probe = tokio::task::spawn_blocking(move || -> io::Result<()> {
            if !std::fs::metadata(&dir)?.is_dir() {
                return Err(io::Error::new(io::ErrorKind::Other, "not a directory"));
            }
            // Dropping the probe file removes it
            NamedTempFile::new_in(&dir)?;
            match std::fs::File::open(&path) {
                Ok(file) if file.metadata()?.is_file() => Ok(()),
                Ok(_) => Err(io::Error::new(io::ErrorKind::Other, "data path is not a file")),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e),
            }
        })
        .await;

        match probe {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Storage health check failed for {}: {}", self.path.display(), e);
                false
            }
            Err(e) => {
                warn!("Storage health check task failed: {}", e);
                false
            }
        }
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Write `content` to `path` via temp file + rename in `dir`
fn write_atomic(dir: &Path, path: &Path, content: &[u8], sync: bool) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    if sync {
        tmp.as_file().sync_all()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    #[cfg(unix)]
    if sync {
        std::fs::File::open(dir)?.sync_all()?;
    }
    Ok(())
}

/// Like [`write_atomic`] but never replaces an existing `path`
///
/// Returns `false` when `path` already existed.
fn write_new(dir: &Path, path: &Path, content: &[u8], sync: bool) -> io::Result<bool> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    if sync {
        tmp.as_file().sync_all()?;
    }
    match tmp.persist_noclobber(path) {
        Ok(_) => {}
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.error),
    }

    #[cfg(unix)]
    if sync {
        std::fs::File::open(dir)?.sync_all()?;
    }
    Ok(true)
}

fn storage_error(action: &str, path: &Path, e: io::Error) -> Error {
    Error::StorageUnavailable(format!("{} {}: {}", action, path.display(), e))
}
