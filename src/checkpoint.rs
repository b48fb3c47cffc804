use crate::model::{PageData, PageMetadata};
use crate::pipeline::unit::{PartitionUnit, TrackedSummary};
use crate::store::{KeyValueStore, WindowStore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced while persisting or restoring unit snapshots.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to parse snapshot: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("snapshot checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch { expected: String, computed: String },
    #[error("failed to access snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Serializable copy of one processing unit's five state namespaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub partition: usize,
    pub pages: WindowStore<PageData>,
    pub metadata: KeyValueStore<PageMetadata>,
    pub summaries: KeyValueStore<TrackedSummary>,
    pub registrations: KeyValueStore<BTreeSet<String>>,
    pub acks: KeyValueStore<BTreeSet<String>>,
}

impl PartitionUnit {
    /// Captures the unit's state for persistence.
    pub fn snapshot(&self) -> UnitSnapshot {
        let (partition, pages, metadata, summaries, registrations, acks) =
            self.clone().into_parts();
        UnitSnapshot {
            partition,
            pages,
            metadata,
            summaries,
            registrations,
            acks,
        }
    }

    /// Rebuilds a unit from a restored snapshot.
    pub fn from_snapshot(snapshot: UnitSnapshot) -> Self {
        PartitionUnit::from_parts(
            snapshot.partition,
            snapshot.pages,
            snapshot.metadata,
            snapshot.summaries,
            snapshot.registrations,
            snapshot.acks,
        )
    }
}

/// Sealed snapshot artifact with its integrity checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub partition: usize,
    pub checksum: String,
    pub payload: String,
}

/// Serializes a snapshot and seals it with a SHA-256 checksum.
pub fn seal(snapshot: &UnitSnapshot) -> Result<PersistedSnapshot, CheckpointError> {
    let payload = serde_json::to_string(snapshot).map_err(CheckpointError::Serialize)?;
    Ok(PersistedSnapshot {
        partition: snapshot.partition,
        checksum: compute_checksum(payload.as_bytes()),
        payload,
    })
}

/// Verifies the checksum and decodes the snapshot.
pub fn open(persisted: &PersistedSnapshot) -> Result<UnitSnapshot, CheckpointError> {
    let computed = compute_checksum(persisted.payload.as_bytes());
    if computed != persisted.checksum {
        return Err(CheckpointError::ChecksumMismatch {
            expected: persisted.checksum.clone(),
            computed,
        });
    }
    serde_json::from_str(&persisted.payload).map_err(CheckpointError::Corrupt)
}

/// Contract implemented by snapshot storage sinks.
pub trait SnapshotSink {
    fn persist(&mut self, snapshot: PersistedSnapshot) -> Result<(), CheckpointError>;
}

/// Filesystem sink writing one file per partition under a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotSink {
    root: PathBuf,
}

impl DirectorySnapshotSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, partition: usize) -> PathBuf {
        self.root.join(format!("part-{partition}.snap"))
    }

    /// Loads the sealed snapshot for a partition.
    pub fn load(&self, partition: usize) -> Result<PersistedSnapshot, CheckpointError> {
        let path = self.path_for(partition);
        let raw = fs::read_to_string(&path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(CheckpointError::Corrupt)
    }
}

impl SnapshotSink for DirectorySnapshotSink {
    fn persist(&mut self, snapshot: PersistedSnapshot) -> Result<(), CheckpointError> {
        let path = self.path_for(snapshot.partition);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CheckpointError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let encoded = serde_json::to_string(&snapshot).map_err(CheckpointError::Serialize)?;
        write_atomic(&path, encoded.as_bytes())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
    let tmp = path.with_extension("snap.tmp");
    fs::write(&tmp, bytes).map_err(|source| CheckpointError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn compute_checksum(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    to_hex(&digest)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        encoded.push_str(&format!("{byte:02x}"));
    }
    encoded
}
