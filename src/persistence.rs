//! Snapshot persistence layer for Ballotchain
//!
//! The whole ledger is one JSON document, rewritten after every mutation.
//! Writes go to a temp file in the target directory which is then renamed
//! over the snapshot, so a crash mid-write leaves the previous snapshot intact.

use crate::blockchain::{Block, UnitMap};
use crate::error::{LedgerError, Result};
use crate::roster::Roster;
use crate::vote::Vote;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// On-disk form of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub chain: Vec<Block>,
    #[serde(default)]
    pub current_votes_by_barangay: UnitMap<Vec<Vote>>,
    #[serde(default)]
    pub voters_by_barangay: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub mined_barangays: Vec<String>,
    /// Roster in force when the snapshot was written. Audit only.
    #[serde(default, deserialize_with = "lenient_roster")]
    pub allowed_candidates: Option<Roster>,
}

/// Unredacted dump served by the export download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub chain: Vec<Block>,
    pub pending: UnitMap<Vec<Vote>>,
    pub voters_by_barangay: BTreeMap<String, Vec<String>>,
    pub mined_barangays: Vec<String>,
    pub allowed_candidates: Roster,
}

// An empty or malformed roster record should not make the whole snapshot unreadable.
fn lenient_roster<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Roster>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Abstraction for persistence backends. Implementations must replace the
/// stored snapshot as a whole or not at all.
pub trait Persistence: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet; `Err` when something is
    /// stored but cannot be read.
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>>;
    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()>;
}

/// Snapshot kept in a single JSON file.
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFilePersistence {
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read(&self.path)?;
        let snapshot = serde_json::from_slice::<LedgerSnapshot>(&contents).map_err(|e| {
            LedgerError::Serialization(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(snapshot))
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        write_json_atomic(&self.path, snapshot)
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&json)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| LedgerError::Io(format!("Failed to finalize write: {}", e.error)))?;

    Ok(())
}

/// Snapshot held in memory, useful for tests and ephemeral runs. Clones
/// share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    snapshot: Arc<Mutex<Option<LedgerSnapshot>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        let stored = self.snapshot.lock().map_err(|_| LedgerError::Io("Mutex poisoned".to_string()))?;
        Ok(stored.clone())
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let mut stored = self.snapshot.lock().map_err(|_| LedgerError::Io("Mutex poisoned".to_string()))?;
        *stored = Some(snapshot.clone());
        Ok(())
    }
}
