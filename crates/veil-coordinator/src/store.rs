//! Order persistence.
//!
//! Orders are serialized to one JSON file each so a crashed run can be
//! resumed by reloading the directory. A sidecar lock file serializes
//! concurrent drivers on the same order.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::order::Order;

/// Durable order storage.
pub trait OrderStore: Send + Sync {
    /// Persist an order, replacing any previous version.
    fn save(&self, order: &Order) -> Result<()>;
    /// Load an order by identifier.
    fn load(&self, id: &Uuid) -> Result<Option<Order>>;
    /// Identifiers of every persisted order.
    fn list(&self) -> Result<Vec<Uuid>>;
}

/// One JSON file per order under a base directory.
pub struct JsonFileStore {
    base_dir: PathBuf,
}

/// Exclusive lock on one order's record. Held for the duration of a step;
/// released on drop.
pub struct OrderLock {
    _file: File,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create directory: {:?}", base_dir))?;
        Ok(Self { base_dir })
    }

    fn order_file_path(&self, id: &Uuid) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    fn lock_file_path(&self, id: &Uuid) -> PathBuf {
        self.base_dir.join(format!("{id}.lock"))
    }

    /// Take the exclusive per-order lock, blocking until it is free.
    pub fn lock_order(&self, id: &Uuid) -> Result<OrderLock> {
        let path = self.lock_file_path(id);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {:?}", path))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock order file: {:?}", path))?;
        Ok(OrderLock { _file: file })
    }
}

impl OrderStore for JsonFileStore {
    fn save(&self, order: &Order) -> Result<()> {
        let path = self.order_file_path(&order.id);
        let json = serde_json::to_string_pretty(order)
            .with_context(|| format!("Failed to serialize order {}", order.id))?;
        // Write-then-rename so a crash mid-write never truncates the record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write order file: {:?}", tmp))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace order file: {:?}", path))?;
        Ok(())
    }

    fn load(&self, id: &Uuid) -> Result<Option<Order>> {
        let path = self.order_file_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read order file: {:?}", path))?;
        let order: Order = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse order file: {:?}", path))?;
        Ok(Some(order))
    }

    fn list(&self) -> Result<Vec<Uuid>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read directory: {:?}", self.base_dir))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(id) = Uuid::parse_str(stem) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
