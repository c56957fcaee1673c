use crate::config::StoreConfig;
use crate::csv::{self, CsvFormat, SkippedRow};
use crate::db;
use crate::log;
use crate::records::{StudentDraft, StudentRecord, ValidationError};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// A durable key/value cell. Writes replace the whole value.
pub trait Slot {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// In-process slot for embedding and tests.
#[allow(dead_code)]
#[derive(Debug, Default, Clone)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

#[allow(dead_code)]
impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut slot = Self::default();
        slot.values.insert(key.to_string(), value.to_string());
        slot
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl Slot for MemorySlot {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct SqliteSlot {
    conn: Connection,
}

impl SqliteSlot {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(SqliteSlot {
            conn: db::open_db(workspace)?,
        })
    }
}

impl Slot for SqliteSlot {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        db::slot_get(&self.conn, key)
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        db::slot_set(&self.conn, key, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("index {index} is out of range for {len} records")]
pub struct IndexError {
    pub index: usize,
    pub len: usize,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("storage write failed: {0:#}")]
    Storage(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

/// The student list behind one storage key. Every mutation re-reads the slot,
/// changes the list, and writes the whole list back.
pub struct RecordStore<S: Slot> {
    slot: S,
    config: StoreConfig,
}

impl<S: Slot> RecordStore<S> {
    pub fn new(slot: S, config: StoreConfig) -> Self {
        RecordStore { slot, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[allow(dead_code)]
    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Absent, unreadable or corrupt slots all read as an empty list.
    pub fn load(&self) -> Vec<StudentRecord> {
        let key = self.config.storage_key.as_str();
        let text = match self.slot.read(key) {
            Ok(Some(t)) => t,
            Ok(None) => return Vec::new(),
            Err(e) => {
                let error = format!("{e:#}");
                log::warn("STORE_SLOT_UNREADABLE", &[("key", key), ("error", error.as_str())]);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Option<Vec<StudentRecord>>>(&text) {
            Ok(v) => v.unwrap_or_default(),
            Err(e) => {
                let error = e.to_string();
                log::warn("STORE_SLOT_CORRUPT", &[("key", key), ("error", error.as_str())]);
                Vec::new()
            }
        }
    }

    pub fn save(&mut self, records: &[StudentRecord]) -> Result<(), StoreError> {
        let text = serde_json::to_string(records).map_err(|e| StoreError::Storage(e.into()))?;
        self.slot
            .write(&self.config.storage_key, &text)
            .map_err(StoreError::Storage)
    }

    pub fn get_all(&self) -> Vec<StudentRecord> {
        self.load()
    }

    pub fn count(&self) -> usize {
        self.load().len()
    }

    /// Appends a new record after trimming and validating it.
    pub fn add(&mut self, draft: &StudentDraft) -> Result<(), StoreError> {
        let record = draft.to_record_trimmed();
        record.validate()?;
        let mut records = self.load();
        records.push(record);
        self.save(&records)
    }

    /// Replaces the record at `index` wholesale. Fields are stored as typed and
    /// fees that do not parse become NaN, unless `strict_updates` is set.
    pub fn update(&mut self, index: usize, draft: &StudentDraft) -> Result<(), StoreError> {
        let mut records = self.load();
        let len = records.len();
        let Some(target) = records.get_mut(index) else {
            return Err(IndexError { index, len }.into());
        };
        let record = if self.config.strict_updates {
            let r = draft.to_record_trimmed();
            r.validate()?;
            r
        } else {
            draft.to_record_raw()
        };
        *target = record;
        self.save(&records)
    }

    /// Removes one record; later indices shift down by one.
    pub fn remove(&mut self, index: usize) -> Result<(), StoreError> {
        let mut records = self.load();
        if index >= records.len() {
            return Err(IndexError {
                index,
                len: records.len(),
            }
            .into());
        }
        records.remove(index);
        self.save(&records)
    }

    /// Indices whose roll or name contains `query`, ignoring case. Empty matches all.
    pub fn search(&self, query: &str) -> impl Iterator<Item = usize> {
        let needle = query.to_lowercase();
        self.load()
            .into_iter()
            .enumerate()
            .filter(move |(_, r)| {
                needle.is_empty()
                    || r.roll.to_lowercase().contains(&needle)
                    || r.name.to_lowercase().contains(&needle)
            })
            .map(|(i, _)| i)
    }

    pub fn export_csv(&self) -> String {
        csv::encode(&self.load(), &CsvFormat::from(&self.config))
    }

    /// Replaces the whole list with the rows decoded from `text`.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportSummary, StoreError> {
        let decoded = csv::decode(text, &CsvFormat::from(&self.config));
        self.save(&decoded.records)?;
        Ok(ImportSummary {
            imported: decoded.records.len(),
            skipped: decoded.skipped,
        })
    }

    pub fn replace_all(&mut self, records: &[StudentRecord]) -> Result<(), StoreError> {
        self.save(records)
    }
}
