use std::error::Error;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::plant::PlantRecord;

pub mod memory;
pub mod sqlite;

pub use memory::MemorySlots;
pub use sqlite::SqliteSlots;

pub const DEFAULT_SLOT_KEY: &str = "botanica_pro_plants";
pub const CURRENT_COLLECTION_VERSION: u32 = 1;

/// A persistent key-value slot holding serialized text.
pub trait SlotBackend: Send {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;
    /// Replaces the value atomically; on error the previous value must survive.
    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError>;
    fn remove(&mut self, key: &str) -> Result<(), SlotError>;
}

#[derive(Debug)]
pub enum SlotError {
    QuotaExceeded,
    Db(rusqlite::Error),
    Io(std::io::Error),
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::QuotaExceeded => write!(f, "storage quota exceeded"),
            SlotError::Db(err) => write!(f, "database error: {}", err),
            SlotError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SlotError::QuotaExceeded => None,
            SlotError::Db(err) => Some(err),
            SlotError::Io(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for SlotError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DiskFull) => SlotError::QuotaExceeded,
            _ => SlotError::Db(value),
        }
    }
}

impl From<std::io::Error> for SlotError {
    fn from(value: std::io::Error) -> Self {
        SlotError::Io(value)
    }
}

#[derive(Debug)]
pub enum StoreError {
    StorageQuotaExceeded,
    Backend(SlotError),
    Serialize(serde_json::Error),
    /// The slot holds data this build cannot decode; it is left untouched.
    Unreadable(serde_json::Error),
    NewerVersion(u32),
    NotFound(String),
    DuplicateId(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::StorageQuotaExceeded => {
                write!(f, "local storage is full; delete old plants to free space")
            }
            StoreError::Backend(err) => write!(f, "storage backend error: {}", err),
            StoreError::Serialize(err) => write!(f, "could not serialize plants: {}", err),
            StoreError::Unreadable(err) => write!(
                f,
                "stored plants could not be decoded ({}); refusing to overwrite them",
                err
            ),
            StoreError::NewerVersion(version) => write!(
                f,
                "stored plants use schema version {} (newer than {}); refusing to overwrite them",
                version, CURRENT_COLLECTION_VERSION
            ),
            StoreError::NotFound(id) => write!(f, "plant '{}' not found", id),
            StoreError::DuplicateId(id) => write!(f, "plant '{}' already exists", id),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::StorageQuotaExceeded => None,
            StoreError::Backend(err) => Some(err),
            StoreError::Serialize(err) | StoreError::Unreadable(err) => Some(err),
            StoreError::NewerVersion(_) => None,
            StoreError::NotFound(_) | StoreError::DuplicateId(_) => None,
        }
    }
}

impl From<SlotError> for StoreError {
    fn from(value: SlotError) -> Self {
        match value {
            SlotError::QuotaExceeded => StoreError::StorageQuotaExceeded,
            other => StoreError::Backend(other),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Serialize(value)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    schema_version: u32,
    plants: Vec<PlantRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Persisted {
    Versioned(Envelope),
    Unversioned(Vec<PlantRecord>),
}

/// Owner of the single serialized plant collection.
///
/// Every mutation holds the backend lock for its whole load-modify-write, so
/// two mutations through the same store can never lose each other's update.
pub struct PlantStore {
    backend: Mutex<Box<dyn SlotBackend>>,
    key: String,
}

impl PlantStore {
    pub fn new(backend: impl SlotBackend + 'static) -> Self {
        Self::with_key(backend, DEFAULT_SLOT_KEY)
    }

    pub fn with_key(backend: impl SlotBackend + 'static, key: impl Into<String>) -> Self {
        Self {
            backend: Mutex::new(Box::new(backend)),
            key: key.into(),
        }
    }

    /// Never fails: a missing or unreadable slot is an empty collection.
    pub fn load(&self) -> Vec<PlantRecord> {
        let backend = self.lock();
        match self.load_strict(&**backend) {
            Ok(plants) => plants,
            Err(err) => {
                warn!(key = %self.key, error = %err, "plant collection unreadable; treating as empty");
                Vec::new()
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<PlantRecord> {
        self.load().into_iter().find(|plant| plant.id == id)
    }

    /// Upsert by id: replaces the matching record in place or appends.
    pub fn save(&self, record: &PlantRecord) -> Result<(), StoreError> {
        let mut backend = self.lock();
        let mut plants = self.load_strict(&**backend)?;
        match plants.iter_mut().find(|plant| plant.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => plants.push(record.clone()),
        }
        self.persist(&mut **backend, plants)
    }

    /// Appends a new record, refusing an id that is already stored.
    pub fn insert(&self, record: &PlantRecord) -> Result<(), StoreError> {
        let mut backend = self.lock();
        let mut plants = self.load_strict(&**backend)?;
        if plants.iter().any(|plant| plant.id == record.id) {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        plants.push(record.clone());
        self.persist(&mut **backend, plants)
    }

    /// Reloads `id`, applies `mutate` and persists, all under one lock.
    /// Nothing is written when `mutate` fails.
    pub fn update<F, E>(&self, id: &str, mutate: F) -> Result<PlantRecord, E>
    where
        F: FnOnce(&mut PlantRecord) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut backend = self.lock();
        let mut plants = self.load_strict(&**backend)?;
        let position = plants
            .iter()
            .position(|plant| plant.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut candidate = plants[position].clone();
        mutate(&mut candidate)?;
        plants[position] = candidate.clone();
        self.persist(&mut **backend, plants)?;
        Ok(candidate)
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut backend = self.lock();
        let mut plants = self.load_strict(&**backend)?;
        let before = plants.len();
        plants.retain(|plant| plant.id != id);
        if plants.len() == before {
            return Ok(false);
        }
        self.persist(&mut **backend, plants)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        let mut backend = self.lock();
        backend.remove(&self.key)?;
        debug!(key = %self.key, "cleared plant collection");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn SlotBackend>> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Anything short of a fully understood collection is an error. Writes
    /// go through this so they never replace data that could not be read.
    fn load_strict(&self, backend: &dyn SlotBackend) -> Result<Vec<PlantRecord>, StoreError> {
        let Some(raw) = backend.read(&self.key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Persisted>(&raw) {
            Ok(Persisted::Versioned(envelope))
                if envelope.schema_version <= CURRENT_COLLECTION_VERSION =>
            {
                debug!(key = %self.key, bytes = raw.len(), plants = envelope.plants.len(), "loaded plants");
                Ok(envelope.plants)
            }
            Ok(Persisted::Versioned(envelope)) => {
                Err(StoreError::NewerVersion(envelope.schema_version))
            }
            Ok(Persisted::Unversioned(plants)) => {
                debug!(key = %self.key, plants = plants.len(), "loaded unversioned plant collection");
                Ok(plants)
            }
            Err(err) => Err(newer_version_of(&raw)
                .map_or(StoreError::Unreadable(err), StoreError::NewerVersion)),
        }
    }

    fn persist(
        &self,
        backend: &mut dyn SlotBackend,
        plants: Vec<PlantRecord>,
    ) -> Result<(), StoreError> {
        let envelope = Envelope {
            schema_version: CURRENT_COLLECTION_VERSION,
            plants,
        };
        let raw = serde_json::to_string(&envelope)?;
        backend.write(&self.key, &raw)?;
        debug!(key = %self.key, bytes = raw.len(), plants = envelope.plants.len(), "saved plants");
        Ok(())
    }
}

/// A newer envelope may carry plants this build cannot decode at all; its
/// version still decides the error.
fn newer_version_of(raw: &str) -> Option<u32> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct VersionOnly {
        schema_version: u32,
    }

    serde_json::from_str::<VersionOnly>(raw)
        .ok()
        .map(|parsed| parsed.schema_version)
        .filter(|version| *version > CURRENT_COLLECTION_VERSION)
}
