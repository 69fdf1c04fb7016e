// src/persistence.rs
//! Snapshotting the workout collection into a single key-value slot.
//!
//! The whole ordered collection is written as one JSON array under
//! [`WORKOUTS_KEY`]. Only `id`, `date` and `clicks` are trusted verbatim on the way
//! back in; every record is rebuilt through [`Workout::new`] so the metric and the
//! description always come from the current formulas.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::DbError;
use crate::workout::{Coords, ValidationError, Workout, WorkoutDetails, WorkoutInput, WorkoutKind};

pub const WORKOUTS_KEY: &str = "workouts";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage is unavailable: {0}")]
    Unavailable(String),
    #[error("Storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("Storage database error: {0}")]
    Db(#[from] DbError),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to write workouts: {0}")]
    Storage(#[from] StorageError),
    #[error("Failed to serialize workouts: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Stored workouts are not a JSON array: {0}")]
    MalformedBlob(serde_json::Error),
    #[error("Stored workout entry is malformed: {0}")]
    MalformedEntry(serde_json::Error),
    #[error("Unknown workout type '{0}' in storage")]
    UnknownVariant(String),
    #[error("Stored workout {id} is invalid: {source}")]
    InvalidEntry {
        id: String,
        source: ValidationError,
    },
    #[error("Workout ID {0} appears more than once in storage")]
    DuplicateId(String),
}

/// A durable string slot store, in the spirit of browser local storage.
pub trait KeyValueStorage {
    /// # Errors
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Overwrites whatever is stored under `key`.
    /// # Errors
    /// Returns `StorageError` if the backend is unavailable or full.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// # Errors
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Session-only storage. An optional byte quota makes `set` fail once exceeded.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            slots: HashMap::new(),
            quota: Some(quota),
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            let others: usize = self
                .slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.slots.remove(key);
        Ok(())
    }
}

/// On-disk shape of one workout.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWorkout {
    #[serde(rename = "type")]
    kind: String,
    coords: Coords,
    distance: f64,
    duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elevation_gain: Option<f64>,
    date: DateTime<Utc>,
    id: String,
    #[serde(default)]
    clicks: u32,
    // Written for anyone reading the raw blob; ignored when loading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl From<&Workout> for StoredWorkout {
    fn from(workout: &Workout) -> Self {
        let (cadence, elevation_gain, pace, speed) = match workout.details() {
            WorkoutDetails::Running { cadence, pace } => (Some(cadence), None, Some(pace), None),
            WorkoutDetails::Cycling {
                elevation_gain,
                speed,
            } => (None, Some(elevation_gain), None, Some(speed)),
        };
        Self {
            kind: workout.kind().to_string(),
            coords: workout.coords(),
            distance: workout.distance_km(),
            duration: workout.duration_min(),
            cadence,
            elevation_gain,
            date: workout.created_at(),
            id: workout.id().to_string(),
            clicks: workout.interaction_count(),
            pace,
            speed,
            description: Some(workout.description().to_string()),
        }
    }
}

impl StoredWorkout {
    fn rehydrate(self) -> Result<Workout, PersistenceError> {
        let kind: WorkoutKind = self
            .kind
            .parse()
            .map_err(|_| PersistenceError::UnknownVariant(self.kind.clone()))?;
        let variant_value = match kind {
            WorkoutKind::Running => self.cadence,
            WorkoutKind::Cycling => self.elevation_gain,
        };
        let input = WorkoutInput {
            kind,
            distance_km: self.distance,
            duration_min: self.duration,
            variant_value: variant_value.unwrap_or(f64::NAN),
        };
        let workout = Workout::new(&input, self.coords, self.id.clone(), self.date).map_err(
            |source| PersistenceError::InvalidEntry {
                id: self.id.clone(),
                source,
            },
        )?;
        Ok(workout.with_identity(self.id, self.date, self.clicks))
    }
}

/// Result of reading the snapshot: what survived and why the rest was dropped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub workouts: Vec<Workout>,
    pub dropped: Vec<PersistenceError>,
}

#[derive(Debug)]
pub struct PersistenceAdapter<S> {
    storage: S,
}

impl<S: KeyValueStorage> PersistenceAdapter<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Serializes the full ordered collection, overwriting the previous snapshot.
    /// # Errors
    /// Returns `PersistenceError` if serialization or the storage write fails.
    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), PersistenceError> {
        let stored: Vec<StoredWorkout> = workouts.iter().map(StoredWorkout::from).collect();
        let blob = serde_json::to_string(&stored)?;
        self.storage.set(WORKOUTS_KEY, &blob)?;
        debug!(count = workouts.len(), bytes = blob.len(), "Saved workouts");
        Ok(())
    }

    /// Loads the snapshot, logging and skipping anything that cannot be rebuilt.
    /// A missing or malformed snapshot yields an empty collection.
    pub fn load(&self) -> Vec<Workout> {
        let report = self.load_with_report();
        for reason in &report.dropped {
            warn!(error = %reason, "Dropped stored workout");
        }
        report.workouts
    }

    pub fn load_with_report(&self) -> LoadReport {
        let blob = match self.storage.get(WORKOUTS_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return LoadReport::default(),
            Err(e) => {
                warn!(error = %e, "Could not read stored workouts, starting empty");
                return LoadReport::default();
            }
        };
        rehydrate_blob(&blob)
    }

    /// Deletes the snapshot altogether.
    /// # Errors
    /// Returns `PersistenceError::Storage` if the key cannot be removed.
    pub fn reset(&mut self) -> Result<(), PersistenceError> {
        self.storage.remove(WORKOUTS_KEY)?;
        Ok(())
    }
}

fn rehydrate_blob(blob: &str) -> LoadReport {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(blob) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Stored workouts are malformed, starting empty");
            return LoadReport {
                workouts: Vec::new(),
                dropped: vec![PersistenceError::MalformedBlob(e)],
            };
        }
    };

    let mut report = LoadReport::default();
    for entry in entries {
        let rebuilt = serde_json::from_value::<StoredWorkout>(entry)
            .map_err(PersistenceError::MalformedEntry)
            .and_then(StoredWorkout::rehydrate);
        match rebuilt {
            Ok(workout) if report.workouts.iter().any(|w| w.id() == workout.id()) => {
                report
                    .dropped
                    .push(PersistenceError::DuplicateId(workout.id().to_string()));
            }
            Ok(workout) => report.workouts.push(workout),
            Err(e) => report.dropped.push(e),
        }
    }
    report
}
