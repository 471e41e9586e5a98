//! Database module - key-value storage for routines, workouts and mesocycle configs
//!
//! Every record set is stored as one complete JSON snapshot under a stable
//! key. Partial updates happen in memory before the snapshot is written back.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::models::{MesocycleConfigs, Routine, Workout, mesocycle_name};

/// Stable storage keys
pub mod keys {
    pub const ROUTINES: &str = "gym-tracker-routines";
    pub const WORKOUTS: &str = "gym-tracker-workouts";
    pub const MESOCYCLES: &str = "gym-tracker-mesocycles";
}

/// Minimal get/set persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// SQLite-backed store
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// In-memory store for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed snapshots over a key-value store
pub struct Repository<S> {
    store: S,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.get(key)? {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("corrupt record under '{}'", key)),
            None => Ok(T::default()),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        debug!(key, bytes = json.len(), "Saving snapshot");
        self.store.set(key, &json)
    }

    /// Load routines. Mesocycle names are normalized (trimmed, "General"
    /// when missing) and the migrated list is written back once.
    pub fn load_routines(&self) -> Result<Vec<Routine>> {
        let mut routines: Vec<Routine> = self.load(keys::ROUTINES)?;

        let mut migrated = 0;
        for routine in routines.iter_mut() {
            let name = mesocycle_name(&routine.mesocycle).to_string();
            if name != routine.mesocycle {
                routine.mesocycle = name;
                migrated += 1;
            }
        }
        if migrated > 0 {
            info!(count = migrated, "Normalized routine mesocycle names");
            self.save_routines(&routines)?;
        }

        Ok(routines)
    }

    pub fn save_routines(&self, routines: &[Routine]) -> Result<()> {
        self.save(keys::ROUTINES, &routines)
    }

    pub fn load_workouts(&self) -> Result<Vec<Workout>> {
        self.load(keys::WORKOUTS)
    }

    pub fn save_workouts(&self, workouts: &[Workout]) -> Result<()> {
        self.save(keys::WORKOUTS, &workouts)
    }

    pub fn load_configs(&self) -> Result<MesocycleConfigs> {
        self.load(keys::MESOCYCLES)
    }

    pub fn save_configs(&self, configs: &MesocycleConfigs) -> Result<()> {
        self.save(keys::MESOCYCLES, configs)
    }
}
