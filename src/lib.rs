use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

// --- Declare modules ---
pub mod config;
pub mod controller;
pub mod db;
pub mod markers;
pub mod metrics;
pub mod persistence;
pub mod session;
pub mod store;
pub mod view;
pub mod workout;

// --- Expose public types ---
pub use config::{parse_color, Config, ConfigError, StandardColor, Theme, Units};
pub use controller::{Command, ControllerError, Outcome, WorkoutController};
pub use db::{get_db_path as get_db_path_util, DbError, SqliteStorage};
pub use markers::{MarkerError, MarkerIndex};
pub use persistence::{
    KeyValueStorage, LoadReport, MemoryStorage, PersistenceAdapter, PersistenceError,
    StorageError, WORKOUTS_KEY,
};
pub use session::EditSession;
pub use store::{StoreError, WorkoutStore};
pub use view::{FixedPosition, FormView, GeolocationError, Geolocator, Renderer};
pub use workout::{Coords, ValidationError, Workout, WorkoutDetails, WorkoutInput, WorkoutKind};

pub const KM_TO_MILE: f64 = 0.621_371;

/// Configuration and durable storage for one run of the application.
pub struct AppService {
    pub config: Config,
    pub storage: SqliteStorage,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppService {
    /// Loads the config and opens the SQLite-backed storage.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let storage = SqliteStorage::open(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        Ok(Self {
            config,
            storage,
            db_path,
            config_path,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// # Errors
    /// Returns `ConfigError` if the zoom is out of range or saving fails.
    pub fn set_map_zoom_level(&mut self, zoom: u8) -> Result<(), ConfigError> {
        self.config.set_map_zoom_level(zoom)?;
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` if the position is not finite or saving fails.
    pub fn set_home_position(&mut self, lat: f64, lng: f64) -> Result<(), ConfigError> {
        self.config.set_home_position(lat, lng)?;
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn set_units(&mut self, units: Units) -> Result<(), ConfigError> {
        self.config.units = units;
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` if the colour is unknown or saving fails.
    pub fn set_header_color(&mut self, name: &str) -> Result<(), ConfigError> {
        self.config.set_header_color(name)?;
        self.save_config()
    }

    /// Builds a controller over this service's storage, restores the saved workouts
    /// and initialises the map from the configured home position.
    pub fn into_controller<V>(self, view: V) -> WorkoutController<SqliteStorage, V>
    where
        V: Renderer + FormView,
    {
        let mut controller = WorkoutController::new(PersistenceAdapter::new(self.storage), view)
            .with_map_zoom(self.config.map_zoom_level);
        controller.restore();
        if let Err(e) = controller.init_map(&mut FixedPosition(self.config.home_position)) {
            tracing::info!(error = %e, "Map features disabled");
        }
        controller
    }
}
