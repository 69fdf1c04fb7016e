//src/config.rs
use comfy_table::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;

use crate::controller::DEFAULT_MAP_ZOOM;
use crate::workout::Coords;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "mapty";
const CONFIG_ENV_VAR: &str = "MAPTY_CONFIG_DIR"; // Environment variable name

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 20;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid color name: {0}")]
    InvalidColor(String),
    #[error("Map zoom must be between 1 and 20 (got {0}).")]
    InvalidZoom(u8),
    #[error("Home position must be finite coordinates (got {0}, {1}).")]
    InvalidPosition(f64, f64),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric, // km, km/h
    Imperial, // miles, mph
}

// Define standard colors using strum for easy iteration/parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum StandardColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    DarkGrey,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Grey,
}

impl From<StandardColor> for Color {
    fn from(value: StandardColor) -> Self {
        match value {
            StandardColor::Black => Self::Black,
            StandardColor::Red => Self::Red,
            StandardColor::Green => Self::Green,
            StandardColor::Yellow => Self::Yellow,
            StandardColor::Blue => Self::Blue,
            StandardColor::Magenta => Self::Magenta,
            StandardColor::Cyan => Self::Cyan,
            StandardColor::White => Self::White,
            StandardColor::DarkGrey => Self::DarkGrey,
            StandardColor::DarkRed => Self::DarkRed,
            StandardColor::DarkGreen => Self::DarkGreen,
            StandardColor::DarkYellow => Self::DarkYellow,
            StandardColor::DarkBlue => Self::DarkBlue,
            StandardColor::DarkMagenta => Self::DarkMagenta,
            StandardColor::DarkCyan => Self::DarkCyan,
            StandardColor::Grey => Self::Grey,
        }
    }
}

/// Parses a colour name case-insensitively ("darkgreen", "Cyan").
/// # Errors
/// Returns `ConfigError::InvalidColor` for unknown names.
pub fn parse_color(color_str: &str) -> Result<StandardColor, ConfigError> {
    StandardColor::iter()
        .find(|color| format!("{color:?}").eq_ignore_ascii_case(color_str))
        .ok_or_else(|| ConfigError::InvalidColor(color_str.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Theme {
    pub header_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_color: "Green".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Config {
    pub map_zoom_level: u8,
    /// Where the terminal "geolocation" places the user. `None` disables map features.
    pub home_position: Option<Coords>,
    pub units: Units,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map_zoom_level: DEFAULT_MAP_ZOOM,
            home_position: None,
            units: Units::default(),
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// Checks values that may have been hand-edited in the file.
    /// # Errors
    /// Returns `InvalidZoom` or `InvalidPosition` like the matching setters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.map_zoom_level) {
            return Err(ConfigError::InvalidZoom(self.map_zoom_level));
        }
        if let Some(home) = self.home_position {
            if !home.lat.is_finite() || !home.lng.is_finite() {
                return Err(ConfigError::InvalidPosition(home.lat, home.lng));
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigError::InvalidZoom` outside `MIN_ZOOM..=MAX_ZOOM`.
    pub fn set_map_zoom_level(&mut self, zoom: u8) -> Result<(), ConfigError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            return Err(ConfigError::InvalidZoom(zoom));
        }
        self.map_zoom_level = zoom;
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigError::InvalidPosition` for non-finite coordinates.
    pub fn set_home_position(&mut self, lat: f64, lng: f64) -> Result<(), ConfigError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(ConfigError::InvalidPosition(lat, lng));
        }
        self.home_position = Some(Coords::new(lat, lng));
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigError::InvalidColor` for unknown colour names.
    pub fn set_header_color(&mut self, name: &str) -> Result<(), ConfigError> {
        let color = parse_color(name)?;
        self.theme.header_color = format!("{color:?}");
        Ok(())
    }
}

/// Determines the path to the configuration file.
/// # Errors
/// Returns `ConfigError` if no config directory can be found or created.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir_path = match std::env::var(CONFIG_ENV_VAR).ok() {
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.is_dir() {
                tracing::warn!(
                    var = CONFIG_ENV_VAR,
                    path = %path.display(),
                    "Config override is not a directory, creating it"
                );
                fs::create_dir_all(&path)?;
            }
            path
        }
        None => {
            let base_config_dir =
                dirs::config_dir().ok_or(ConfigError::CannotDetermineConfigDir)?;
            base_config_dir.join(APP_CONFIG_DIR)
        }
    };

    if !config_dir_path.exists() {
        fs::create_dir_all(&config_dir_path)?;
    }

    Ok(config_dir_path.join(CONFIG_FILE_NAME))
}

/// Loads the configuration, writing the defaults out if the file doesn't exist yet.
/// # Errors
/// Returns `ConfigError` on I/O or TOML errors, or if a value is out of range.
pub fn load(config_path: &Path) -> Result<Config, ConfigError> {
    if !config_path.exists() {
        let default_config = Config::default();
        save(config_path, &default_config)?;
        return Ok(default_config);
    }
    let config_content = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&config_content)?;
    config.validate()?;
    Ok(config)
}

/// Saves the configuration to the TOML file.
/// # Errors
/// Returns `ConfigError` on I/O or TOML errors.
pub fn save(config_path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config)?;
    fs::write(config_path, config_content)?;
    Ok(())
}
