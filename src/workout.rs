// src/workout.rs
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::metrics;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    /// Capitalised name used in descriptions ("Running", "Cycling").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }

    #[must_use]
    pub const fn metric_unit(self) -> &'static str {
        match self {
            Self::Running => "min/km",
            Self::Cycling => "km/h",
        }
    }

    /// Unit of the kind-specific field: cadence (spm) or elevation gain (m).
    #[must_use]
    pub const fn variant_unit(self) -> &'static str {
        match self {
            Self::Running => "spm",
            Self::Cycling => "m",
        }
    }
}

/// A fixed point on the map. Serialized as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// # Errors
    /// Returns `ValidationError::Coords` if either component is NaN or infinite.
    pub fn validate(self) -> Result<(), ValidationError> {
        if self.lat.is_finite() && self.lng.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::Coords {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(value: Coords) -> Self {
        [value.lat, value.lng]
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    #[error("Distance must be a positive number (got {0}).")]
    Distance(f64),
    #[error("Duration must be a positive number (got {0}).")]
    Duration(f64),
    #[error("Cadence must be a positive number (got {0}).")]
    Cadence(f64),
    #[error("Elevation gain must be a number (got {0}).")]
    ElevationGain(f64),
    #[error("Position must be finite coordinates (got {lat}, {lng}).")]
    Coords { lat: f64, lng: f64 },
}

/// Raw values read from the workout form. Any of them may be invalid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutInput {
    pub kind: WorkoutKind,
    pub distance_km: f64,
    pub duration_min: f64,
    /// Cadence for running, elevation gain for cycling.
    pub variant_value: f64,
}

impl WorkoutInput {
    #[must_use]
    pub const fn running(distance_km: f64, duration_min: f64, cadence: f64) -> Self {
        Self {
            kind: WorkoutKind::Running,
            distance_km,
            duration_min,
            variant_value: cadence,
        }
    }

    #[must_use]
    pub const fn cycling(distance_km: f64, duration_min: f64, elevation_gain: f64) -> Self {
        Self {
            kind: WorkoutKind::Cycling,
            distance_km,
            duration_min,
            variant_value: elevation_gain,
        }
    }

    /// Checks the input against the rules of its kind.
    ///
    /// Distance and duration must be finite and positive. Cadence must be finite and
    /// positive; elevation gain only has to be finite (zero and negative are fine).
    /// # Errors
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_positive(self.distance_km) {
            return Err(ValidationError::Distance(self.distance_km));
        }
        if !is_positive(self.duration_min) {
            return Err(ValidationError::Duration(self.duration_min));
        }
        match self.kind {
            WorkoutKind::Running if !is_positive(self.variant_value) => {
                Err(ValidationError::Cadence(self.variant_value))
            }
            WorkoutKind::Cycling if !self.variant_value.is_finite() => {
                Err(ValidationError::ElevationGain(self.variant_value))
            }
            _ => Ok(()),
        }
    }
}

impl From<&Workout> for WorkoutInput {
    fn from(workout: &Workout) -> Self {
        Self {
            kind: workout.kind(),
            distance_km: workout.distance_km,
            duration_min: workout.duration_min,
            variant_value: workout.variant_value(),
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Kind-specific data together with its derived metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutDetails {
    Running { cadence: f64, pace: f64 },
    Cycling { elevation_gain: f64, speed: f64 },
}

/// One logged activity.
///
/// Records are never edited field by field: an edit builds a new record and carries
/// over `id`, `created_at` and `interaction_count` with [`Workout::with_identity`].
#[derive(Debug, Clone)]
pub struct Workout {
    id: String,
    created_at: DateTime<Utc>,
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    description: String,
    interaction_count: u32,
    details: WorkoutDetails,
}

impl Workout {
    /// Builds a validated record, computing its metric and description.
    /// # Errors
    /// Returns `ValidationError` when the input breaks the rules of its kind or the
    /// position is not a finite point.
    pub fn new(
        input: &WorkoutInput,
        coords: Coords,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        input.validate()?;
        coords.validate()?;
        let metric = metrics::secondary_metric(input.kind, input.distance_km, input.duration_min);
        let details = match input.kind {
            WorkoutKind::Running => WorkoutDetails::Running {
                cadence: input.variant_value,
                pace: metric,
            },
            WorkoutKind::Cycling => WorkoutDetails::Cycling {
                elevation_gain: input.variant_value,
                speed: metric,
            },
        };
        Ok(Self {
            id: id.into(),
            created_at,
            coords,
            distance_km: input.distance_km,
            duration_min: input.duration_min,
            description: describe(input.kind, created_at),
            interaction_count: 0,
            details,
        })
    }

    /// Replaces the identity fields and re-stamps the description.
    #[must_use]
    pub fn with_identity(
        mut self,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
        interaction_count: u32,
    ) -> Self {
        self.id = id.into();
        self.created_at = created_at;
        self.interaction_count = interaction_count;
        self.description = describe(self.kind(), created_at);
        self
    }

    /// Records a click on the workout.
    pub fn select(&mut self) {
        self.interaction_count = self.interaction_count.saturating_add(1);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn interaction_count(&self) -> u32 {
        self.interaction_count
    }

    pub const fn details(&self) -> WorkoutDetails {
        self.details
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self.details {
            WorkoutDetails::Running { .. } => WorkoutKind::Running,
            WorkoutDetails::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    /// Pace for running, speed for cycling.
    pub const fn metric(&self) -> f64 {
        match self.details {
            WorkoutDetails::Running { pace, .. } => pace,
            WorkoutDetails::Cycling { speed, .. } => speed,
        }
    }

    /// Cadence for running, elevation gain for cycling.
    pub const fn variant_value(&self) -> f64 {
        match self.details {
            WorkoutDetails::Running { cadence, .. } => cadence,
            WorkoutDetails::Cycling { elevation_gain, .. } => elevation_gain,
        }
    }
}

// interaction_count is deliberately left out.
impl PartialEq for Workout {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.created_at == other.created_at
            && self.coords == other.coords
            && self.distance_km == other.distance_km
            && self.duration_min == other.duration_min
            && self.description == other.description
            && self.details == other.details
    }
}

/// "Running on January 15"
#[must_use]
pub fn describe(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
    format!(
        "{} on {} {}",
        kind.label(),
        created_at.format("%B"),
        created_at.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn description_uses_month_name_and_day() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 18, 30, 0).unwrap();
        assert_eq!(describe(WorkoutKind::Running, date), "Running on March 7");
        assert_eq!(describe(WorkoutKind::Cycling, date), "Cycling on March 7");
    }

    #[test]
    fn elevation_may_be_zero_or_negative_but_cadence_may_not() {
        assert!(WorkoutInput::cycling(10.0, 30.0, 0.0).validate().is_ok());
        assert!(WorkoutInput::cycling(10.0, 30.0, -15.0).validate().is_ok());
        assert_eq!(
            WorkoutInput::running(10.0, 30.0, 0.0).validate(),
            Err(ValidationError::Cadence(0.0))
        );
        assert!(matches!(
            WorkoutInput::cycling(10.0, 30.0, f64::NAN).validate(),
            Err(ValidationError::ElevationGain(_))
        ));
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let input = WorkoutInput::running(5.0, 25.0, 150.0);
        let now = Utc::now();
        for coords in [
            Coords::new(f64::NAN, 20.0),
            Coords::new(10.0, f64::INFINITY),
            Coords::new(f64::NEG_INFINITY, f64::NAN),
        ] {
            assert!(matches!(
                Workout::new(&input, coords, "1", now),
                Err(ValidationError::Coords { .. })
            ));
        }
        assert!(Workout::new(&input, Coords::new(-89.9, 179.9), "1", now).is_ok());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("running".parse::<WorkoutKind>().ok(), Some(WorkoutKind::Running));
        assert_eq!("Cycling".parse::<WorkoutKind>().ok(), Some(WorkoutKind::Cycling));
        assert!("swimming".parse::<WorkoutKind>().is_err());
        assert_eq!(WorkoutKind::Cycling.to_string(), "cycling");
    }
}
