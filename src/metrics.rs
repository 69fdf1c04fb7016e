// src/metrics.rs
//! Derived secondary metric for each workout kind.
//!
//! Pace and speed are never read back from storage. They are recomputed here on
//! every construction and every rehydration.

use crate::workout::WorkoutKind;

pub const MINUTES_PER_HOUR: f64 = 60.0;

/// Running pace in min/km.
#[must_use]
pub fn pace(distance_km: f64, duration_min: f64) -> f64 {
    duration_min / distance_km
}

/// Cycling speed in km/h.
#[must_use]
pub fn speed(distance_km: f64, duration_min: f64) -> f64 {
    distance_km / (duration_min / MINUTES_PER_HOUR)
}

/// Computes the secondary metric for `kind`: pace for running, speed for cycling.
#[must_use]
pub fn secondary_metric(kind: WorkoutKind, distance_km: f64, duration_min: f64) -> f64 {
    match kind {
        WorkoutKind::Running => pace(distance_km, duration_min),
        WorkoutKind::Cycling => speed(distance_km, duration_min),
    }
}
