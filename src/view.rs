// src/view.rs
//! Contracts for the presentation layer the controller drives.
//!
//! Nothing in the core touches widgets or map layers directly. A shell implements
//! these traits (the CLI has a terminal renderer, tests use a recording double).

use thiserror::Error;

use crate::workout::{Coords, Workout, WorkoutInput};

/// List entries and map markers.
pub trait Renderer {
    /// Opaque handle to a marker drawn on the map.
    type Marker;

    /// Draws `workout` in the list. With `replace_existing`, the entry for that id
    /// is swapped out instead of a new one being inserted next to the form.
    fn render_list_entry(&mut self, workout: &Workout, replace_existing: Option<&str>);
    fn render_marker(&mut self, workout: &Workout, is_replace: bool) -> Self::Marker;
    fn remove_marker(&mut self, marker: &Self::Marker);
    fn remove_list_entry(&mut self, id: &str);
    fn remove_all_list_entries(&mut self);
    fn set_remove_all_visible(&mut self, visible: bool);
    fn center_map(&mut self, coords: Coords, zoom: u8);
}

/// The workout form plus the blocking notification used for bad input.
pub trait FormView {
    /// Opens the form, optionally pre-filled from the workout being edited.
    fn show_form(&mut self, prefill: Option<&WorkoutInput>);
    /// Clears and hides the form.
    fn hide_form(&mut self);
    fn notify(&mut self, message: &str);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Geolocation is not available")]
    Unsupported,
    #[error("Position request failed: {0}")]
    Failed(String),
}

/// One-shot source of the user's position.
pub trait Geolocator {
    /// # Errors
    /// Returns `GeolocationError` when no position can be obtained.
    fn current_position(&mut self) -> Result<Coords, GeolocationError>;
}

/// A geolocator that always answers with the same (possibly missing) position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition(pub Option<Coords>);

impl Geolocator for FixedPosition {
    fn current_position(&mut self) -> Result<Coords, GeolocationError> {
        self.0.ok_or(GeolocationError::Unsupported)
    }
}
