// src/controller.rs
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::markers::MarkerIndex;
use crate::persistence::{KeyValueStorage, PersistenceAdapter, PersistenceError};
use crate::session::EditSession;
use crate::store::{StoreError, WorkoutStore};
use crate::view::{FormView, GeolocationError, Geolocator, Renderer};
use crate::workout::{Coords, ValidationError, Workout, WorkoutInput};

pub const DEFAULT_MAP_ZOOM: u8 = 13;
pub const INVALID_INPUT_MESSAGE: &str = "Inputs have to be positive numbers!";
pub const NO_POSITION_MESSAGE: &str = "Could not get your position";
pub const NO_LOCATION_MESSAGE: &str = "Pick a spot on the map for the workout first.";

// Ids are the trailing ten digits of the creation time in milliseconds.
const ID_MODULUS: i64 = 10_000_000_000;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Invalid workout input: {0}")]
    Validation(#[from] ValidationError),
    #[error("No map location selected for the new workout")]
    NoLocation,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Could not get your position: {0}")]
    Geolocation(#[from] GeolocationError),
}

impl ControllerError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound(_)))
    }
}

/// An event coming from the surrounding shell.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// The map was clicked at a position; open the form for a new workout there.
    ShowForm(Coords),
    Submit(WorkoutInput),
    RequestEdit(String),
    CloseForm,
    Delete(String),
    ClearAll,
    Select(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    FormShown,
    FormClosed,
    EditStarted(String),
    Created(String),
    Edited(String),
    Deleted(String),
    Cleared(usize),
    Selected { id: String, interaction_count: u32 },
}

/// Keeps the store, the marker index and the snapshot in step, and tells the view
/// what changed.
pub struct WorkoutController<S, V: Renderer> {
    store: WorkoutStore,
    markers: MarkerIndex<V::Marker>,
    session: EditSession,
    pending_location: Option<Coords>,
    map_ready: bool,
    map_zoom: u8,
    clock: fn() -> DateTime<Utc>,
    persistence: PersistenceAdapter<S>,
    view: V,
}

impl<S, V> WorkoutController<S, V>
where
    S: KeyValueStorage,
    V: Renderer + FormView,
{
    pub fn new(persistence: PersistenceAdapter<S>, view: V) -> Self {
        Self {
            store: WorkoutStore::new(),
            markers: MarkerIndex::new(),
            session: EditSession::Idle,
            pending_location: None,
            map_ready: false,
            map_zoom: DEFAULT_MAP_ZOOM,
            clock: Utc::now,
            persistence,
            view,
        }
    }

    #[must_use]
    pub fn with_map_zoom(mut self, zoom: u8) -> Self {
        self.map_zoom = zoom;
        self
    }

    /// Overrides the time source used to stamp new workouts.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Loads the snapshot and renders every stored workout, replacing whatever was
    /// shown before. Returns how many workouts were restored.
    pub fn restore(&mut self) -> usize {
        self.view.remove_all_list_entries();
        for marker in self.markers.remove_all() {
            self.view.remove_marker(&marker);
        }
        self.store.clear();
        for workout in self.persistence.load() {
            self.view.render_list_entry(&workout, None);
            if self.map_ready {
                let marker = self.view.render_marker(&workout, false);
                self.markers.upsert(workout.id(), marker);
            }
            if let Err(e) = self.store.add(workout) {
                warn!(error = %e, "Skipping restored workout");
            }
        }
        self.view.set_remove_all_visible(!self.store.is_empty());
        info!(count = self.store.len(), "Restored workouts");
        self.store.len()
    }

    /// Asks for the user's position once, centres the map there and draws a marker
    /// for every workout already loaded.
    /// # Errors
    /// Returns `ControllerError::Geolocation` if no position is available; the user is
    /// notified and map features stay off.
    pub fn init_map<G: Geolocator>(
        &mut self,
        geolocator: &mut G,
    ) -> Result<Coords, ControllerError> {
        let position = match geolocator.current_position() {
            Ok(position) => position,
            Err(e) => {
                self.view.notify(NO_POSITION_MESSAGE);
                return Err(e.into());
            }
        };
        self.view.center_map(position, self.map_zoom);
        self.map_ready = true;
        for workout in self.store.iter() {
            let marker = self.view.render_marker(workout, false);
            self.markers.upsert(workout.id(), marker);
        }
        debug!(lat = position.lat, lng = position.lng, "Map initialised");
        Ok(position)
    }

    /// Routes a shell event to the matching operation.
    /// # Errors
    /// Propagates the error of the operation the command maps to.
    pub fn handle(&mut self, command: Command) -> Result<Outcome, ControllerError> {
        match command {
            Command::ShowForm(coords) => {
                self.show_form(coords);
                Ok(Outcome::FormShown)
            }
            Command::Submit(input) => self.submit(&input),
            Command::RequestEdit(id) => {
                self.request_edit(&id)?;
                Ok(Outcome::EditStarted(id))
            }
            Command::CloseForm => {
                self.close_form();
                Ok(Outcome::FormClosed)
            }
            Command::Delete(id) => {
                self.delete(&id)?;
                Ok(Outcome::Deleted(id))
            }
            Command::ClearAll => Ok(Outcome::Cleared(self.clear_all())),
            Command::Select(id) => {
                let interaction_count = self.select(&id)?;
                Ok(Outcome::Selected {
                    id,
                    interaction_count,
                })
            }
        }
    }

    /// Remembers where the next new workout is anchored and opens the form.
    pub fn show_form(&mut self, coords: Coords) {
        self.pending_location = Some(coords);
        self.view.show_form(None);
    }

    /// Closes the form, dropping any pending location or edit.
    pub fn close_form(&mut self) {
        if let Some(id) = self.session.finish() {
            debug!(%id, "Edit cancelled");
        }
        self.pending_location = None;
        self.view.hide_form();
    }

    /// Submits the form: edits the session's target if one is open, otherwise
    /// creates a new workout at the pending location.
    /// # Errors
    /// - `ControllerError::Validation` on bad input (form stays open).
    /// - `ControllerError::NoLocation` when creating without a map click.
    /// - `ControllerError::Store` when the edited workout has vanished.
    pub fn submit(&mut self, input: &WorkoutInput) -> Result<Outcome, ControllerError> {
        match self.session.editing_id().map(str::to_string) {
            Some(id) => self.submit_edit(&id, input).map(|()| Outcome::Edited(id)),
            None => self.create(input).map(Outcome::Created),
        }
    }

    fn create(&mut self, input: &WorkoutInput) -> Result<String, ControllerError> {
        let Some(coords) = self.pending_location else {
            self.view.notify(NO_LOCATION_MESSAGE);
            return Err(ControllerError::NoLocation);
        };
        let now = (self.clock)();
        let workout = match Workout::new(input, coords, self.next_id(now), now) {
            Ok(workout) => workout,
            Err(e) => {
                self.view.notify(INVALID_INPUT_MESSAGE);
                return Err(e.into());
            }
        };
        let id = workout.id().to_string();

        self.store.add(workout.clone())?;
        self.view.set_remove_all_visible(true);
        if self.map_ready {
            let marker = self.view.render_marker(&workout, false);
            self.markers.upsert(&id, marker);
        }
        self.view.render_list_entry(&workout, None);
        self.persist();
        self.pending_location = None;
        self.view.hide_form();
        info!(%id, kind = %workout.kind(), "Workout created");
        Ok(id)
    }

    /// Opens the form pre-filled from workout `id` and enters the edit session.
    /// # Errors
    /// Returns `ControllerError::Store` if `id` is unknown.
    pub fn request_edit(&mut self, id: &str) -> Result<(), ControllerError> {
        let workout = self
            .store
            .find_by_id(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let prefill = WorkoutInput::from(workout);
        self.session.begin(id);
        self.view.show_form(Some(&prefill));
        debug!(%id, "Edit started");
        Ok(())
    }

    fn submit_edit(&mut self, id: &str, input: &WorkoutInput) -> Result<(), ControllerError> {
        let Some(current) = self.store.find_by_id(id) else {
            warn!(%id, "Workout vanished while being edited");
            self.session.finish();
            self.view.hide_form();
            return Err(StoreError::NotFound(id.to_string()).into());
        };
        let (coords, created_at, clicks) = (
            current.coords(),
            current.created_at(),
            current.interaction_count(),
        );

        let edited = match Workout::new(input, coords, id, created_at) {
            Ok(workout) => workout.with_identity(id, created_at, clicks),
            Err(e) => {
                self.view.notify(INVALID_INPUT_MESSAGE);
                return Err(e.into());
            }
        };

        self.store.replace(id, edited.clone())?;
        self.view.render_list_entry(&edited, Some(id));
        if self.map_ready {
            if let Some(old) = self.markers.get(id) {
                self.view.remove_marker(old);
            }
            let marker = self.view.render_marker(&edited, true);
            self.markers.upsert(id, marker);
        }
        self.persist();
        self.view.hide_form();
        self.session.finish();
        self.pending_location = None;
        info!(%id, "Workout edited");
        Ok(())
    }

    /// Removes workout `id` from the list, the map and the snapshot.
    /// # Errors
    /// Returns `ControllerError::Store` if `id` is unknown; nothing is changed.
    pub fn delete(&mut self, id: &str) -> Result<(), ControllerError> {
        self.store.remove(id)?;
        self.view.remove_list_entry(id);
        match self.markers.remove_and_return(id) {
            Ok(marker) => self.view.remove_marker(&marker),
            Err(e) if self.map_ready => warn!(error = %e, "Marker index out of step"),
            Err(_) => {}
        }
        self.persist();
        if self.store.is_empty() {
            self.view.set_remove_all_visible(false);
        }
        info!(%id, "Workout deleted");
        Ok(())
    }

    /// Drops every workout and marker and saves the empty collection.
    /// Returns how many workouts were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.discard_all();
        self.persist();
        info!(removed, "All workouts cleared");
        removed
    }

    /// Like `clear_all`, but deletes the snapshot key instead of saving an empty one.
    /// # Errors
    /// Returns `PersistenceError` if the key cannot be removed.
    pub fn reset(&mut self) -> Result<usize, PersistenceError> {
        let removed = self.discard_all();
        self.persistence.reset()?;
        info!(removed, "Storage reset");
        Ok(removed)
    }

    /// Counts a click on workout `id` and centres the map on it.
    ///
    /// The new count is not saved here; it reaches storage with the next save.
    /// # Errors
    /// Returns `ControllerError::Store` if `id` is unknown.
    pub fn select(&mut self, id: &str) -> Result<u32, ControllerError> {
        let workout = self
            .store
            .find_by_id_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        workout.select();
        let (coords, count) = (workout.coords(), workout.interaction_count());
        if self.map_ready {
            self.view.center_map(coords, self.map_zoom);
        }
        Ok(count)
    }

    /// Saves the current collection now.
    /// # Errors
    /// Returns `PersistenceError` if the snapshot cannot be written.
    pub fn flush(&mut self) -> Result<(), PersistenceError> {
        self.persistence.save(self.store.workouts())
    }

    pub const fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub const fn markers(&self) -> &MarkerIndex<V::Marker> {
        &self.markers
    }

    pub const fn session(&self) -> &EditSession {
        &self.session
    }

    pub const fn pending_location(&self) -> Option<Coords> {
        self.pending_location
    }

    pub const fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    pub const fn map_zoom(&self) -> u8 {
        self.map_zoom
    }

    pub const fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    pub const fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    // Save failures never interrupt the caller.
    fn persist(&mut self) {
        if let Err(e) = self.persistence.save(self.store.workouts()) {
            error!(error = %e, "Failed to save workouts, continuing in memory");
        }
    }

    fn discard_all(&mut self) -> usize {
        self.view.set_remove_all_visible(false);
        self.view.remove_all_list_entries();
        for marker in self.markers.remove_all() {
            self.view.remove_marker(&marker);
        }
        self.store.clear().len()
    }

    fn next_id(&self, now: DateTime<Utc>) -> String {
        let mut candidate = now.timestamp_millis().rem_euclid(ID_MODULUS);
        loop {
            let id = format!("{candidate:010}");
            if !self.store.contains(&id) {
                return id;
            }
            candidate = (candidate + 1) % ID_MODULUS;
        }
    }
}
