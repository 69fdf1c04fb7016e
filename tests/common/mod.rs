//! Shared test doubles.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use mapty_lib::{
    Coords, FormView, MemoryStorage, PersistenceAdapter, Renderer, Workout, WorkoutController,
    WorkoutInput, WORKOUTS_KEY,
};
use mapty_lib::KeyValueStorage;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    ListEntry { id: String, replaced: Option<String> },
    Marker { id: String, handle: u32, is_replace: bool },
    RemoveMarker(u32),
    RemoveListEntry(String),
    RemoveAllListEntries,
    RemoveAllVisible(bool),
    CenterMap(Coords, u8),
    ShowForm(Option<WorkoutInput>),
    HideForm,
    Notify(String),
}

/// Records every call the controller makes on the view.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
    pub live_markers: Vec<u32>,
    next_handle: u32,
}

impl RecordingView {
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn notifications(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Notify(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_remove_all_visibility(&self) -> Option<bool> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::RemoveAllVisible(visible) => Some(*visible),
            _ => None,
        })
    }
}

impl Renderer for RecordingView {
    type Marker = u32;

    fn render_list_entry(&mut self, workout: &Workout, replace_existing: Option<&str>) {
        self.events.push(ViewEvent::ListEntry {
            id: workout.id().to_string(),
            replaced: replace_existing.map(str::to_string),
        });
    }

    fn render_marker(&mut self, workout: &Workout, is_replace: bool) -> u32 {
        self.next_handle += 1;
        self.live_markers.push(self.next_handle);
        self.events.push(ViewEvent::Marker {
            id: workout.id().to_string(),
            handle: self.next_handle,
            is_replace,
        });
        self.next_handle
    }

    fn remove_marker(&mut self, marker: &u32) {
        self.live_markers.retain(|m| m != marker);
        self.events.push(ViewEvent::RemoveMarker(*marker));
    }

    fn remove_list_entry(&mut self, id: &str) {
        self.events.push(ViewEvent::RemoveListEntry(id.to_string()));
    }

    fn remove_all_list_entries(&mut self) {
        self.events.push(ViewEvent::RemoveAllListEntries);
    }

    fn set_remove_all_visible(&mut self, visible: bool) {
        self.events.push(ViewEvent::RemoveAllVisible(visible));
    }

    fn center_map(&mut self, coords: Coords, zoom: u8) {
        self.events.push(ViewEvent::CenterMap(coords, zoom));
    }
}

impl FormView for RecordingView {
    fn show_form(&mut self, prefill: Option<&WorkoutInput>) {
        self.events.push(ViewEvent::ShowForm(prefill.copied()));
    }

    fn hide_form(&mut self) {
        self.events.push(ViewEvent::HideForm);
    }

    fn notify(&mut self, message: &str) {
        self.events.push(ViewEvent::Notify(message.to_string()));
    }
}

pub type TestController = WorkoutController<MemoryStorage, RecordingView>;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 2, 9, 30, 0).unwrap()
}

pub fn controller_with(storage: MemoryStorage) -> TestController {
    WorkoutController::new(PersistenceAdapter::new(storage), RecordingView::default())
        .with_clock(fixed_now)
}

pub fn controller() -> TestController {
    controller_with(MemoryStorage::new())
}

pub fn stored_blob(controller: &TestController) -> Option<String> {
    controller
        .persistence()
        .storage()
        .get(WORKOUTS_KEY)
        .expect("memory storage never fails to read")
}

pub fn stored_json(controller: &TestController) -> serde_json::Value {
    let blob = stored_blob(controller).expect("a snapshot should have been saved");
    serde_json::from_str(&blob).expect("snapshot should be valid JSON")
}
