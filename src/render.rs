// src/render.rs
//! Terminal stand-in for the map and the workout list.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io;

use mapty_lib::{
    Coords, FormView, Renderer, Units, Workout, WorkoutInput, WorkoutKind, KM_TO_MILE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerId(u64);

#[derive(Debug, Clone)]
pub struct MapMarker {
    pub id: MarkerId,
    pub coords: Coords,
    pub popup: String,
    pub popup_class: String,
}

/// Keeps the list and the map as plain data; `main` prints whatever it needs.
#[derive(Debug, Default)]
pub struct TerminalView {
    entries: Vec<Workout>,
    markers: Vec<MapMarker>,
    next_marker: u64,
    map_center: Option<(Coords, u8)>,
    remove_all_visible: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// List entries in display order (newest next to the form, so first).
    pub fn entries(&self) -> &[Workout] {
        &self.entries
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    pub const fn map_center(&self) -> Option<(Coords, u8)> {
        self.map_center
    }

    pub const fn remove_all_visible(&self) -> bool {
        self.remove_all_visible
    }
}

impl Renderer for TerminalView {
    type Marker = MarkerId;

    fn render_list_entry(&mut self, workout: &Workout, replace_existing: Option<&str>) {
        let existing =
            replace_existing.and_then(|id| self.entries.iter().position(|w| w.id() == id));
        match existing {
            Some(index) => self.entries[index] = workout.clone(),
            None => self.entries.insert(0, workout.clone()),
        }
    }

    fn render_marker(&mut self, workout: &Workout, is_replace: bool) -> MarkerId {
        self.next_marker += 1;
        let id = MarkerId(self.next_marker);
        self.markers.push(MapMarker {
            id,
            coords: workout.coords(),
            popup: format!("{} {}", workout.kind().icon(), workout.description()),
            popup_class: format!("{}-popup", workout.kind()),
        });
        tracing::debug!(marker = id.0, is_replace, "Marker placed");
        id
    }

    fn remove_marker(&mut self, marker: &MarkerId) {
        self.markers.retain(|m| m.id != *marker);
    }

    fn remove_list_entry(&mut self, id: &str) {
        self.entries.retain(|w| w.id() != id);
    }

    fn remove_all_list_entries(&mut self) {
        self.entries.clear();
    }

    fn set_remove_all_visible(&mut self, visible: bool) {
        self.remove_all_visible = visible;
    }

    fn center_map(&mut self, coords: Coords, zoom: u8) {
        self.map_center = Some((coords, zoom));
    }
}

impl FormView for TerminalView {
    fn show_form(&mut self, prefill: Option<&WorkoutInput>) {
        tracing::debug!(?prefill, "Form opened");
    }

    fn hide_form(&mut self) {
        tracing::debug!("Form closed");
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

fn display_distance(km: f64, units: Units) -> String {
    match units {
        Units::Metric => format!("{km:.2} km"),
        Units::Imperial => format!("{:.2} mi", km * KM_TO_MILE),
    }
}

fn display_metric(workout: &Workout, units: Units) -> String {
    let metric = workout.metric();
    match (workout.kind(), units) {
        (_, Units::Metric) => format!("{metric:.1} {}", workout.kind().metric_unit()),
        (WorkoutKind::Running, Units::Imperial) => {
            format!("{:.1} min/mi", metric / KM_TO_MILE)
        }
        (WorkoutKind::Cycling, Units::Imperial) => {
            format!("{:.1} mph", metric * KM_TO_MILE)
        }
    }
}

/// Prints workouts in a formatted table.
pub fn print_workout_table(workouts: &[Workout], header_color: Color, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Distance").fg(header_color),
            Cell::new("Duration (min)").fg(header_color),
            Cell::new("Pace / Speed").fg(header_color),
            Cell::new("Cadence / Elevation").fg(header_color),
            Cell::new("Location").fg(header_color),
            Cell::new("Clicks").fg(header_color),
        ]);

    for workout in workouts {
        let kind = workout.kind();
        let coords = workout.coords();
        table.add_row(vec![
            Cell::new(workout.id()),
            Cell::new(format!("{} {}", kind.icon(), workout.description())),
            Cell::new(display_distance(workout.distance_km(), units)),
            Cell::new(workout.duration_min().to_string()),
            Cell::new(display_metric(workout, units)),
            Cell::new(format!("{} {}", workout.variant_value(), kind.variant_unit())),
            Cell::new(format!("{:.4}, {:.4}", coords.lat, coords.lng)),
            Cell::new(workout.interaction_count().to_string()),
        ]);
    }
    println!("{table}");
}

/// Writes workouts as CSV to stdout. Distances are always km.
pub fn print_workout_csv(workouts: &[Workout]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "id",
        "type",
        "date",
        "lat",
        "lng",
        "distance_km",
        "duration_min",
        "metric",
        "variant_value",
        "clicks",
    ])?;
    for workout in workouts {
        let coords = workout.coords();
        writer.write_record([
            workout.id().to_string(),
            workout.kind().to_string(),
            workout.created_at().to_rfc3339(),
            coords.lat.to_string(),
            coords.lng.to_string(),
            workout.distance_km().to_string(),
            workout.duration_min().to_string(),
            format!("{:.2}", workout.metric()),
            workout.variant_value().to_string(),
            workout.interaction_count().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
