//src/main.rs
mod cli;
mod render;

use anyhow::{bail, Context, Result};
use comfy_table::Color;
use std::io::stdout;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mapty_lib::{AppService, Coords, Outcome, SqliteStorage, WorkoutController};
use render::TerminalView;

fn main() -> Result<()> {
    init_logging();

    let cli_args = cli::parse_args();
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        // --- Config/Path Commands ---
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
        cli::Commands::SetZoom { level } => match service.set_map_zoom_level(level) {
            Ok(()) => println!("Map zoom set to {level}. Config updated."),
            Err(e) => bail!("Error setting map zoom: {e}"),
        },
        cli::Commands::SetHome { lat, lng } => match service.set_home_position(lat, lng) {
            Ok(()) => println!("Home position set to {lat}, {lng}. Config updated."),
            Err(e) => bail!("Error setting home position: {e}"),
        },
        cli::Commands::SetUnits { units } => {
            let units = units.into();
            match service.set_units(units) {
                Ok(()) => println!("Display units set to {units:?}. Config updated."),
                Err(e) => bail!("Error setting units: {e}"),
            }
        }
        cli::Commands::SetHeaderColor { color } => match service.set_header_color(&color) {
            Ok(()) => println!("Header colour set to {color}. Config updated."),
            Err(e) => bail!("Error setting header colour: {e}"),
        },
        // --- Workout Commands ---
        command @ (cli::Commands::Add { .. }
        | cli::Commands::Edit { .. }
        | cli::Commands::Delete { .. }
        | cli::Commands::Clear
        | cli::Commands::Locate { .. }
        | cli::Commands::List
        | cli::Commands::Reset) => run_workout_command(service, command, export_csv)?,
    }

    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_workout_command(
    service: AppService,
    command: cli::Commands,
    export_csv: bool,
) -> Result<()> {
    let units = service.config.units;
    let header_color = mapty_lib::parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green); // Fallback
    let mut controller = service.into_controller(TerminalView::new());

    match command {
        cli::Commands::Add { lat, lng, workout } => {
            controller.show_form(Coords::new(lat, lng));
            match controller.submit(&workout.to_input()) {
                Ok(Outcome::Created(id)) => print_saved(&controller, &id, "Logged"),
                Ok(other) => bail!("Unexpected result while adding: {other:?}"),
                Err(e) => bail!("Error adding workout: {e}"),
            }
        }
        cli::Commands::Edit { id, workout } => {
            controller
                .request_edit(&id)
                .with_context(|| format!("Cannot edit workout ID {id}"))?;
            match controller.submit(&workout.to_input()) {
                Ok(Outcome::Edited(id)) => print_saved(&controller, &id, "Updated"),
                Ok(other) => bail!("Unexpected result while editing: {other:?}"),
                Err(e) => bail!("Error editing workout ID {id}: {e}"),
            }
        }
        cli::Commands::Delete { id } => match controller.delete(&id) {
            Ok(()) => println!("Deleted workout ID {id}."),
            Err(e) if e.is_not_found() => println!("Workout ID {id} not found. Nothing deleted."),
            Err(e) => bail!("Error deleting workout ID {id}: {e}"),
        },
        cli::Commands::Clear => {
            let removed = controller.clear_all();
            println!("Removed {removed} workout(s).");
        }
        cli::Commands::Locate { id } => {
            let clicks = controller
                .select(&id)
                .with_context(|| format!("Cannot locate workout ID {id}"))?;
            match controller.view().map_center() {
                Some((coords, zoom)) => {
                    println!("Map centred on {:.4}, {:.4} (zoom {zoom}).", coords.lat, coords.lng);
                    let markers = controller.view().markers();
                    for marker in markers.iter().filter(|m| m.coords == coords) {
                        println!("  [{}] {}", marker.popup_class, marker.popup);
                    }
                }
                None => {
                    println!("Map unavailable. Set a home position with 'set-home <lat> <lng>'.");
                }
            }
            println!("Workout ID {id} located {clicks} time(s).");
            // Click counts only reach storage with the next save.
            if let Err(e) = controller.flush() {
                tracing::warn!(error = %e, "Could not save click count");
            }
        }
        cli::Commands::List => {
            let view = controller.view();
            if view.entries().is_empty() {
                println!("No workouts logged yet. Add one with 'add --lat <LAT> --lng <LNG> ...'.");
            } else if export_csv {
                render::print_workout_csv(view.entries())?;
            } else {
                render::print_workout_table(view.entries(), header_color, units);
                if view.remove_all_visible() {
                    println!("Use 'clear' to remove all workouts.");
                }
            }
        }
        cli::Commands::Reset => {
            let removed = controller.reset().context("Failed to reset storage")?;
            println!("Storage reset; {removed} workout(s) discarded.");
        }
        cli::Commands::DbPath
        | cli::Commands::ConfigPath
        | cli::Commands::SetZoom { .. }
        | cli::Commands::SetHome { .. }
        | cli::Commands::SetUnits { .. }
        | cli::Commands::SetHeaderColor { .. }
        | cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Config commands are handled before the controller is built")
        }
    }
    Ok(())
}

fn print_saved(controller: &WorkoutController<SqliteStorage, TerminalView>, id: &str, verb: &str) {
    if let Some(workout) = controller.store().find_by_id(id) {
        println!(
            "{verb} {} {} (ID {id}): {:.1} {}",
            workout.kind().icon(),
            workout.description(),
            workout.metric(),
            workout.kind().metric_unit()
        );
    }
}
