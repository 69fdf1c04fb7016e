// src/cli.rs
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use mapty_lib::{Units, WorkoutInput, WorkoutKind};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Log running and cycling workouts pinned to the map",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print listings as CSV instead of a table
    #[arg(long, global = true)]
    pub export_csv: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutKindCli {
    Running,
    Cycling,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Metric,
    Imperial,
}

/// The fields of the workout form.
#[derive(Args, Debug, Clone)]
pub struct WorkoutArgs {
    /// Kind of workout
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: WorkoutKindCli,

    /// Distance in km
    #[arg(short, long, allow_negative_numbers = true)]
    pub distance: f64,

    /// Duration in minutes
    #[arg(short = 'm', long, allow_negative_numbers = true)]
    pub duration: f64,

    /// Cadence in steps per minute (running)
    #[arg(short, long, allow_negative_numbers = true)]
    pub cadence: Option<f64>,

    /// Elevation gain in meters (cycling)
    #[arg(short, long, allow_negative_numbers = true)]
    pub elevation: Option<f64>,
}

impl WorkoutArgs {
    /// Maps the raw flags onto form input. A missing kind-specific value becomes NaN
    /// so it fails validation like an empty form field would.
    pub fn to_input(&self) -> WorkoutInput {
        let (kind, variant_value) = match self.kind {
            WorkoutKindCli::Running => (WorkoutKind::Running, self.cadence),
            WorkoutKindCli::Cycling => (WorkoutKind::Cycling, self.elevation),
        };
        WorkoutInput {
            kind,
            distance_km: self.distance,
            duration_min: self.duration,
            variant_value: variant_value.unwrap_or(f64::NAN),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log a new workout at a map position
    Add {
        /// Latitude of the workout
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude of the workout
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[command(flatten)]
        workout: WorkoutArgs,
    },
    /// Replace the metrics of an existing workout (its position and date are kept)
    Edit {
        /// ID of the workout to edit
        id: String,
        #[command(flatten)]
        workout: WorkoutArgs,
    },
    /// Delete a workout
    Delete {
        /// ID of the workout to delete
        id: String,
    },
    /// Delete every workout
    Clear,
    /// Centre the map on a workout
    Locate {
        /// ID of the workout to locate
        id: String,
    },
    /// List workouts, newest first
    List,
    /// Remove the stored workouts entirely
    Reset,
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Set the zoom level used when centring the map
    SetZoom { level: u8 },
    /// Set the position reported as your current location
    SetHome {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Set display units
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    /// Set the table header colour
    SetHeaderColor { color: String },
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl From<UnitsCli> for Units {
    fn from(value: UnitsCli) -> Self {
        match value {
            UnitsCli::Metric => Self::Metric,
            UnitsCli::Imperial => Self::Imperial,
        }
    }
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
