use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::config::{DEFAULT_CONFIG_PATH, DEFAULT_DB_PATH};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "botanica")]
#[command(bin_name = "botanica")]
#[command(version)]
#[command(about = "Local-first plant care journal")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "BOTANICA_DB_PATH",
        default_value = DEFAULT_DB_PATH,
        help = "Path to the local SQLite store."
    )]
    pub db: PathBuf,

    #[arg(
        short = 'c',
        long,
        env = "BOTANICA_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        help = "Path to the optional TOML settings file."
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Register a plant from captured images and a saved analysis.")]
    New(NewArgs),
    #[command(about = "List plants with their next watering.")]
    Ls(ListArgs),
    #[command(about = "Show one plant.")]
    Show(ShowArgs),
    #[command(about = "Delete one plant and its history.")]
    Rm(IdArgs),
    #[command(about = "Delete every stored plant.")]
    Purge(PurgeArgs),
    #[command(about = "Record a watering.")]
    Water(WaterArgs),
    #[command(about = "Record a fertilizing.")]
    Fertilize(FertilizeArgs),
    #[command(about = "Record a substrate moisture reading.")]
    Moisture(MoistureArgs),
    #[command(about = "Show the merged care history, newest first.")]
    History(HistoryArgs),
    #[command(about = "Delete one history entry by kind and index.")]
    Forget(ForgetArgs),
    #[command(about = "Show next watering and fertilizing dates.")]
    Schedule(ScheduleArgs),
    #[command(about = "Show a month of care events.")]
    Calendar(CalendarArgs),
    #[command(about = "Print the botanical profile as plain text.")]
    Report(IdArgs),
    #[command(about = "Change where a plant lives.")]
    Locate(LocateArgs),
    #[command(about = "Record your own measurements.")]
    Measure(MeasureArgs),
    #[command(about = "Generate shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct NewArgs {
    #[arg(
        short = 'a',
        long,
        help = "JSON file holding the analysis result for the images."
    )]
    pub analysis: PathBuf,

    #[arg(
        short = 'i',
        long = "image",
        help = "Captured still (JPEG or PNG). Repeat for more angles."
    )]
    pub images: Vec<PathBuf>,

    #[arg(short = 'l', long, default_value = "", help = "Where the plant lives.")]
    pub location: String,

    #[arg(long, help = "Measured plant height in cm.")]
    pub height: Option<f64>,

    #[arg(long = "pot-diameter", help = "Measured pot diameter in cm.")]
    pub pot_diameter: Option<f64>,

    #[arg(long = "pot-height", help = "Measured pot height in cm.")]
    pub pot_height: Option<f64>,

    #[arg(long, help = "Print the created plant as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, help = "Print JSON instead of a table.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(long, help = "Print the stored record as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Plant id.")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct PurgeArgs {
    #[arg(long, help = "Confirm deleting all data.")]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct WaterArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(long, help = "When it happened (RFC3339 or YYYY-MM-DD). Defaults to now.")]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct FertilizeArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(long, help = "When it happened (RFC3339 or YYYY-MM-DD). Defaults to now.")]
    pub date: Option<String>,

    #[arg(short = 'k', long, help = "Fertilizer kind: liquid or stick.")]
    pub kind: Option<String>,
}

#[derive(Debug, Args)]
pub struct MoistureArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(
        short = 'v',
        long,
        conflicts_with = "reply",
        help = "Reading on the 0-10 scale."
    )]
    pub value: Option<u8>,

    #[arg(
        long,
        requires = "image",
        help = "Text file with a meter or assistant reply; its first number is the reading."
    )]
    pub reply: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with = "reply",
        help = "When it happened (RFC3339 or YYYY-MM-DD). Defaults to now."
    )]
    pub date: Option<String>,

    #[arg(short = 'i', long, help = "Photo of the meter to keep with the reading.")]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(long, help = "Print JSON instead of a table.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ForgetArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(short = 'k', long, help = "History kind: watering, fertilizing or moisture.")]
    pub kind: String,

    #[arg(
        short = 'n',
        long,
        help = "Index within that kind, as printed by `botanica history`."
    )]
    pub index: usize,
}

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[arg(help = "Plant id. Omit for every plant.")]
    pub id: Option<String>,

    #[arg(long, help = "Print JSON instead of a table.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CalendarArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(short = 'm', long, help = "Month as YYYY-MM. Defaults to the current month.")]
    pub month: Option<String>,
}

#[derive(Debug, Args)]
pub struct LocateArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(help = "New location. Empty means unassigned.")]
    pub location: String,
}

#[derive(Debug, Args)]
pub struct MeasureArgs {
    #[arg(help = "Plant id.")]
    pub id: String,

    #[arg(long, help = "Plant height in cm.")]
    pub height: Option<f64>,

    #[arg(long, help = "Longest stem in cm.")]
    pub stem: Option<f64>,

    #[arg(long = "pot-diameter", help = "Pot diameter in cm.")]
    pub pot_diameter: Option<f64>,

    #[arg(long = "pot-height", help = "Pot height in cm.")]
    pub pot_height: Option<f64>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish, elvish, powershell).")]
    pub shell: String,
}
