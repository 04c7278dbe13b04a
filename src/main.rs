mod analysis;
mod app;
mod calendar;
mod cli;
mod codec;
mod completions;
mod config;
mod domain;
mod history;
mod logging;
mod plant_id;
mod schedule;
mod store;
mod timeline;
mod ui;

use std::str::FromStr;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::analysis::{Analyzer, CancellationToken, JsonFileAnalyzer, ReplyFileMoistureReader};
use crate::app::{App, AppError, CreatePlant};
use crate::config::Settings;
use crate::domain::fertilizer::FertilizerKind;
use crate::domain::measures::PlantMeasures;
use crate::domain::timestamp::{now_utc, parse_timestamp};
use crate::history::HistoryKind;

fn main() {
    logging::init();
    if let Err(err) = run() {
        tracing::debug!(error = ?err, "command failed");
        eprintln!("error: {}", err.user_message());
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    match cli.command {
        Commands::Completions(args) => completions::run_completions_command(&args.shell),
        command => {
            let settings = Settings::load(&cli.config, &cli.db)?;
            let app = App::open(&settings)?;
            dispatch(&app, command)
        }
    }
}

fn dispatch(app: &App, command: cli::Commands) -> Result<(), AppError> {
    use cli::Commands;

    match command {
        Commands::New(args) => {
            let raw_images = args
                .images
                .iter()
                .map(std::fs::read)
                .collect::<Result<Vec<_>, _>>()?;
            let images = app.encode_images(&raw_images)?;
            let analyzer: Arc<dyn Analyzer> = Arc::new(JsonFileAnalyzer::new(&args.analysis));
            let analysis = app.analyze(
                analyzer,
                &images,
                args.pot_diameter,
                CancellationToken::new(),
            )?;
            let record = app.create_plant(CreatePlant {
                images,
                analysis,
                location: args.location,
                user_measures: Some(PlantMeasures {
                    height_cm: args.height,
                    pot_diameter_cm: args.pot_diameter,
                    pot_height_cm: args.pot_height,
                    ..PlantMeasures::default()
                }),
            })?;
            if args.json {
                print_json(&record);
            } else {
                println!(
                    "created {} {} @ {}",
                    record.id,
                    record.display_name(),
                    record.location
                );
            }
        }
        Commands::Ls(args) => {
            if args.json {
                print_json(&app.list_plants());
            } else {
                ui::print_plant_list(&app.care_overview(now_utc()));
            }
        }
        Commands::Show(args) => {
            let record = app.show_plant(&args.id)?;
            if args.json {
                print_json(&record);
            } else {
                let schedule = app.care_schedule(&args.id, now_utc())?;
                ui::print_plant_show(&record, &schedule);
            }
        }
        Commands::Rm(args) => {
            app.remove_plant(&args.id)?;
            println!("removed {}", args.id);
        }
        Commands::Purge(args) => {
            if !args.yes {
                return Err(AppError::InvalidArgument(
                    "purge deletes every plant; pass --yes to confirm".to_string(),
                ));
            }
            app.purge()?;
            println!("purged all plant data");
        }
        Commands::Water(args) => {
            let at = parse_event_date(args.date.as_deref())?;
            let record = app.record_watering(&args.id, at)?;
            println!(
                "watered {} ({} watering(s))",
                record.id,
                record.watering_history.len()
            );
        }
        Commands::Fertilize(args) => {
            let at = parse_event_date(args.date.as_deref())?;
            let kind = args
                .kind
                .as_deref()
                .map(FertilizerKind::from_str)
                .transpose()
                .map_err(|err| AppError::InvalidArgument(err.to_string()))?;
            let record = app.record_fertilizing(&args.id, at, kind)?;
            println!(
                "fertilized {} with {}",
                record.id,
                kind.unwrap_or_default()
            );
        }
        Commands::Moisture(args) => {
            let image = match args.image.as_deref() {
                Some(path) => Some(app.encode_image(&std::fs::read(path)?)?),
                None => None,
            };
            let record = match (args.value, args.reply, image) {
                (Some(value), _, image) => {
                    let at = parse_event_date(args.date.as_deref())?;
                    app.record_moisture(&args.id, value, at, image)?
                }
                (None, Some(reply), Some(image)) => {
                    app.quick_moisture(&args.id, &image, &ReplyFileMoistureReader::new(reply))?
                }
                _ => {
                    return Err(AppError::InvalidArgument(
                        "provide --value, or --reply with --image".to_string(),
                    ))
                }
            };
            let value = record
                .moisture_history
                .last()
                .map(|entry| entry.value)
                .unwrap_or_default();
            println!("recorded moisture {}/10 for {}", value, record.id);
        }
        Commands::History(args) => {
            let entries = app.timeline(&args.id)?;
            if args.json {
                print_json(&entries);
            } else {
                ui::print_timeline(&entries);
            }
        }
        Commands::Forget(args) => {
            let kind = HistoryKind::from_str(&args.kind)?;
            app.delete_event(&args.id, kind, args.index)?;
            println!("forgot {} #{} of {}", kind, args.index, args.id);
        }
        Commands::Schedule(args) => {
            let now = now_utc();
            let rows = match args.id.as_deref() {
                Some(id) => {
                    let record = app.show_plant(id)?;
                    let schedule = app.care_schedule(id, now)?;
                    vec![(record.display_name().to_string(), schedule)]
                }
                None => app
                    .care_overview(now)
                    .into_iter()
                    .map(|(record, schedule)| (record.display_name().to_string(), schedule))
                    .collect(),
            };
            if args.json {
                let schedules: Vec<_> = rows.iter().map(|(_, schedule)| schedule).collect();
                print_json(&schedules);
            } else {
                ui::print_schedules(&rows);
            }
        }
        Commands::Calendar(args) => {
            let now = now_utc();
            let (year, month) = match args.month.as_deref() {
                Some(raw) => calendar::parse_year_month(raw).ok_or_else(|| {
                    AppError::InvalidArgument(format!("'{raw}' is not a YYYY-MM month"))
                })?,
                None => (now.year(), now.month()),
            };
            let view = app.calendar(&args.id, year, month, now.date())?;
            ui::print_calendar(&view);
        }
        Commands::Report(args) => {
            println!("{}", app.botanical_report(&args.id)?);
        }
        Commands::Locate(args) => {
            let record = app.set_location(&args.id, &args.location)?;
            println!("moved {} to {}", record.id, record.location);
        }
        Commands::Measure(args) => {
            let record = app.set_user_measures(
                &args.id,
                PlantMeasures {
                    height_cm: args.height,
                    max_stem_length_cm: args.stem,
                    pot_diameter_cm: args.pot_diameter,
                    pot_height_cm: args.pot_height,
                    max_species_height_cm: None,
                },
            )?;
            println!("updated measures for {}", record.id);
        }
        Commands::Completions(args) => completions::run_completions_command(&args.shell)?,
    }

    Ok(())
}

/// `None` means "now"; anything given must parse.
fn parse_event_date(raw: Option<&str>) -> Result<Option<OffsetDateTime>, AppError> {
    raw.map(|value| {
        parse_timestamp(value).ok_or_else(|| {
            AppError::InvalidArgument(format!(
                "'{value}' is not an RFC3339 timestamp or YYYY-MM-DD date"
            ))
        })
    })
    .transpose()
}
