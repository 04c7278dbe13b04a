use std::io::{self, IsTerminal};

use crate::calendar::CalendarMonth;
use crate::domain::health::VigorBand;
use crate::domain::plant::PlantRecord;
use crate::domain::timestamp::parse_timestamp;
use crate::history::HistoryKind;
use crate::schedule::{format_short_date, CareSchedule, DueStatus};
use crate::timeline::TimelineEntry;

pub fn print_plant_list(plants: &[(PlantRecord, CareSchedule)]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Plants"));
    if plants.is_empty() {
        println!("{}", palette.dim("no plants yet"));
        return;
    }
    for (plant, schedule) in plants {
        println!("{}", format_plant_row(plant, schedule, &palette));
    }
    println!("{}", palette.dim(&format!("{} plant(s)", plants.len())));
}

fn format_plant_row(plant: &PlantRecord, schedule: &CareSchedule, palette: &Palette) -> String {
    format!(
        "{} {} {} {} water {}",
        palette.id(&plant.id),
        palette.vigor(plant.health.vigor_band(), plant.health.vigor_percent()),
        plant.display_name(),
        palette.dim(&format!("@ {}", plant.location)),
        palette.due(schedule.watering_status, schedule.next_watering.as_deref())
    )
}

pub fn print_plant_show(plant: &PlantRecord, schedule: &CareSchedule) {
    let palette = Palette::auto();
    println!(
        "{} {}",
        palette.heading(plant.display_name()),
        palette.id(&plant.id)
    );
    println!("  scientific name: {}", plant.identification.scientific_name);
    println!("  location: {}", plant.location);
    println!(
        "  health: {} {}",
        plant.health.status.as_str(),
        palette.vigor(plant.health.vigor_band(), plant.health.vigor_percent())
    );
    println!("  root health: {}%", plant.health.root_health_percent());
    if let Some(risk) = plant.health.pest_risk {
        println!("  pest risk: {}", risk.as_str());
    }
    if let Some(moisture) = plant.health.substrate_moisture {
        println!("  substrate moisture: {}/10", moisture);
    }
    if !plant.health.observations.trim().is_empty() {
        println!("  observations: {}", plant.health.observations);
    }

    let measures = plant.display_measures();
    let rows = [
        ("height", measures.height_cm),
        ("longest stem", measures.max_stem_length_cm),
        ("pot diameter", measures.pot_diameter_cm),
        ("pot height", measures.pot_height_cm),
        ("species max height", measures.max_species_height_cm),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            println!("  {label}: {value} cm");
        }
    }

    if let Some(study) = &plant.transplant_study {
        println!(
            "  transplant: {} (target pot {} cm)",
            study.need.as_str(),
            study.target_pot_cm
        );
    }
    if let Some(days) = plant.care.frequency_days {
        println!("  water every {} day(s)", days);
    }
    println!(
        "  next watering: {}",
        palette.due(schedule.watering_status, schedule.next_watering.as_deref())
    );
    println!(
        "  next fertilizing: {}",
        palette.due(schedule.fertilizing_status, schedule.next_fertilizing.as_deref())
    );
    println!(
        "{}",
        palette.dim(&format!(
            "{} image(s), {} event(s)",
            plant.images.len(),
            plant.watering_history.len()
                + plant.fertilizing_history.len()
                + plant.moisture_history.len()
        ))
    );
}

pub fn print_timeline(entries: &[TimelineEntry]) {
    let palette = Palette::auto();
    if entries.is_empty() {
        println!("{}", palette.dim("no care history yet"));
        return;
    }
    for entry in entries {
        println!("{}", format_timeline_row(entry, &palette));
    }
}

fn format_timeline_row(entry: &TimelineEntry, palette: &Palette) -> String {
    let detail = match entry.kind {
        HistoryKind::Watering => String::new(),
        HistoryKind::Fertilizing => entry
            .fertilizer
            .map(|kind| format!(" {}", kind))
            .unwrap_or_default(),
        HistoryKind::Moisture => entry
            .moisture
            .map(|value| format!(" {}/10", value))
            .unwrap_or_default(),
    };
    format!(
        "{} {}{} {}",
        palette.dim(&entry.date),
        palette.kind(entry.kind),
        detail,
        palette.dim(&format!("#{}", entry.native_index))
    )
}

pub fn print_schedules(rows: &[(String, CareSchedule)]) {
    let palette = Palette::auto();
    if rows.is_empty() {
        println!("{}", palette.dim("no plants yet"));
        return;
    }
    for (name, schedule) in rows {
        println!(
            "{} {} water {} fertilize {}",
            palette.id(&schedule.plant_id),
            name,
            palette.due(schedule.watering_status, schedule.next_watering.as_deref()),
            palette.due(schedule.fertilizing_status, schedule.next_fertilizing.as_deref())
        );
    }
}

pub fn print_calendar(month: &CalendarMonth) {
    let palette = Palette::auto();
    println!(
        "{}",
        palette.heading(&format!("{} {}", month.month, month.year))
    );
    for line in calendar_lines(month) {
        println!("{line}");
    }
    println!(
        "{}",
        palette.dim("W watered  F fertilized  M moisture  * today")
    );
}

/// Monday-first rows; each cell is the day number and up to four markers.
fn calendar_lines(month: &CalendarMonth) -> Vec<String> {
    let width = 7;
    let mut lines = vec![["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
        .iter()
        .map(|name| format!("{name:<width$}"))
        .collect::<String>()
        .trim_end()
        .to_string()];

    let mut cells: Vec<String> = vec![String::new(); usize::from(month.leading_blanks)];
    for day in &month.days {
        let mut cell = day.date.day().to_string();
        if day.watered {
            cell.push('W');
        }
        if day.fertilized {
            cell.push('F');
        }
        if day.measured {
            cell.push('M');
        }
        if day.today {
            cell.push('*');
        }
        cells.push(cell);
    }
    for week in cells.chunks(7) {
        let line = week
            .iter()
            .map(|cell| format!("{cell:<width$}"))
            .collect::<String>();
        lines.push(line.trim_end().to_string());
    }
    lines
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn vigor(&self, band: VigorBand, percent: u8) -> String {
        let code = match band {
            VigorBand::Healthy => "32",
            VigorBand::Watch => "33",
            VigorBand::Weak => "31",
        };
        self.paint(code, &format!("[{}% {}]", percent, band.as_str()))
    }

    fn due(&self, status: DueStatus, next: Option<&str>) -> String {
        let date = format_short_date(next.and_then(parse_timestamp));
        match status {
            DueStatus::Overdue => self.paint("1;31", &format!("{} ({})", date, status.as_str())),
            DueStatus::DueToday => self.paint("1;33", &format!("{} ({})", date, status.as_str())),
            DueStatus::Upcoming => self.paint("37", &date),
            DueStatus::Pending => self.dim(&date),
        }
    }

    fn kind(&self, kind: HistoryKind) -> String {
        let code = match kind {
            HistoryKind::Watering => "34",
            HistoryKind::Fertilizing => "32",
            HistoryKind::Moisture => "36",
        };
        self.paint(code, kind.as_str())
    }
}
