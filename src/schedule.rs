use serde::Serialize;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

use crate::domain::plant::PlantRecord;
use crate::domain::timestamp::{format_rfc3339, parse_timestamp};

pub const DEFAULT_WATERING_DAYS: u32 = 7;
pub const FERTILIZING_INTERVAL_DAYS: i64 = 30;

const PENDING: &str = "Pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    DueToday,
    Upcoming,
    /// No due date could be computed.
    Pending,
}

impl DueStatus {
    pub fn of(due: Option<OffsetDateTime>, now: OffsetDateTime) -> Self {
        due.map_or(DueStatus::Pending, |due| DueStatus::between(due, now))
    }

    pub fn between(due: OffsetDateTime, now: OffsetDateTime) -> Self {
        let due_day = due.date();
        let today = now.date();
        if due_day < today {
            DueStatus::Overdue
        } else if due_day == today {
            DueStatus::DueToday
        } else {
            DueStatus::Upcoming
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DueStatus::Overdue => "overdue",
            DueStatus::DueToday => "due today",
            DueStatus::Upcoming => "upcoming",
            DueStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CareSchedule {
    pub plant_id: String,
    pub next_watering: Option<String>,
    pub watering_status: DueStatus,
    pub next_fertilizing: Option<String>,
    pub fertilizing_status: DueStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleCalculator {
    default_watering_days: u32,
}

impl Default for ScheduleCalculator {
    fn default() -> Self {
        Self {
            default_watering_days: DEFAULT_WATERING_DAYS,
        }
    }
}

impl ScheduleCalculator {
    pub fn new(default_watering_days: u32) -> Self {
        Self {
            default_watering_days: default_watering_days.max(1),
        }
    }

    /// Latest watering plus the record's frequency. With no history the plant
    /// is due `now`. Past results are returned as-is. `None` means no date can
    /// be computed: every stored entry is unparseable or the sum leaves the
    /// representable range.
    pub fn next_watering_date(
        &self,
        record: &PlantRecord,
        now: OffsetDateTime,
    ) -> Option<OffsetDateTime> {
        let days = i64::from(self.watering_days(record));
        next_after(
            record.watering_history.iter().map(String::as_str),
            days,
            now,
        )
    }

    /// Latest fertilizing plus the fixed 30-day interval; `frequencyDays` plays no part.
    pub fn next_fertilizing_date(
        &self,
        record: &PlantRecord,
        now: OffsetDateTime,
    ) -> Option<OffsetDateTime> {
        next_after(
            record
                .fertilizing_history
                .iter()
                .map(|entry| entry.timestamp.as_str()),
            FERTILIZING_INTERVAL_DAYS,
            now,
        )
    }

    pub fn care_schedule(&self, record: &PlantRecord, now: OffsetDateTime) -> CareSchedule {
        let watering = self.next_watering_date(record, now);
        let fertilizing = self.next_fertilizing_date(record, now);
        CareSchedule {
            plant_id: record.id.clone(),
            next_watering: watering.map(format_rfc3339),
            watering_status: DueStatus::of(watering, now),
            next_fertilizing: fertilizing.map(format_rfc3339),
            fertilizing_status: DueStatus::of(fertilizing, now),
        }
    }

    fn watering_days(&self, record: &PlantRecord) -> u32 {
        match record.care.frequency_days {
            Some(days) if days > 0 => days,
            _ => self.default_watering_days,
        }
    }
}

fn next_after<'a>(
    raw: impl Iterator<Item = &'a str>,
    interval_days: i64,
    now: OffsetDateTime,
) -> Option<OffsetDateTime> {
    let mut raw = raw.peekable();
    if raw.peek().is_none() {
        return Some(now);
    }
    let latest = raw.filter_map(parse_timestamp).max()?;
    latest.checked_add(Duration::days(interval_days))
}

pub fn format_short_date(date: Option<OffsetDateTime>) -> String {
    date.and_then(|value| {
        value
            .format(format_description!("[day padding:none] [month repr:short]"))
            .ok()
    })
    .unwrap_or_else(|| PENDING.to_string())
}
