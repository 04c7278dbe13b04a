use std::collections::HashSet;

use time::{Date, Month};

use crate::domain::plant::PlantRecord;
use crate::domain::timestamp::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: Date,
    pub watered: bool,
    pub fertilized: bool,
    pub measured: bool,
    pub today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: Month,
    /// Empty cells before the 1st in a Monday-first week.
    pub leading_blanks: u8,
    pub days: Vec<CalendarDay>,
}

pub fn month_view(
    record: &PlantRecord,
    year: i32,
    month: Month,
    today: Date,
) -> Option<CalendarMonth> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let watered = event_days(record.watering_history.iter().map(String::as_str));
    let fertilized = event_days(
        record
            .fertilizing_history
            .iter()
            .map(|entry| entry.timestamp.as_str()),
    );
    let measured = event_days(
        record
            .moisture_history
            .iter()
            .map(|entry| entry.timestamp.as_str()),
    );

    let mut days = Vec::with_capacity(31);
    let mut cursor = Some(first);
    while let Some(date) = cursor.filter(|date| date.month() == month) {
        days.push(CalendarDay {
            date,
            watered: watered.contains(&date),
            fertilized: fertilized.contains(&date),
            measured: measured.contains(&date),
            today: date == today,
        });
        cursor = date.next_day();
    }

    Some(CalendarMonth {
        year,
        month,
        leading_blanks: first.weekday().number_days_from_monday(),
        days,
    })
}

pub fn parse_year_month(raw: &str) -> Option<(i32, Month)> {
    let (year, month) = raw.trim().split_once('-')?;
    let year = year.parse::<i32>().ok()?;
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    Some((year, month))
}

fn event_days<'a>(raw: impl Iterator<Item = &'a str>) -> HashSet<Date> {
    raw.filter_map(parse_timestamp)
        .map(|instant| instant.date())
        .collect()
}
