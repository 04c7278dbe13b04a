use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::fertilizer::FertilizerKind;
use crate::domain::plant::{FertilizingEntry, MoistureEntry, PlantRecord};
use crate::domain::timestamp::normalize_timestamp;

pub const MAX_MOISTURE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Watering,
    Fertilizing,
    Moisture,
}

impl HistoryKind {
    pub const ALL: [HistoryKind; 3] = [
        HistoryKind::Watering,
        HistoryKind::Fertilizing,
        HistoryKind::Moisture,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HistoryKind::Watering => "watering",
            HistoryKind::Fertilizing => "fertilizing",
            HistoryKind::Moisture => "moisture",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryKind {
    type Err = HistoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "watering" | "water" | "riego" => Ok(HistoryKind::Watering),
            "fertilizing" | "fertilize" | "abono" => Ok(HistoryKind::Fertilizing),
            "moisture" | "hidrometria" | "hidrometría" => Ok(HistoryKind::Moisture),
            _ => Err(HistoryError::UnknownKind(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    InvalidTimestamp(String),
    MoistureOutOfRange(u8),
    IndexOutOfRange {
        kind: HistoryKind,
        index: usize,
        len: usize,
    },
    UnknownKind(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::InvalidTimestamp(raw) => write!(
                f,
                "invalid event date '{}': expected RFC3339 or YYYY-MM-DD",
                raw
            ),
            HistoryError::MoistureOutOfRange(value) => write!(
                f,
                "moisture reading {} is out of range 0..={}",
                value, MAX_MOISTURE
            ),
            HistoryError::IndexOutOfRange { kind, index, len } => write!(
                f,
                "{} history has {} entries; index {} does not exist",
                kind, len, index
            ),
            HistoryError::UnknownKind(raw) => write!(
                f,
                "unknown history kind '{}': expected watering, fertilizing or moisture",
                raw
            ),
        }
    }
}

impl Error for HistoryError {}

pub fn append_watering(record: &mut PlantRecord, timestamp: &str) -> Result<(), HistoryError> {
    let timestamp = event_timestamp(timestamp)?;
    record.watering_history.push(timestamp);
    Ok(())
}

pub fn append_fertilizing(
    record: &mut PlantRecord,
    timestamp: &str,
    kind: Option<FertilizerKind>,
) -> Result<(), HistoryError> {
    let timestamp = event_timestamp(timestamp)?;
    record.fertilizing_history.push(FertilizingEntry {
        timestamp,
        kind: kind.unwrap_or_default(),
    });
    Ok(())
}

/// Appends a reading and mirrors it into the current health snapshot.
pub fn append_moisture(
    record: &mut PlantRecord,
    timestamp: &str,
    value: u8,
    source_image: Option<String>,
) -> Result<(), HistoryError> {
    if value > MAX_MOISTURE {
        return Err(HistoryError::MoistureOutOfRange(value));
    }
    let timestamp = event_timestamp(timestamp)?;
    record.moisture_history.push(MoistureEntry {
        timestamp,
        value,
        source_image,
    });
    record.health.substrate_moisture = Some(value);
    Ok(())
}

/// Removes one entry by its position in the kind's own storage order.
pub fn delete_at(
    record: &mut PlantRecord,
    kind: HistoryKind,
    index: usize,
) -> Result<(), HistoryError> {
    let len = history_len(record, kind);
    if index >= len {
        return Err(HistoryError::IndexOutOfRange { kind, index, len });
    }
    match kind {
        HistoryKind::Watering => {
            record.watering_history.remove(index);
        }
        HistoryKind::Fertilizing => {
            record.fertilizing_history.remove(index);
        }
        HistoryKind::Moisture => {
            record.moisture_history.remove(index);
        }
    }
    Ok(())
}

pub fn history_len(record: &PlantRecord, kind: HistoryKind) -> usize {
    match kind {
        HistoryKind::Watering => record.watering_history.len(),
        HistoryKind::Fertilizing => record.fertilizing_history.len(),
        HistoryKind::Moisture => record.moisture_history.len(),
    }
}

fn event_timestamp(raw: &str) -> Result<String, HistoryError> {
    normalize_timestamp(raw).ok_or_else(|| HistoryError::InvalidTimestamp(raw.to_string()))
}
