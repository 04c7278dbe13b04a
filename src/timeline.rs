use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::fertilizer::FertilizerKind;
use crate::domain::plant::PlantRecord;
use crate::domain::timestamp::parse_timestamp;
use crate::history::HistoryKind;

/// One row of the merged history. `native_index` addresses the entry inside its
/// own kind's list and is what deletions must use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub date: String,
    pub kind: HistoryKind,
    pub native_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fertilizer: Option<FertilizerKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture: Option<u8>,
    #[serde(skip)]
    pub at: Option<OffsetDateTime>,
}

impl TimelineEntry {
    fn new(date: &str, kind: HistoryKind, native_index: usize) -> Self {
        Self {
            date: date.to_string(),
            kind,
            native_index,
            fertilizer: None,
            moisture: None,
            at: parse_timestamp(date),
        }
    }
}

/// Merges the three histories, most recent first.
///
/// Equal instants order by kind (watering, fertilizing, moisture) and then by
/// native index descending, so the later append of the same kind comes first.
/// Rows whose date cannot be parsed sink to the end.
pub fn reconcile(record: &PlantRecord) -> Vec<TimelineEntry> {
    let watering = record
        .watering_history
        .iter()
        .enumerate()
        .map(|(index, date)| TimelineEntry::new(date, HistoryKind::Watering, index));
    let fertilizing = record
        .fertilizing_history
        .iter()
        .enumerate()
        .map(|(index, entry)| TimelineEntry {
            fertilizer: Some(entry.kind),
            ..TimelineEntry::new(&entry.timestamp, HistoryKind::Fertilizing, index)
        });
    let moisture = record
        .moisture_history
        .iter()
        .enumerate()
        .map(|(index, entry)| TimelineEntry {
            moisture: Some(entry.value),
            ..TimelineEntry::new(&entry.timestamp, HistoryKind::Moisture, index)
        });

    let mut entries = watering.chain(fertilizing).chain(moisture).collect::<Vec<_>>();
    entries.sort_by(|left, right| {
        right
            .at
            .cmp(&left.at)
            .then_with(|| left.kind.cmp(&right.kind))
            .then_with(|| right.native_index.cmp(&left.native_index))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::reconcile;
    use crate::domain::fertilizer::FertilizerKind;
    use crate::domain::plant::fixtures::sample_plant;
    use crate::history::{
        append_fertilizing, append_moisture, append_watering, delete_at, HistoryKind,
    };

    fn populated() -> crate::domain::plant::PlantRecord {
        let mut plant = sample_plant("p1");
        append_watering(&mut plant, "2024-01-10T00:00:00Z").expect("append");
        append_watering(&mut plant, "2024-01-01T00:00:00Z").expect("append");
        append_watering(&mut plant, "2024-01-20T00:00:00Z").expect("append");
        append_fertilizing(&mut plant, "2024-01-15T00:00:00Z", Some(FertilizerKind::Stick))
            .expect("append");
        append_moisture(&mut plant, "2024-01-05T00:00:00Z", 6, None).expect("append");
        append_moisture(&mut plant, "2024-01-25T00:00:00Z", 2, None).expect("append");
        plant
    }

    #[test]
    fn merges_all_kinds_most_recent_first() {
        let rows = reconcile(&populated());
        let order = rows
            .iter()
            .map(|row| (row.kind, row.native_index))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                (HistoryKind::Moisture, 1),
                (HistoryKind::Watering, 2),
                (HistoryKind::Fertilizing, 0),
                (HistoryKind::Watering, 0),
                (HistoryKind::Moisture, 0),
                (HistoryKind::Watering, 1),
            ]
        );
        assert_eq!(rows[0].moisture, Some(2));
        assert_eq!(rows[2].fertilizer, Some(FertilizerKind::Stick));
    }

    #[test]
    fn length_matches_sum_of_histories() {
        let plant = populated();
        let total = plant.watering_history.len()
            + plant.fertilizing_history.len()
            + plant.moisture_history.len();
        assert_eq!(reconcile(&plant).len(), total);
        assert!(reconcile(&sample_plant("empty")).is_empty());
    }

    #[test]
    fn every_row_deletes_exactly_its_source_entry() {
        let plant = populated();
        for row in reconcile(&plant) {
            let mut candidate = plant.clone();
            delete_at(&mut candidate, row.kind, row.native_index).expect("delete should succeed");
            let remaining = reconcile(&candidate);
            assert_eq!(remaining.len(), reconcile(&plant).len() - 1);

            let mut expected = reconcile(&plant)
                .into_iter()
                .filter(|other| other != &row)
                .map(|other| (other.kind, other.date, other.fertilizer, other.moisture))
                .collect::<Vec<_>>();
            let mut actual = remaining
                .into_iter()
                .map(|other| (other.kind, other.date, other.fertilizer, other.moisture))
                .collect::<Vec<_>>();
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn equal_instants_break_ties_by_kind_then_newest_append() {
        let mut plant = sample_plant("p1");
        let same = "2024-02-01T09:00:00Z";
        append_moisture(&mut plant, same, 5, None).expect("append");
        append_fertilizing(&mut plant, same, None).expect("append");
        append_watering(&mut plant, same).expect("append");
        append_watering(&mut plant, same).expect("append");

        let order = reconcile(&plant)
            .iter()
            .map(|row| (row.kind, row.native_index))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                (HistoryKind::Watering, 1),
                (HistoryKind::Watering, 0),
                (HistoryKind::Fertilizing, 0),
                (HistoryKind::Moisture, 0),
            ]
        );
    }

    #[test]
    fn unparseable_legacy_dates_sink_to_the_end() {
        let mut plant = sample_plant("p1");
        plant.watering_history.push("not a date".to_string());
        append_watering(&mut plant, "2020-01-01T00:00:00Z").expect("append");
        let rows = reconcile(&plant);
        assert_eq!(rows[0].native_index, 1);
        assert_eq!(rows[1].date, "not a date");
        assert!(rows[1].at.is_none());
    }

    #[test]
    fn recomputes_after_mutation() {
        let mut plant = populated();
        let before = reconcile(&plant).len();
        append_watering(&mut plant, "2024-02-01T00:00:00Z").expect("append");
        let after = reconcile(&plant);
        assert_eq!(after.len(), before + 1);
        assert_eq!(after[0].kind, HistoryKind::Watering);
        assert_eq!(after[0].native_index, 3);
    }
}
