use std::error::Error;
use std::fmt;
use std::sync::Arc;

use time::{Date, Month, OffsetDateTime};
use tracing::{debug, info};

use crate::analysis::{
    AnalysisError, AnalysisResult, AnalysisTask, Analyzer, CancellationToken, MoistureReader,
};
use crate::calendar::{self, CalendarMonth};
use crate::codec::{encode_batch, CodecError, ImageCodec, JpegCodec};
use crate::config::{ConfigError, Settings};
use crate::domain::fertilizer::FertilizerKind;
use crate::domain::measures::PlantMeasures;
use crate::domain::plant::{NewPlant, PlantRecord, UNASSIGNED_LOCATION};
use crate::domain::timestamp::{format_rfc3339, now_utc};
use crate::history::{self, HistoryError, HistoryKind};
use crate::plant_id::generate_plant_id;
use crate::schedule::{CareSchedule, ScheduleCalculator};
use crate::store::{PlantStore, SlotBackend, SlotError, SqliteSlots, StoreError};
use crate::timeline::{self, TimelineEntry};

const MAX_ID_ATTEMPTS: u32 = 8;

pub struct App {
    store: PlantStore,
    codec: JpegCodec,
    calculator: ScheduleCalculator,
    max_images: usize,
}

/// Inputs of the confirmation step that turns an analysis into a stored plant.
#[derive(Debug, Clone)]
pub struct CreatePlant {
    pub images: Vec<String>,
    pub analysis: AnalysisResult,
    pub location: String,
    pub user_measures: Option<PlantMeasures>,
}

impl App {
    pub fn open(settings: &Settings) -> Result<Self, AppError> {
        let backend = SqliteSlots::open(&settings.db_path, settings.storage.quota_bytes)?;
        Ok(Self::with_backend(backend, settings))
    }

    pub fn with_backend(backend: impl SlotBackend + 'static, settings: &Settings) -> Self {
        Self {
            store: PlantStore::with_key(backend, settings.storage.slot_key.clone()),
            codec: JpegCodec::new(settings.codec.max_edge_px, settings.codec.quality),
            calculator: ScheduleCalculator::new(settings.care.default_watering_days),
            max_images: settings.codec.max_images,
        }
    }

    /// Encodes captured stills into data URLs. Captures beyond the configured
    /// limit are refused; a still that fails to encode is dropped.
    pub fn encode_images(&self, raw_images: &[Vec<u8>]) -> Result<Vec<String>, AppError> {
        if raw_images.len() > self.max_images {
            return Err(AppError::InvalidArgument(format!(
                "at most {} images can be captured per plant",
                self.max_images
            )));
        }
        let encoded = encode_batch(&self.codec, raw_images, self.max_images);
        Ok(encoded.into_iter().map(|image| image.data_url).collect())
    }

    /// Encodes one still, failing instead of dropping it.
    pub fn encode_image(&self, raw: &[u8]) -> Result<String, AppError> {
        Ok(self.codec.encode(raw)?.data_url)
    }

    /// Runs `analyzer` on a worker thread tied to `token`.
    pub fn analyze(
        &self,
        analyzer: Arc<dyn Analyzer>,
        images: &[String],
        current_pot_diameter_cm: Option<f64>,
        token: CancellationToken,
    ) -> Result<AnalysisResult, AppError> {
        if images.is_empty() {
            return Err(AppError::InvalidArgument(
                "capture at least one usable image before analysis".to_string(),
            ));
        }
        let task = AnalysisTask::spawn(analyzer, images.to_vec(), current_pot_diameter_cm, token);
        Ok(task.join()?)
    }

    pub fn create_plant(&self, input: CreatePlant) -> Result<PlantRecord, AppError> {
        if input.images.len() > self.max_images {
            return Err(AppError::InvalidArgument(format!(
                "at most {} images can be stored per plant",
                self.max_images
            )));
        }
        let created_at = format_rfc3339(now_utc());
        let mut attempts = 0;
        let record = loop {
            let existing = self.store.load();
            let id = generate_plant_id(&input.analysis.identification.common_name, |candidate| {
                existing.iter().any(|plant| plant.id == candidate)
            });
            let record = PlantRecord::from_analysis(NewPlant {
                id,
                location: input.location.clone(),
                analysis: input.analysis.clone(),
                images: input.images.clone(),
                user_measures: input.user_measures.clone(),
                created_at: created_at.clone(),
            });
            // The id check above ran outside the store lock; insert re-checks under it.
            match self.store.insert(&record) {
                Ok(()) => break record,
                Err(StoreError::DuplicateId(id)) if attempts < MAX_ID_ATTEMPTS => {
                    attempts += 1;
                    debug!(plant = %id, attempts, "plant id taken concurrently; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        };
        info!(plant = %record.id, name = %record.display_name(), "created plant");
        Ok(record)
    }

    pub fn list_plants(&self) -> Vec<PlantRecord> {
        self.store.load()
    }

    pub fn show_plant(&self, id: &str) -> Result<PlantRecord, AppError> {
        self.store
            .find(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub fn record_watering(
        &self,
        id: &str,
        at: Option<OffsetDateTime>,
    ) -> Result<PlantRecord, AppError> {
        let timestamp = event_time(at);
        self.store.update(id, |record| {
            history::append_watering(record, &timestamp).map_err(AppError::from)
        })
    }

    pub fn record_fertilizing(
        &self,
        id: &str,
        at: Option<OffsetDateTime>,
        kind: Option<FertilizerKind>,
    ) -> Result<PlantRecord, AppError> {
        let timestamp = event_time(at);
        self.store.update(id, |record| {
            history::append_fertilizing(record, &timestamp, kind).map_err(AppError::from)
        })
    }

    pub fn record_moisture(
        &self,
        id: &str,
        value: u8,
        at: Option<OffsetDateTime>,
        source_image: Option<String>,
    ) -> Result<PlantRecord, AppError> {
        let timestamp = event_time(at);
        self.store.update(id, |record| {
            history::append_moisture(record, &timestamp, value, source_image)
                .map_err(AppError::from)
        })
    }

    /// Asks `reader` for a reading of `image` and records it with the image attached.
    pub fn quick_moisture(
        &self,
        id: &str,
        image: &str,
        reader: &dyn MoistureReader,
    ) -> Result<PlantRecord, AppError> {
        if self.store.find(id).is_none() {
            return Err(AppError::NotFound(id.to_string()));
        }
        let value = reader.read_moisture(image)?.min(history::MAX_MOISTURE);
        self.record_moisture(id, value, None, Some(image.to_string()))
    }

    /// `index` is the entry's position in its own history, as listed by [`App::timeline`].
    pub fn delete_event(
        &self,
        id: &str,
        kind: HistoryKind,
        index: usize,
    ) -> Result<PlantRecord, AppError> {
        self.store.update(id, |record| {
            history::delete_at(record, kind, index).map_err(AppError::from)
        })
    }

    pub fn timeline(&self, id: &str) -> Result<Vec<TimelineEntry>, AppError> {
        Ok(timeline::reconcile(&self.show_plant(id)?))
    }

    pub fn care_schedule(&self, id: &str, now: OffsetDateTime) -> Result<CareSchedule, AppError> {
        Ok(self.calculator.care_schedule(&self.show_plant(id)?, now))
    }

    /// Every plant paired with its schedule, from a single load.
    pub fn care_overview(&self, now: OffsetDateTime) -> Vec<(PlantRecord, CareSchedule)> {
        self.store
            .load()
            .into_iter()
            .map(|record| {
                let schedule = self.calculator.care_schedule(&record, now);
                (record, schedule)
            })
            .collect()
    }

    pub fn calendar(
        &self,
        id: &str,
        year: i32,
        month: Month,
        today: Date,
    ) -> Result<CalendarMonth, AppError> {
        let record = self.show_plant(id)?;
        calendar::month_view(&record, year, month, today).ok_or_else(|| {
            AppError::InvalidArgument(format!("{year}-{} is not a valid month", u8::from(month)))
        })
    }

    pub fn botanical_report(&self, id: &str) -> Result<String, AppError> {
        Ok(self.show_plant(id)?.botanical_report())
    }

    pub fn set_location(&self, id: &str, location: &str) -> Result<PlantRecord, AppError> {
        let location = match location.trim() {
            "" => UNASSIGNED_LOCATION.to_string(),
            trimmed => trimmed.to_string(),
        };
        self.store.update(id, |record| {
            record.location = location;
            Ok::<(), AppError>(())
        })
    }

    /// Merges `patch` into the user's own measures; unset fields keep their value.
    pub fn set_user_measures(
        &self,
        id: &str,
        patch: PlantMeasures,
    ) -> Result<PlantRecord, AppError> {
        if patch.is_empty() {
            return Err(AppError::InvalidArgument(
                "provide at least one measure".to_string(),
            ));
        }
        let invalid = [
            patch.height_cm,
            patch.max_stem_length_cm,
            patch.pot_diameter_cm,
            patch.pot_height_cm,
            patch.max_species_height_cm,
        ]
        .into_iter()
        .flatten()
        .any(|value| !value.is_finite() || value <= 0.0);
        if invalid {
            return Err(AppError::InvalidArgument(
                "measures must be positive numbers".to_string(),
            ));
        }
        self.store.update(id, |record| {
            let current = record.user_measures.take().unwrap_or_default();
            record.user_measures = Some(PlantMeasures {
                height_cm: patch.height_cm.or(current.height_cm),
                max_stem_length_cm: patch.max_stem_length_cm.or(current.max_stem_length_cm),
                pot_diameter_cm: patch.pot_diameter_cm.or(current.pot_diameter_cm),
                pot_height_cm: patch.pot_height_cm.or(current.pot_height_cm),
                max_species_height_cm: patch
                    .max_species_height_cm
                    .or(current.max_species_height_cm),
            });
            Ok::<(), AppError>(())
        })
    }

    pub fn remove_plant(&self, id: &str) -> Result<(), AppError> {
        if !self.store.delete(id)? {
            return Err(AppError::NotFound(id.to_string()));
        }
        info!(plant = %id, "removed plant");
        Ok(())
    }

    pub fn purge(&self) -> Result<(), AppError> {
        self.store.clear()?;
        info!("purged all plant data");
        Ok(())
    }
}

fn event_time(at: Option<OffsetDateTime>) -> String {
    format_rfc3339(at.unwrap_or_else(now_utc))
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Config(ConfigError),
    Store(StoreError),
    History(HistoryError),
    Analysis(AnalysisError),
    Codec(CodecError),
    InvalidArgument(String),
    NotFound(String),
}

impl AppError {
    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Store(StoreError::StorageQuotaExceeded) => self.to_string(),
            AppError::Analysis(err) if err.is_unavailable() => {
                format!("analysis unavailable, try again later ({})", err)
            }
            AppError::Analysis(AnalysisError::Cancelled) => "analysis cancelled".to_string(),
            AppError::Store(StoreError::Backend(_)) | AppError::Io(_) => {
                format!("something went wrong: {}", self)
            }
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::History(err) => write!(f, "{}", err),
            AppError::Analysis(err) => write!(f, "{}", err),
            AppError::Codec(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound(id) => write!(f, "plant '{}' not found", id),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::History(err) => Some(err),
            AppError::Analysis(err) => Some(err),
            AppError::Codec(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => AppError::NotFound(id),
            other => AppError::Store(other),
        }
    }
}

impl From<SlotError> for AppError {
    fn from(value: SlotError) -> Self {
        AppError::from(StoreError::from(value))
    }
}

impl From<HistoryError> for AppError {
    fn from(value: HistoryError) -> Self {
        AppError::History(value)
    }
}

impl From<AnalysisError> for AppError {
    fn from(value: AnalysisError) -> Self {
        AppError::Analysis(value)
    }
}

impl From<CodecError> for AppError {
    fn from(value: CodecError) -> Self {
        AppError::Codec(value)
    }
}

#[cfg(test)]
mod tests;
