use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::domain::health::PlantHealth;
use crate::domain::measures::PlantMeasures;
use crate::domain::plant::{BotanicalProfile, CareGuide, Identification, TransplantStudy};
use crate::history::MAX_MOISTURE;

/// Fallback reading when a moisture reply carries no number.
pub const DEFAULT_MOISTURE_READING: u8 = 5;

/// Structured assessment returned by the analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(alias = "identificacion")]
    pub identification: Identification,
    #[serde(alias = "salud")]
    pub health: PlantHealth,
    #[serde(alias = "medidas_sugeridas")]
    pub suggested_measures: PlantMeasures,
    #[serde(alias = "estudio_trasplante")]
    pub transplant_study: TransplantStudy,
    #[serde(alias = "cuidados")]
    pub care: CareGuide,
    #[serde(alias = "ficha_botanica")]
    pub botanical_profile: BotanicalProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    MissingCredential,
    EmptyResponse,
    RequestFailed(String),
    InvalidPayload(String),
    Cancelled,
}

impl AnalysisError {
    /// True for failures the user sees as "analysis unavailable".
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, AnalysisError::Cancelled)
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::MissingCredential => {
                write!(f, "analysis credential is not configured")
            }
            AnalysisError::EmptyResponse => write!(f, "analysis returned no data"),
            AnalysisError::RequestFailed(message) => write!(f, "analysis failed: {}", message),
            AnalysisError::InvalidPayload(message) => {
                write!(f, "analysis result is malformed: {}", message)
            }
            AnalysisError::Cancelled => write!(f, "analysis was cancelled"),
        }
    }
}

impl Error for AnalysisError {}

pub trait Analyzer: Send + Sync {
    fn analyze(
        &self,
        images: &[String],
        current_pot_diameter_cm: Option<f64>,
    ) -> Result<AnalysisResult, AnalysisError>;
}

pub trait MoistureReader: Send + Sync {
    /// Substrate moisture on the 0..=10 scale.
    fn read_moisture(&self, image: &str) -> Result<u8, AnalysisError>;
}

/// Parses and validates raw collaborator output.
pub fn parse_analysis_payload(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    let result: AnalysisResult = serde_json::from_str(trimmed)
        .map_err(|err| AnalysisError::InvalidPayload(err.to_string()))?;
    validate(&result)?;
    Ok(result)
}

const MAX_FREQUENCY_DAYS: u32 = 365;

fn validate(result: &AnalysisResult) -> Result<(), AnalysisError> {
    let invalid = |message: &str| Err(AnalysisError::InvalidPayload(message.to_string()));

    if result.identification.scientific_name.trim().is_empty() {
        return invalid("scientific name is empty");
    }
    if !in_percent_range(result.health.vigor_index) {
        return invalid("vigor index must be within 0..=100");
    }
    if !in_percent_range(result.health.root_health_index) {
        return invalid("root health index must be within 0..=100");
    }
    if result
        .health
        .substrate_moisture
        .is_some_and(|value| value > MAX_MOISTURE)
    {
        return invalid("substrate moisture must be within 0..=10");
    }
    if result
        .care
        .frequency_days
        .is_some_and(|days| !(1..=MAX_FREQUENCY_DAYS).contains(&days))
    {
        return invalid("watering frequency must be within 1..=365 days");
    }
    if result.care.water_ml.is_some_and(|ml| ml < 0.0) {
        return invalid("water amount cannot be negative");
    }
    let measures = &result.suggested_measures;
    let sizes = [
        measures.height_cm,
        measures.max_stem_length_cm,
        measures.pot_diameter_cm,
        measures.pot_height_cm,
        measures.max_species_height_cm,
    ];
    if sizes.iter().flatten().any(|value| *value < 0.0) {
        return invalid("measures cannot be negative");
    }
    if result.transplant_study.target_pot_cm < 0.0 {
        return invalid("target pot size cannot be negative");
    }
    Ok(())
}

fn in_percent_range(value: Option<f64>) -> bool {
    value.map_or(true, |value| (0.0..=100.0).contains(&value))
}

/// Reads the first integer in a free-text reply, clamped to 0..=10.
pub fn parse_moisture_reply(raw: &str) -> u8 {
    let digits = raw
        .trim()
        .chars()
        .skip_while(|ch| !ch.is_ascii_digit())
        .take_while(|ch| ch.is_ascii_digit())
        .collect::<String>();
    match digits.parse::<u32>() {
        Ok(value) => value.min(u32::from(MAX_MOISTURE)) as u8,
        Err(_) => DEFAULT_MOISTURE_READING,
    }
}

/// Cooperative cancellation flag shared between a session and its tasks.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// An analysis running on a worker thread, bound to a cancellation token.
pub struct AnalysisTask {
    handle: JoinHandle<Result<AnalysisResult, AnalysisError>>,
    token: CancellationToken,
}

impl AnalysisTask {
    pub fn spawn(
        analyzer: Arc<dyn Analyzer>,
        images: Vec<String>,
        current_pot_diameter_cm: Option<f64>,
        token: CancellationToken,
    ) -> Self {
        let worker_token = token.clone();
        let handle = thread::spawn(move || {
            if worker_token.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            analyzer.analyze(&images, current_pot_diameter_cm)
        });
        Self { handle, token }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker. A cancelled session never receives the result.
    pub fn join(self) -> Result<AnalysisResult, AnalysisError> {
        let outcome = self.handle.join().unwrap_or_else(|_| {
            Err(AnalysisError::RequestFailed(
                "analysis worker panicked".to_string(),
            ))
        });
        if self.token.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        outcome
    }
}

/// Collaborator that replays a saved analysis from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileAnalyzer {
    path: PathBuf,
}

impl JsonFileAnalyzer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Analyzer for JsonFileAnalyzer {
    fn analyze(
        &self,
        images: &[String],
        _current_pot_diameter_cm: Option<f64>,
    ) -> Result<AnalysisResult, AnalysisError> {
        if images.is_empty() {
            return Err(AnalysisError::RequestFailed(
                "at least one image is required".to_string(),
            ));
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            AnalysisError::RequestFailed(format!("{}: {}", self.path.display(), err))
        })?;
        parse_analysis_payload(&raw)
    }
}

/// Moisture collaborator whose free-text reply was saved to a file.
#[derive(Debug, Clone)]
pub struct ReplyFileMoistureReader {
    path: PathBuf,
}

impl ReplyFileMoistureReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MoistureReader for ReplyFileMoistureReader {
    fn read_moisture(&self, _image: &str) -> Result<u8, AnalysisError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            AnalysisError::RequestFailed(format!("{}: {}", self.path.display(), err))
        })?;
        if raw.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        Ok(parse_moisture_reply(&raw))
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod tests;
