use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use super::fixtures::{sample_analysis, SAMPLE_PAYLOAD};
use super::{
    parse_analysis_payload, parse_moisture_reply, AnalysisError, AnalysisResult, AnalysisTask,
    Analyzer, CancellationToken, JsonFileAnalyzer, MoistureReader, ReplyFileMoistureReader,
};
use crate::domain::health::HealthStatus;
use crate::domain::plant::TransplantNeed;

#[test]
fn parses_the_sample_payload() {
    let result = sample_analysis();
    assert_eq!(result.identification.scientific_name, "Ficus lyrata");
    assert_eq!(result.health.status, HealthStatus::Alert);
    assert_eq!(result.health.vigor_percent(), 72);
    assert_eq!(result.care.frequency_days, Some(9));
    assert_eq!(result.transplant_study.need, TransplantNeed::Recommended);
    assert_eq!(result.suggested_measures.pot_diameter_cm, Some(24.0));
}

#[test]
fn empty_text_is_an_empty_response() {
    assert_eq!(
        parse_analysis_payload("  \n"),
        Err(AnalysisError::EmptyResponse)
    );
}

#[test]
fn shape_mismatches_are_invalid_payloads() {
    let err = parse_analysis_payload(r#"{"identification": {}}"#).expect_err("incomplete");
    assert!(matches!(err, AnalysisError::InvalidPayload(_)));

    let err = parse_analysis_payload(&SAMPLE_PAYLOAD.replace("\"alert\"", "\"sleepy\""))
        .expect_err("unknown health status");
    assert!(matches!(err, AnalysisError::InvalidPayload(_)));
}

#[test]
fn out_of_range_numbers_are_rejected_at_the_boundary() {
    let cases = [
        ("\"substrateMoisture\": 3", "\"substrateMoisture\": 12"),
        ("\"frequencyDays\": 9", "\"frequencyDays\": 0"),
        ("\"frequencyDays\": 9", "\"frequencyDays\": 4000000000"),
        ("\"frequencyDays\": 9", "\"frequencyDays\": 366"),
        ("\"rootHealthIndex\": 65", "\"rootHealthIndex\": 140"),
        ("\"potDiameterCm\": 24", "\"potDiameterCm\": -4"),
        ("\"scientificName\": \"Ficus lyrata\"", "\"scientificName\": \" \""),
    ];
    for (from, to) in cases {
        let payload = SAMPLE_PAYLOAD.replace(from, to);
        assert_ne!(payload, SAMPLE_PAYLOAD, "fixture should contain {from}");
        let err = parse_analysis_payload(&payload).expect_err("payload should be rejected");
        assert!(matches!(err, AnalysisError::InvalidPayload(_)), "{to}");
    }
}

#[test]
fn a_year_is_the_longest_accepted_watering_frequency() {
    let payload = SAMPLE_PAYLOAD.replace("\"frequencyDays\": 9", "\"frequencyDays\": 365");
    let result = parse_analysis_payload(&payload).expect("a yearly schedule is valid");
    assert_eq!(result.care.frequency_days, Some(365));
}

#[test]
fn unavailable_classification_excludes_cancellation() {
    assert!(AnalysisError::MissingCredential.is_unavailable());
    assert!(AnalysisError::EmptyResponse.is_unavailable());
    assert!(AnalysisError::RequestFailed("timeout".to_string()).is_unavailable());
    assert!(!AnalysisError::Cancelled.is_unavailable());
}

#[test]
fn moisture_replies_are_clamped_with_default() {
    assert_eq!(parse_moisture_reply("7"), 7);
    assert_eq!(parse_moisture_reply(" Moisture: 4/10 "), 4);
    assert_eq!(parse_moisture_reply("15"), 10);
    assert_eq!(parse_moisture_reply("unknown"), 5);
}

#[test]
fn json_file_analyzer_reads_saved_results() {
    let path = std::env::temp_dir().join(format!("botanica-analysis-{}.json", Uuid::now_v7()));
    std::fs::write(&path, SAMPLE_PAYLOAD).expect("fixture should be writable");
    let analyzer = JsonFileAnalyzer::new(&path);

    let result = analyzer
        .analyze(&["data:image/jpeg;base64,AA".to_string()], None)
        .expect("analysis should succeed");
    assert_eq!(result, sample_analysis());

    let err = analyzer.analyze(&[], None).expect_err("images are required");
    assert!(matches!(err, AnalysisError::RequestFailed(_)));
    let _ = std::fs::remove_file(path);
}

#[test]
fn json_file_analyzer_reports_missing_file_as_request_failure() {
    let analyzer = JsonFileAnalyzer::new("/nonexistent/botanica/analysis.json");
    let err = analyzer
        .analyze(&["img".to_string()], None)
        .expect_err("missing file");
    assert!(err.is_unavailable());
}

#[test]
fn reply_file_reader_parses_first_number() {
    let path = std::env::temp_dir().join(format!("botanica-reply-{}.txt", Uuid::now_v7()));
    std::fs::write(&path, "Substrate looks dry, I'd say 3 out of 10.\n").expect("writable");
    let reader = ReplyFileMoistureReader::new(&path);
    assert_eq!(reader.read_moisture("img"), Ok(3));

    std::fs::write(&path, "   ").expect("writable");
    assert_eq!(
        reader.read_moisture("img"),
        Err(AnalysisError::EmptyResponse)
    );
    let _ = std::fs::remove_file(path);
}

struct GatedAnalyzer {
    gate: Mutex<mpsc::Receiver<()>>,
    seen_pot: Mutex<Option<f64>>,
}

impl Analyzer for GatedAnalyzer {
    fn analyze(
        &self,
        _images: &[String],
        current_pot_diameter_cm: Option<f64>,
    ) -> Result<AnalysisResult, AnalysisError> {
        *self.seen_pot.lock().expect("lock") = current_pot_diameter_cm;
        self.gate
            .lock()
            .expect("lock")
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| AnalysisError::RequestFailed("gate closed".to_string()))?;
        Ok(sample_analysis())
    }
}

fn gated() -> (Arc<GatedAnalyzer>, mpsc::Sender<()>) {
    let (tx, rx) = mpsc::channel();
    let analyzer = Arc::new(GatedAnalyzer {
        gate: Mutex::new(rx),
        seen_pot: Mutex::new(None),
    });
    (analyzer, tx)
}

#[test]
fn task_delivers_result_when_not_cancelled() {
    let (analyzer, gate) = gated();
    let task = AnalysisTask::spawn(
        analyzer.clone(),
        vec!["img".to_string()],
        Some(18.0),
        CancellationToken::new(),
    );
    gate.send(()).expect("gate should open");
    let result = task.join().expect("analysis should finish");
    assert_eq!(result.identification.common_name, "Fiddle-leaf fig");
    assert_eq!(*analyzer.seen_pot.lock().expect("lock"), Some(18.0));
}

#[test]
fn cancelled_task_discards_in_flight_result() {
    let (analyzer, gate) = gated();
    let token = CancellationToken::new();
    let task = AnalysisTask::spawn(analyzer, vec!["img".to_string()], None, token.clone());
    token.cancel();
    gate.send(()).expect("gate should open");
    assert_eq!(task.join(), Err(AnalysisError::Cancelled));
}

#[test]
fn task_cancelled_before_start_skips_the_collaborator() {
    let (analyzer, _gate) = gated();
    let token = CancellationToken::new();
    token.cancel();
    let task = AnalysisTask::spawn(analyzer.clone(), vec!["img".to_string()], Some(1.0), token);
    assert_eq!(task.join(), Err(AnalysisError::Cancelled));
    assert!(analyzer.seen_pot.lock().expect("lock").is_none());
}
