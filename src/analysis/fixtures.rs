use super::{parse_analysis_payload, AnalysisResult};

pub const SAMPLE_PAYLOAD: &str = include_str!("../../tests/fixtures/analysis.json");

pub fn sample_analysis() -> AnalysisResult {
    parse_analysis_payload(SAMPLE_PAYLOAD).expect("fixture payload should be valid")
}
