use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[serde(alias = "óptimo", alias = "optimo")]
    Optimal,
    #[serde(alias = "alerta")]
    Alert,
    #[serde(alias = "crítico", alias = "critico")]
    Critical,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Optimal => "optimal",
            HealthStatus::Alert => "alert",
            HealthStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[serde(alias = "bajo")]
    Low,
    #[serde(alias = "medio")]
    Medium,
    #[serde(alias = "alto")]
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeafAnalysis {
    #[serde(alias = "coloracion")]
    pub coloration: String,
    #[serde(alias = "forma")]
    pub shape: String,
    #[serde(alias = "problemas_detectados")]
    pub detected_problems: String,
    #[serde(alias = "turgencia")]
    pub turgor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantHealth {
    #[serde(alias = "estado")]
    pub status: HealthStatus,
    #[serde(default, alias = "observaciones")]
    pub observations: String,
    /// Percentage 0..=100, or a fraction in (0, 1] when the analysis reported one.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "vigor_index"
    )]
    pub vigor_index: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "estado_raices"
    )]
    pub root_health_index: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "hidrometria"
    )]
    pub substrate_moisture: Option<u8>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "analisis_foliar_detallado"
    )]
    pub detailed_leaf_analysis: Option<LeafAnalysis>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "riesgo_plagas"
    )]
    pub pest_risk: Option<RiskLevel>,
}

impl PlantHealth {
    pub fn vigor_percent(&self) -> u8 {
        normalize_percentage(self.vigor_index.unwrap_or(0.0))
    }

    pub fn root_health_percent(&self) -> u8 {
        normalize_percentage(self.root_health_index.unwrap_or(0.0))
    }

    pub fn vigor_band(&self) -> VigorBand {
        VigorBand::for_percent(self.vigor_percent())
    }
}

/// Reads a stored index as a whole percentage. Values in (0, 1] are fractions
/// and get rescaled; zero stays zero.
pub fn normalize_percentage(raw: f64) -> u8 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    let percent = if raw <= 1.0 { raw * 100.0 } else { raw };
    percent.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VigorBand {
    Healthy,
    Watch,
    Weak,
}

impl VigorBand {
    pub fn for_percent(percent: u8) -> Self {
        if percent > 80 {
            VigorBand::Healthy
        } else if percent > 50 {
            VigorBand::Watch
        } else {
            VigorBand::Weak
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VigorBand::Healthy => "healthy",
            VigorBand::Watch => "watch",
            VigorBand::Weak => "weak",
        }
    }
}
