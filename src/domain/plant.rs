use serde::{Deserialize, Serialize};

use super::fertilizer::FertilizerKind;
use super::health::{PlantHealth, RiskLevel};
use super::measures::{effective_measures, PlantMeasures};
use crate::analysis::AnalysisResult;

pub const UNASSIGNED_LOCATION: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantRecord {
    pub id: String,
    #[serde(default, alias = "ubicacion")]
    pub location: String,
    #[serde(alias = "identificacion")]
    pub identification: Identification,
    #[serde(alias = "salud")]
    pub health: PlantHealth,
    #[serde(default, alias = "medidas_sugeridas")]
    pub suggested_measures: PlantMeasures,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "medidas_usuario"
    )]
    pub user_measures: Option<PlantMeasures>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "estudio_trasplante"
    )]
    pub transplant_study: Option<TransplantStudy>,
    #[serde(default, alias = "cuidados")]
    pub care: CareGuide,
    #[serde(default, alias = "ficha_botanica")]
    pub botanical_profile: BotanicalProfile,
    #[serde(default)]
    pub images: Vec<DatedImage>,
    #[serde(default, alias = "historial_riego")]
    pub watering_history: Vec<String>,
    #[serde(default, alias = "historial_abono")]
    pub fertilizing_history: Vec<FertilizingEntry>,
    #[serde(default, alias = "historial_hidrometria")]
    pub moisture_history: Vec<MoistureEntry>,
    #[serde(alias = "fecha_creacion")]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    #[serde(alias = "cientifico")]
    pub scientific_name: String,
    #[serde(default, alias = "comun")]
    pub common_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransplantNeed {
    #[serde(alias = "inmediata")]
    Immediate,
    #[serde(alias = "recomendada")]
    Recommended,
    #[serde(alias = "preparar")]
    Prepare,
    #[serde(alias = "no_necesario")]
    NotNeeded,
}

impl TransplantNeed {
    pub fn as_str(self) -> &'static str {
        match self {
            TransplantNeed::Immediate => "immediate",
            TransplantNeed::Recommended => "recommended",
            TransplantNeed::Prepare => "prepare",
            TransplantNeed::NotNeeded => "not_needed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransplantStudy {
    #[serde(alias = "necesidad")]
    pub need: TransplantNeed,
    #[serde(alias = "maceta_objetivo_cm")]
    pub target_pot_cm: f64,
    #[serde(default, alias = "proxima_fecha_estimada")]
    pub estimated_next_date: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "riesgo_trauma"
    )]
    pub trauma_risk: Option<RiskLevel>,
    #[serde(default, alias = "analisis_relacion")]
    pub pot_ratio_analysis: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CareGuide {
    #[serde(skip_serializing_if = "Option::is_none", alias = "agua_ml")]
    pub water_ml: Option<f64>,
    /// Watering interval; analysis-derived and never edited directly.
    #[serde(skip_serializing_if = "Option::is_none", alias = "frecuencia_dias")]
    pub frequency_days: Option<u32>,
    #[serde(alias = "luz_optima")]
    pub optimal_light: String,
    #[serde(skip_serializing_if = "Option::is_none", alias = "temp_min")]
    pub temp_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "temp_max")]
    pub temp_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "temp_optima")]
    pub temp_optimal: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "balance_hidrico_status"
    )]
    pub water_balance_status: Option<String>,
    #[serde(alias = "forma_riego")]
    pub watering_technique: String,
    #[serde(alias = "cantidad_agua_info")]
    pub water_amount_info: String,
    #[serde(alias = "recomendacion_aspersion")]
    pub misting_advice: String,
    #[serde(alias = "periodicidad_estacional")]
    pub seasonal_guidance: SeasonalGuidance,
    #[serde(alias = "mantenimiento_especifico")]
    pub maintenance_tips: MaintenanceTips,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeasonalGuidance {
    #[serde(alias = "primavera")]
    pub spring: String,
    #[serde(alias = "verano")]
    pub summer: String,
    #[serde(alias = "otono")]
    pub autumn: String,
    #[serde(alias = "invierno")]
    pub winter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaintenanceTips {
    #[serde(alias = "poda")]
    pub pruning: String,
    #[serde(alias = "limpieza_hojas")]
    pub leaf_cleaning: String,
    #[serde(alias = "retirada_hojas_secas")]
    pub dead_leaf_removal: String,
    #[serde(alias = "otros_consejos")]
    pub other_advice: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotanicalProfile {
    #[serde(alias = "origen_geografico")]
    pub geographic_origin: String,
    #[serde(alias = "tipo_hojas")]
    pub leaf_type: String,
    #[serde(alias = "tipo_raices")]
    pub root_type: String,
    #[serde(alias = "particularidades")]
    pub particularities: String,
    #[serde(alias = "curiosidades")]
    pub curiosities: String,
    #[serde(alias = "longevidad_estimada")]
    pub estimated_longevity: String,
    #[serde(alias = "explicacion_botanica_extensa")]
    pub extended_explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedImage {
    pub url: String,
    #[serde(alias = "fecha")]
    pub captured_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FertilizingEntry {
    #[serde(alias = "fecha")]
    pub timestamp: String,
    #[serde(default, alias = "tipo")]
    pub kind: FertilizerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoistureEntry {
    #[serde(alias = "fecha")]
    pub timestamp: String,
    #[serde(alias = "valor")]
    pub value: u8,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "img")]
    pub source_image: Option<String>,
}

/// Everything needed to materialize a record at the end of a confirmed analysis.
#[derive(Debug, Clone)]
pub struct NewPlant {
    pub id: String,
    pub location: String,
    pub analysis: AnalysisResult,
    pub images: Vec<String>,
    pub user_measures: Option<PlantMeasures>,
    pub created_at: String,
}

impl PlantRecord {
    pub fn from_analysis(input: NewPlant) -> Self {
        let location = match input.location.trim() {
            "" => UNASSIGNED_LOCATION.to_string(),
            trimmed => trimmed.to_string(),
        };
        let images = input
            .images
            .into_iter()
            .map(|url| DatedImage {
                url,
                captured_at: input.created_at.clone(),
            })
            .collect();
        let analysis = input.analysis;

        Self {
            id: input.id,
            location,
            identification: analysis.identification,
            health: analysis.health,
            suggested_measures: analysis.suggested_measures,
            user_measures: input.user_measures.filter(|measures| !measures.is_empty()),
            transplant_study: Some(analysis.transplant_study),
            care: analysis.care,
            botanical_profile: analysis.botanical_profile,
            images,
            watering_history: Vec::new(),
            fertilizing_history: Vec::new(),
            moisture_history: Vec::new(),
            created_at: input.created_at,
        }
    }

    pub fn display_measures(&self) -> PlantMeasures {
        effective_measures(&self.suggested_measures, self.user_measures.as_ref())
    }

    pub fn display_name(&self) -> &str {
        if self.identification.common_name.trim().is_empty() {
            &self.identification.scientific_name
        } else {
            &self.identification.common_name
        }
    }

    pub fn botanical_report(&self) -> String {
        let profile = &self.botanical_profile;
        format!(
            "BOTANICAL PROFILE: {}\n\nOrigin: {}\nLongevity: {}\n\nREPORT:\n{}\n\nCURIOSITIES:\n{}",
            self.identification.scientific_name,
            profile.geographic_origin,
            profile.estimated_longevity,
            profile.extended_explanation,
            profile.curiosities
        )
    }
}
