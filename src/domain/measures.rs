use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlantMeasures {
    #[serde(skip_serializing_if = "Option::is_none", alias = "altura_cm")]
    pub height_cm: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "longitud_max_tallo_cm"
    )]
    pub max_stem_length_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "maceta_diametro_cm")]
    pub pot_diameter_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "maceta_altura_cm")]
    pub pot_height_cm: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "altura_max_especie_cm"
    )]
    pub max_species_height_cm: Option<f64>,
}

impl PlantMeasures {
    /// Field-by-field overlay: a user value wins only when it is a positive number.
    pub fn overlay_on(&self, base: &PlantMeasures) -> PlantMeasures {
        PlantMeasures {
            height_cm: pick(self.height_cm, base.height_cm),
            max_stem_length_cm: pick(self.max_stem_length_cm, base.max_stem_length_cm),
            pot_diameter_cm: pick(self.pot_diameter_cm, base.pot_diameter_cm),
            pot_height_cm: pick(self.pot_height_cm, base.pot_height_cm),
            max_species_height_cm: pick(self.max_species_height_cm, base.max_species_height_cm),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.height_cm.is_none()
            && self.max_stem_length_cm.is_none()
            && self.pot_diameter_cm.is_none()
            && self.pot_height_cm.is_none()
            && self.max_species_height_cm.is_none()
    }
}

fn pick(user: Option<f64>, suggested: Option<f64>) -> Option<f64> {
    match user {
        Some(value) if value.is_finite() && value > 0.0 => Some(value),
        _ => suggested,
    }
}

pub fn effective_measures(
    suggested: &PlantMeasures,
    user: Option<&PlantMeasures>,
) -> PlantMeasures {
    match user {
        Some(user) => user.overlay_on(suggested),
        None => suggested.clone(),
    }
}
