use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FertilizerKind {
    #[default]
    #[serde(alias = "líquido", alias = "liquido")]
    Liquid,
    #[serde(alias = "barritas", alias = "sticks")]
    Stick,
}

impl FertilizerKind {
    pub const ALL: [FertilizerKind; 2] = [FertilizerKind::Liquid, FertilizerKind::Stick];

    pub fn as_str(self) -> &'static str {
        match self {
            FertilizerKind::Liquid => "liquid",
            FertilizerKind::Stick => "stick",
        }
    }
}

impl fmt::Display for FertilizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FertilizerKind {
    type Err = ParseFertilizerKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        let kind = match normalized.as_str() {
            "liquid" | "líquido" | "liquido" => FertilizerKind::Liquid,
            "stick" | "sticks" | "barritas" => FertilizerKind::Stick,
            _ => {
                return Err(ParseFertilizerKindError {
                    value: value.to_string(),
                });
            }
        };

        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFertilizerKindError {
    value: String,
}

impl fmt::Display for ParseFertilizerKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid fertilizer kind '{}': expected one of {}",
            self.value,
            FertilizerKind::ALL
                .iter()
                .map(|kind| kind.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseFertilizerKindError {}
