use serde::{Deserialize, Serialize};

use crate::domain::{entities::plans::PlanEntity, value_objects::html_sanitizer::clean_text_field};

/// Public shape of an active plan (`GET /api/plans`, plans page).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanDto {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub speed: String,
    pub features: Vec<String>,
    pub recommended: bool,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        let features = parse_features(&value.features);
        Self {
            id: value.id,
            name: value.name,
            price: value.price,
            speed: value.speed,
            features,
            recommended: value.is_recommended,
        }
    }
}

/// Admin form payload for creating or editing a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanFormModel {
    pub name: String,
    pub price: String,
    pub speed: String,
    pub features: String,
    pub recommended: bool,
    pub display_order: Option<i32>,
}

/// Splits the newline-delimited feature column into cleaned, non-empty entries.
pub fn parse_features(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(|feature| clean_text_field(feature.trim()))
        .filter(|feature| !feature.is_empty())
        .collect()
}
