//! Deterministic eco-points formula used whenever the learned model is unavailable.
//!
//! Formula: `max(0, 100 - 2 * carbon_kg + 10 * multiplier + sustainable_bonus)`

use crate::estimation::activity::{PredictionSource, category_multiplier, has_sustainable_keyword};
use crate::estimation::model::{PointsModel, PredictionError};

pub const BASE_POINTS: f64 = 100.0;
pub const EMISSION_PENALTY_PER_KG: f64 = 2.0;
pub const CATEGORY_BONUS_SCALE: f64 = 10.0;
pub const SUSTAINABLE_BONUS: f64 = 10.0;

pub fn fallback_points(activity_label: &str, category: &str, carbon_kg: f64) -> f64 {
    let sustainable_bonus = if has_sustainable_keyword(activity_label) {
        SUSTAINABLE_BONUS
    } else {
        0.0
    };
    let points = BASE_POINTS - carbon_kg * EMISSION_PENALTY_PER_KG
        + category_multiplier(category) * CATEGORY_BONUS_SCALE
        + sustainable_bonus;
    points.max(0.0)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackModel;

impl PointsModel for FallbackModel {
    fn predict_points(
        &self,
        activity_label: &str,
        category: &str,
        carbon_kg: f64,
    ) -> Result<f64, PredictionError> {
        Ok(fallback_points(activity_label, category, carbon_kg))
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Fallback
    }
}
