//! Points model trait and the learned model built from the three artifacts.
//!
//! A `LearnedModel` always holds a regressor, encoder and scaler fitted
//! together; none of them is ever replaced on its own.

use crate::estimation::activity::{Category, PredictionSource};
use crate::estimation::features::{CategoryEncoder, StandardScaler, build_features};
use crate::estimation::forest::RandomForest;
use crate::estimation::synthetic::round_to;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("category not seen during training: {0}")]
    UnknownCategory(String),
    #[error("carbon emission is not a finite number")]
    NonFiniteEmission,
    #[error("model produced a non-finite prediction")]
    NonFinitePrediction,
}

/// Trait for eco-points models.
pub trait PointsModel: Send + Sync + fmt::Debug {
    fn predict_points(
        &self,
        activity_label: &str,
        category: &str,
        carbon_kg: f64,
    ) -> Result<f64, PredictionError>;

    fn source(&self) -> PredictionSource;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearnedModel {
    regressor: RandomForest,
    encoder: CategoryEncoder,
    scaler: StandardScaler,
    generation: u64,
}

impl LearnedModel {
    pub fn new(
        regressor: RandomForest,
        encoder: CategoryEncoder,
        scaler: StandardScaler,
        generation: u64,
    ) -> Self {
        Self {
            regressor,
            encoder,
            scaler,
            generation,
        }
    }

    pub fn regressor(&self) -> &RandomForest {
        &self.regressor
    }

    pub fn encoder(&self) -> &CategoryEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Identifier shared by the three artifacts of one training run.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl PointsModel for LearnedModel {
    fn predict_points(
        &self,
        activity_label: &str,
        category: &str,
        carbon_kg: f64,
    ) -> Result<f64, PredictionError> {
        if !carbon_kg.is_finite() {
            return Err(PredictionError::NonFiniteEmission);
        }
        let canonical = Category::parse(category)
            .ok_or_else(|| PredictionError::UnknownCategory(category.to_string()))?;
        let index = self
            .encoder
            .encode(canonical.name())
            .ok_or_else(|| PredictionError::UnknownCategory(category.to_string()))?;

        let features = build_features(activity_label, index, carbon_kg);
        let prediction = self.regressor.predict(&self.scaler.transform(&features));
        if !prediction.is_finite() {
            return Err(PredictionError::NonFinitePrediction);
        }
        Ok(round_to(prediction.max(0.0), 1))
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::features::FeatureVector;
    use crate::estimation::forest::ForestParams;

    fn small_model() -> Result<LearnedModel, &'static str> {
        let encoder = CategoryEncoder::fit(["Food", "Transportation"]);
        let rows: Vec<FeatureVector> = vec![
            [1.0, 0.0, 10.0, 0.0],
            [20.0, 0.0, 10.0, 0.0],
            [1.0, 1.0, 7.0, 1.0],
            [20.0, 1.0, 7.0, 0.0],
        ];
        let targets = vec![108.0, 70.0, 110.0, 72.0];
        let scaler = StandardScaler::fit(&rows).ok_or("scaler")?;
        let regressor = RandomForest::fit(
            &scaler.transform_all(&rows),
            &targets,
            ForestParams {
                n_trees: 10,
                ..ForestParams::default()
            },
        )
        .ok_or("forest")?;
        Ok(LearnedModel::new(regressor, encoder, scaler, 1))
    }

    #[test]
    fn unseen_category_is_reported_not_panicking() -> Result<(), &'static str> {
        let model = small_model()?;
        assert_eq!(
            model.predict_points("Shopping spree", "Shopping", 3.0),
            Err(PredictionError::UnknownCategory("Shopping".to_string()))
        );
        assert_eq!(
            model.predict_points("anything", "Space travel", 3.0),
            Err(PredictionError::UnknownCategory("Space travel".to_string()))
        );
        Ok(())
    }

    #[test]
    fn non_finite_emission_is_rejected() -> Result<(), &'static str> {
        let model = small_model()?;
        assert_eq!(
            model.predict_points("Cycling", "Transportation", f64::NAN),
            Err(PredictionError::NonFiniteEmission)
        );
        Ok(())
    }

    #[test]
    fn predictions_are_rounded_and_non_negative() -> Result<(), &'static str> {
        let model = small_model()?;
        let points = model
            .predict_points("Cycling", "transportation", 2.0)
            .map_err(|_| "prediction failed")?;

        assert!(points >= 0.0);
        assert_eq!(points, round_to(points, 1));
        assert_eq!(model.source(), PredictionSource::Model);
        Ok(())
    }
}
