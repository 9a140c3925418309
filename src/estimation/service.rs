//! Shared eco-points estimator.
//!
//! Lifecycle: construct, `load_if_present`, optionally `train`, then any number
//! of concurrent `predict_points` calls. The fitted triple lives behind a
//! single `Arc` so readers always see one complete training run.

use crate::estimation::activity::{ActivityInput, EcoPointsEstimate, PredictionSource};
use crate::estimation::artifacts::{ArtifactPaths, load_artifacts, save_artifacts};
use crate::estimation::emissions;
use crate::estimation::fallback::FallbackModel;
use crate::estimation::model::{LearnedModel, PointsModel};
use crate::estimation::training::{
    DEFAULT_TRAINING_SAMPLES, MAX_TRAINING_SAMPLES, TrainingError, TrainingMetrics, TrainingParams, fit_learned_model,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    pub artifacts: ArtifactPaths,
    pub training: TrainingParams,
    pub default_samples: usize,
    /// Largest sample count a training request may ask for.
    pub max_samples: usize,
}

impl EstimatorConfig {
    pub fn new(artifacts: ArtifactPaths) -> Self {
        Self {
            artifacts,
            training: TrainingParams::default(),
            default_samples: DEFAULT_TRAINING_SAMPLES,
            max_samples: MAX_TRAINING_SAMPLES,
        }
    }
}

#[derive(Debug)]
pub struct EcoEstimator {
    config: EstimatorConfig,
    model: RwLock<Option<Arc<LearnedModel>>>,
    // serializes train/load so artifacts on disk and in memory change together
    training: Mutex<()>,
    load_attempted: AtomicBool,
    fallback: FallbackModel,
}

impl EcoEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            model: RwLock::new(None),
            training: Mutex::new(()),
            load_attempted: AtomicBool::new(false),
            fallback: FallbackModel,
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn estimate_emissions(&self, input: &ActivityInput) -> f64 {
        emissions::estimate_emissions(input)
    }

    pub fn is_trained(&self) -> bool {
        self.current_model().is_some()
    }

    /// Generation of the active model, if any.
    pub fn model_generation(&self) -> Option<u64> {
        self.current_model().map(|model| model.generation())
    }

    pub fn train_default(&self) -> Result<TrainingMetrics, TrainingError> {
        self.train(self.config.default_samples)
    }

    /// Fits a new triple, persists it, then swaps it in.
    pub fn train(&self, n_samples: usize) -> Result<TrainingMetrics, TrainingError> {
        let _training = self
            .training
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let generation = next_generation(self.model_generation());
        info!(n_samples, generation, "Training eco-points model");
        let (model, metrics) = fit_learned_model(n_samples, &self.config.training, generation)?;
        save_artifacts(&self.config.artifacts, &model)?;

        let mut guard = self.model.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(model));
        drop(guard);
        self.load_attempted.store(true, Ordering::Release);

        info!(
            mse = metrics.mse,
            r2 = metrics.r2,
            train_samples = metrics.train_samples,
            test_samples = metrics.test_samples,
            "Eco-points model trained"
        );
        Ok(metrics)
    }

    /// Loads persisted artifacts. Returns whether a complete triple was loaded.
    pub fn load_if_present(&self) -> bool {
        let _training = self
            .training
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.load_attempted.store(true, Ordering::Release);
        self.load_locked()
    }

    // One lazy load attempt at first use; skipped while a training run holds the lock.
    fn ensure_loaded(&self) {
        if self.load_attempted.load(Ordering::Acquire) {
            return;
        }
        let Ok(_training) = self.training.try_lock() else {
            return;
        };
        if self.load_attempted.swap(true, Ordering::AcqRel) || self.is_trained() {
            return;
        }
        self.load_locked();
    }

    fn load_locked(&self) -> bool {
        match load_artifacts(&self.config.artifacts) {
            Ok(Some(model)) => {
                let generation = model.generation();
                let mut guard = self.model.write().unwrap_or_else(PoisonError::into_inner);
                *guard = Some(Arc::new(model));
                info!(generation, "Eco-points model loaded from artifacts");
                true
            }
            Ok(None) => {
                debug!("No persisted eco-points model found");
                false
            }
            Err(err) => {
                warn!(error = %err, "Ignoring unusable model artifacts");
                false
            }
        }
    }

    /// Learned prediction when available, fallback formula otherwise.
    pub fn predict_points(
        &self,
        activity_label: &str,
        category: &str,
        carbon_kg: f64,
    ) -> EcoPointsEstimate {
        self.ensure_loaded();

        if let Some(model) = self.current_model() {
            match model.predict_points(activity_label, category, carbon_kg) {
                Ok(points) => {
                    return EcoPointsEstimate {
                        points,
                        source: PredictionSource::Model,
                    };
                }
                Err(err) => {
                    debug!(error = %err, category, "Learned prediction unavailable, using fallback");
                }
            }
        }

        EcoPointsEstimate {
            points: self
                .fallback
                .predict_points(activity_label, category, carbon_kg)
                .unwrap_or(0.0),
            source: self.fallback.source(),
        }
    }

    fn current_model(&self) -> Option<Arc<LearnedModel>> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn next_generation(current: Option<u64>) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0);
    match current {
        Some(previous) if now <= previous => previous + 1,
        _ => now,
    }
}
