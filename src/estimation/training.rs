use crate::estimation::artifacts::ArtifactError;
use crate::estimation::features::{CategoryEncoder, FeatureVector, StandardScaler, build_features};
use crate::estimation::forest::{DEFAULT_TREE_COUNT, ForestParams, RandomForest};
use crate::estimation::model::LearnedModel;
use crate::estimation::synthetic::{TrainingSample, generate_training_data};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_TRAINING_SAMPLES: usize = 500;
pub const MIN_TRAINING_SAMPLES: usize = 10;
pub const MAX_TRAINING_SAMPLES: usize = 20_000;
/// Held-out share is one fifth, rounded up.
pub const TEST_DIVISOR: usize = 5;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("at least {minimum} samples are required, got {requested}")]
    NotEnoughSamples { requested: usize, minimum: usize },
    #[error("degenerate training data: {0}")]
    Degenerate(String),
    #[error("failed to persist model artifacts: {0}")]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingParams {
    pub n_trees: usize,
    pub seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_TREE_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

/// Held-out evaluation of a freshly trained model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingMetrics {
    pub mse: f64,
    pub r2: f64,
    pub train_samples: usize,
    pub test_samples: usize,
}

/// Synthesizes `n_samples` activities and fits the full artifact triple.
pub fn fit_learned_model(
    n_samples: usize,
    params: &TrainingParams,
    generation: u64,
) -> Result<(LearnedModel, TrainingMetrics), TrainingError> {
    if n_samples < MIN_TRAINING_SAMPLES {
        return Err(TrainingError::NotEnoughSamples {
            requested: n_samples,
            minimum: MIN_TRAINING_SAMPLES,
        });
    }

    let samples = generate_training_data(n_samples, params.seed)
        .map_err(|err| TrainingError::Degenerate(format!("emission distribution: {err}")))?;
    let encoder = CategoryEncoder::fit(samples.iter().map(|s| s.category.name()));
    let (rows, targets) = encode_samples(&samples, &encoder)?;

    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(params.seed));
    let test_count = samples.len().div_ceil(TEST_DIVISOR);
    let (test_order, train_order) = order.split_at(test_count);

    let train_rows: Vec<FeatureVector> = train_order.iter().map(|&i| rows[i]).collect();
    let train_targets: Vec<f64> = train_order.iter().map(|&i| targets[i]).collect();
    let test_rows: Vec<FeatureVector> = test_order.iter().map(|&i| rows[i]).collect();
    let test_targets: Vec<f64> = test_order.iter().map(|&i| targets[i]).collect();

    let scaler = StandardScaler::fit(&train_rows)
        .ok_or_else(|| TrainingError::Degenerate("empty training split".to_string()))?;
    let regressor = RandomForest::fit(
        &scaler.transform_all(&train_rows),
        &train_targets,
        ForestParams {
            n_trees: params.n_trees,
            seed: params.seed,
            ..ForestParams::default()
        },
    )
    .ok_or_else(|| TrainingError::Degenerate("regressor could not be fitted".to_string()))?;

    let predictions: Vec<f64> = scaler
        .transform_all(&test_rows)
        .iter()
        .map(|row| regressor.predict(row))
        .collect();
    let mse = mean_squared_error(&test_targets, &predictions);
    let r2 = r2_score(&test_targets, &predictions)
        .ok_or_else(|| TrainingError::Degenerate("held-out targets have no variance".to_string()))?;

    let metrics = TrainingMetrics {
        mse,
        r2,
        train_samples: train_rows.len(),
        test_samples: test_rows.len(),
    };
    Ok((LearnedModel::new(regressor, encoder, scaler, generation), metrics))
}

fn encode_samples(
    samples: &[TrainingSample],
    encoder: &CategoryEncoder,
) -> Result<(Vec<FeatureVector>, Vec<f64>), TrainingError> {
    let mut rows = Vec::with_capacity(samples.len());
    let mut targets = Vec::with_capacity(samples.len());
    for sample in samples {
        let index = encoder.encode(sample.category.name()).ok_or_else(|| {
            TrainingError::Degenerate(format!("category {} missing from encoder", sample.category))
        })?;
        rows.push(build_features(&sample.activity_label, index, sample.carbon_kg));
        targets.push(sample.eco_points);
    }
    Ok((rows, targets))
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Coefficient of determination, `None` when `actual` has no variance.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() {
        return None;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if total <= f64::EPSILON {
        return None;
    }
    let residual: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Some(1.0 - residual / total)
}
