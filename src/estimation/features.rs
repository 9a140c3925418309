//! Feature engineering for the learned eco-points model.
//!
//! Feature layout: `[carbon_kg, category_index, label_length, has_sustainable]`.

use crate::estimation::activity::has_sustainable_keyword;
use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 4;

pub type FeatureVector = [f64; FEATURE_COUNT];

pub fn build_features(activity_label: &str, category_index: usize, carbon_kg: f64) -> FeatureVector {
    [
        carbon_kg,
        category_index as f64,
        activity_label.chars().count() as f64,
        if has_sustainable_keyword(activity_label) {
            1.0
        } else {
            0.0
        },
    ]
}

/// Integer label encoding over the sorted distinct training categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    classes: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = values.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Index of `value`, or `None` when it was not seen during fitting.
    pub fn encode(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Per-feature standardization fitted on the training split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: FeatureVector,
    scales: FeatureVector,
}

impl StandardScaler {
    /// Returns `None` for an empty sample set.
    pub fn fit(rows: &[FeatureVector]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let count = rows.len() as f64;
        let mut means = [0.0; FEATURE_COUNT];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= count;
        }

        let mut scales = [0.0; FEATURE_COUNT];
        for row in rows {
            for (i, value) in row.iter().enumerate() {
                scales[i] += (value - means[i]).powi(2);
            }
        }
        for scale in &mut scales {
            let std = (*scale / count).sqrt();
            // constant features are left unscaled
            *scale = if std > f64::EPSILON { std } else { 1.0 };
        }

        Some(Self { means, scales })
    }

    pub fn transform(&self, row: &FeatureVector) -> FeatureVector {
        let mut scaled = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            scaled[i] = (row[i] - self.means[i]) / self.scales[i];
        }
        scaled
    }

    pub fn transform_all(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}
