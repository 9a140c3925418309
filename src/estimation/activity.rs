//! Activity description types shared by the calculator and the points models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keywords that mark a label as describing a sustainable activity.
pub const SUSTAINABLE_KEYWORDS: [&str; 9] = [
    "solar",
    "electric",
    "cycling",
    "walking",
    "recycling",
    "compost",
    "local",
    "second-hand",
    "plant-based",
];

/// Multiplier applied to categories outside the known set.
pub const DEFAULT_CATEGORY_MULTIPLIER: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Transportation,
    Food,
    Energy,
    Waste,
    Shopping,
    Lifestyle,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Transportation,
        Category::Food,
        Category::Energy,
        Category::Waste,
        Category::Shopping,
        Category::Lifestyle,
    ];

    /// Case-insensitive lookup. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(trimmed))
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Transportation => "Transportation",
            Category::Food => "Food",
            Category::Energy => "Energy",
            Category::Waste => "Waste",
            Category::Shopping => "Shopping",
            Category::Lifestyle => "Lifestyle",
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Category::Transportation => 1.2,
            Category::Food => 1.0,
            Category::Energy => 1.3,
            Category::Waste => 0.8,
            Category::Shopping => 0.9,
            Category::Lifestyle => 0.7,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Multiplier for a free-form category name.
pub fn category_multiplier(category: &str) -> f64 {
    Category::parse(category)
        .map(Category::multiplier)
        .unwrap_or(DEFAULT_CATEGORY_MULTIPLIER)
}

pub fn has_sustainable_keyword(activity_label: &str) -> bool {
    let lowered = activity_label.to_lowercase();
    SUSTAINABLE_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Structured description of a logged activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityInput {
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "activity")]
    pub activity_label: String,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub mode: Option<String>,
}

impl ActivityInput {
    pub fn new(category: impl Into<String>, activity_label: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            activity_label: activity_label.into(),
            ..Self::default()
        }
    }

    pub fn with_distance(mut self, distance_km: f64) -> Self {
        self.distance = Some(distance_km);
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EcoPointsEstimate {
    pub points: f64,
    pub source: PredictionSource,
}

impl EcoPointsEstimate {
    pub fn is_model_based(&self) -> bool {
        self.source == PredictionSource::Model
    }
}
