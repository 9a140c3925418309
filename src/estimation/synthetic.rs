//! Synthetic labeled activities for fitting the eco-points model.

use crate::estimation::activity::Category;
use crate::estimation::fallback::{BASE_POINTS, CATEGORY_BONUS_SCALE, EMISSION_PENALTY_PER_KG};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, NormalError};

/// Emission range for a category, in kg CO2e.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionProfile {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

pub fn emission_profile(category: Category) -> EmissionProfile {
    let (min, max, mean) = match category {
        Category::Transportation => (0.1, 50.0, 15.0),
        Category::Food => (0.5, 30.0, 8.0),
        Category::Energy => (1.0, 100.0, 25.0),
        Category::Waste => (0.1, 20.0, 5.0),
        Category::Shopping => (0.5, 40.0, 12.0),
        Category::Lifestyle => (0.2, 25.0, 7.0),
    };
    EmissionProfile { min, max, mean }
}

pub fn activity_vocabulary(category: Category) -> [&'static str; 6] {
    match category {
        Category::Transportation => [
            "Driving to work",
            "Flight to NYC",
            "Bus commute",
            "Cycling",
            "Walking",
            "Electric car trip",
        ],
        Category::Food => [
            "Beef dinner",
            "Vegetarian meal",
            "Fast food",
            "Local produce",
            "Imported fruit",
            "Plant-based diet",
        ],
        Category::Energy => [
            "Home electricity",
            "Heating bill",
            "Solar panels",
            "LED bulbs",
            "Appliance usage",
            "Renewable energy",
        ],
        Category::Waste => [
            "Plastic bottles",
            "Paper recycling",
            "Composting",
            "Landfill waste",
            "E-waste",
            "Textile recycling",
        ],
        Category::Shopping => [
            "New clothes",
            "Electronics",
            "Local products",
            "Second-hand items",
            "Bulk buying",
            "Minimalist purchase",
        ],
        Category::Lifestyle => [
            "Water usage",
            "Air conditioning",
            "Home office",
            "Gardening",
            "Pet care",
            "Home maintenance",
        ],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub activity_label: String,
    pub category: Category,
    pub carbon_kg: f64,
    pub eco_points: f64,
}

/// Training label. Unlike the fallback formula it carries no sustainable
/// keyword bonus.
pub fn label_points(category: Category, carbon_kg: f64) -> f64 {
    (BASE_POINTS - carbon_kg * EMISSION_PENALTY_PER_KG
        + category.multiplier() * CATEGORY_BONUS_SCALE)
        .max(0.0)
}

/// Emission draw for a profile: normal around the mean with a 30% spread.
pub fn emission_distribution(profile: EmissionProfile) -> Result<Normal<f64>, NormalError> {
    Normal::new(profile.mean, profile.mean * 0.3)
}

pub fn generate_training_data(
    n_samples: usize,
    seed: u64,
) -> Result<Vec<TrainingSample>, NormalError> {
    let mut distributions = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let profile = emission_profile(category);
        distributions.push((category, profile, emission_distribution(profile)?));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let Some(&(category, profile, normal)) = distributions.choose(&mut rng) else {
            break;
        };
        let drawn = normal.sample(&mut rng);
        let carbon_kg = round_to(drawn.clamp(profile.min, profile.max), 2);

        let vocabulary = activity_vocabulary(category);
        let activity_label = vocabulary.choose(&mut rng).unwrap_or(&vocabulary[0]);

        samples.push(TrainingSample {
            activity_label: (*activity_label).to_string(),
            category,
            carbon_kg,
            eco_points: round_to(label_points(category, carbon_kg), 1),
        });
    }

    Ok(samples)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::activity::has_sustainable_keyword;
    use crate::estimation::fallback::fallback_points;

    #[test]
    fn generates_requested_sample_count() -> Result<(), NormalError> {
        assert_eq!(generate_training_data(10, 42)?.len(), 10);
        assert!(generate_training_data(0, 42)?.is_empty());
        Ok(())
    }

    #[test]
    fn same_seed_is_reproducible() -> Result<(), NormalError> {
        assert_eq!(generate_training_data(50, 7)?, generate_training_data(50, 7)?);
        assert_ne!(generate_training_data(50, 7)?, generate_training_data(50, 8)?);
        Ok(())
    }

    #[test]
    fn emissions_stay_within_category_range() -> Result<(), NormalError> {
        for sample in generate_training_data(600, 42)? {
            let profile = emission_profile(sample.category);
            assert!(sample.carbon_kg >= profile.min);
            assert!(sample.carbon_kg <= profile.max);
            assert!(activity_vocabulary(sample.category).contains(&sample.activity_label.as_str()));
        }
        Ok(())
    }

    #[test]
    fn emissions_center_on_category_mean() -> Result<(), NormalError> {
        let samples = generate_training_data(1200, 42)?;
        let energy: Vec<f64> = samples
            .iter()
            .filter(|s| s.category == Category::Energy)
            .map(|s| s.carbon_kg)
            .collect();
        let mean = energy.iter().sum::<f64>() / energy.len() as f64;

        assert!((mean - 25.0).abs() < 2.0, "energy mean {mean}");
        Ok(())
    }

    #[test]
    fn negative_spread_is_rejected() {
        let profile = EmissionProfile {
            min: 0.0,
            max: 1.0,
            mean: -1.0,
        };
        assert!(emission_distribution(profile).is_err());
    }

    #[test]
    fn every_category_is_drawn() -> Result<(), NormalError> {
        let samples = generate_training_data(300, 42)?;
        for category in Category::ALL {
            assert!(samples.iter().any(|s| s.category == category));
        }
        Ok(())
    }

    #[test]
    fn labels_omit_sustainable_bonus() -> Result<(), NormalError> {
        let samples = generate_training_data(300, 42)?;
        let sustainable = samples
            .iter()
            .find(|s| {
                has_sustainable_keyword(&s.activity_label)
                    && label_points(s.category, s.carbon_kg) > 0.0
            })
            .cloned();

        let Some(sample) = sustainable else {
            panic!("expected at least one sustainable sample");
        };
        let expected = round_to(label_points(sample.category, sample.carbon_kg), 1);
        assert_eq!(sample.eco_points, expected);

        let fallback = fallback_points(
            &sample.activity_label,
            sample.category.name(),
            sample.carbon_kg,
        );
        assert!((fallback - label_points(sample.category, sample.carbon_kg) - 10.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn rounding_helper() {
        assert_eq!(round_to(12.345, 1), 12.3);
        assert_eq!(round_to(0.126, 2), 0.13);
    }
}
