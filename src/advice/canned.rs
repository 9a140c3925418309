//! Local advice used whenever the remote generator is unavailable.

use crate::estimation::Category;
use rand::Rng;
use rand::seq::SliceRandom;

const TRANSPORTATION_ADVICE: [&str; 3] = [
    "Consider using public transport or cycling for shorter trips.",
    "Carpooling can significantly reduce your carbon footprint.",
    "Regular vehicle maintenance helps optimize fuel efficiency.",
];

const FOOD_ADVICE: [&str; 3] = [
    "Try incorporating more plant-based meals into your diet.",
    "Buy local and seasonal produce when possible.",
    "Reduce food waste by planning meals ahead.",
];

const ENERGY_ADVICE: [&str; 3] = [
    "Use energy-efficient appliances and LED lighting.",
    "Consider natural lighting and ventilation when possible.",
    "Unplug devices when not in use to avoid phantom energy usage.",
];

const WASTE_ADVICE: [&str; 3] = [
    "Remember to reduce, reuse, and recycle.",
    "Composting organic waste helps reduce methane emissions.",
    "Choose products with minimal packaging.",
];

const SHOPPING_ADVICE: [&str; 3] = [
    "Second-hand and refurbished items carry a fraction of the footprint of new ones.",
    "Bring a reusable bag and skip single-use packaging at checkout.",
    "Buying fewer, longer-lasting products beats frequent cheap replacements.",
];

const LIFESTYLE_ADVICE: [&str; 3] = [
    "Small daily habits add up, so keep logging and track your progress.",
    "Shorter showers save both water and the energy used to heat it.",
    "Share your eco-friendly routines with friends to multiply their impact.",
];

pub fn advice_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Transportation => &TRANSPORTATION_ADVICE,
        Category::Food => &FOOD_ADVICE,
        Category::Energy => &ENERGY_ADVICE,
        Category::Waste => &WASTE_ADVICE,
        Category::Shopping => &SHOPPING_ADVICE,
        Category::Lifestyle => &LIFESTYLE_ADVICE,
    }
}

/// Random sentence for `category`, or from every table when the category is
/// missing or unrecognized.
pub fn canned_advice<R: Rng + ?Sized>(category: Option<&str>, rng: &mut R) -> String {
    let sentence = match category.and_then(Category::parse) {
        Some(category) => advice_for(category).choose(rng).copied(),
        None => {
            let all: Vec<&str> = Category::ALL
                .iter()
                .flat_map(|category| advice_for(*category).iter().copied())
                .collect();
            all.choose(rng).copied()
        }
    };
    sentence.unwrap_or(LIFESTYLE_ADVICE[0]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn every_category_has_at_least_three_sentences() {
        for category in Category::ALL {
            assert!(advice_for(category).len() >= 3, "{category}");
        }
    }

    #[test]
    fn known_category_draws_from_its_table() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let advice = canned_advice(Some("food"), &mut rng);
            assert!(FOOD_ADVICE.contains(&advice.as_str()));
        }
    }

    #[test]
    fn unknown_category_draws_from_all_tables() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..20 {
            let advice = canned_advice(Some("Gardening"), &mut rng);
            assert!(
                Category::ALL
                    .iter()
                    .any(|category| advice_for(*category).contains(&advice.as_str()))
            );
        }
    }

    #[test]
    fn missing_category_still_returns_text() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(!canned_advice(None, &mut rng).is_empty());
    }
}
