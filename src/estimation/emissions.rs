//! Rule-based carbon emission estimates.
//!
//! Factors are kg CO2e per km for transport and per kWh for energy. Every
//! category has a fixed default used when the relevant amount is missing.

use crate::estimation::activity::ActivityInput;

pub const CAR_KG_PER_KM: f64 = 0.21;
pub const ELECTRICITY_KG_PER_KWH: f64 = 0.233;

pub const DEFAULT_TRANSPORT_KG: f64 = 15.0;
pub const DEFAULT_ENERGY_KG: f64 = 25.0;
pub const WASTE_KG: f64 = 1.0;
pub const DEFAULT_KG: f64 = 5.0;

pub const BEEF_KG_PER_UNIT: f64 = 27.0;
pub const VEGETARIAN_KG_PER_UNIT: f64 = 2.0;
pub const MEAL_KG_PER_UNIT: f64 = 5.0;

pub fn transport_factor(mode: &str) -> Option<f64> {
    match mode {
        "car" => Some(CAR_KG_PER_KM),
        "electric_car" => Some(0.05),
        "bus" => Some(0.05),
        "train" => Some(0.04),
        "plane" => Some(0.11),
        "bike" | "walk" => Some(0.0),
        _ => None,
    }
}

pub fn energy_factor(source: &str) -> Option<f64> {
    match source {
        "electricity" => Some(ELECTRICITY_KG_PER_KWH),
        "natural_gas" => Some(0.198),
        "solar" => Some(0.0),
        _ => None,
    }
}

/// Estimated emission for a logged activity, never negative.
pub fn estimate_emissions(input: &ActivityInput) -> f64 {
    let category = input.category.trim().to_lowercase();
    let label = input.activity_label.to_lowercase();
    let mode = input
        .mode
        .as_deref()
        .map(|mode| mode.trim().to_lowercase())
        .unwrap_or_default();
    let distance = amount(input.distance);
    let quantity = amount(input.quantity);

    let carbon_kg = match category.as_str() {
        "transportation" => {
            if distance == 0.0 {
                DEFAULT_TRANSPORT_KG
            } else {
                distance * transport_factor(&mode).unwrap_or(CAR_KG_PER_KM)
            }
        }
        "food" => {
            let (per_unit, default) = if label.contains("beef") {
                (BEEF_KG_PER_UNIT, BEEF_KG_PER_UNIT)
            } else if label.contains("vegetarian") {
                (VEGETARIAN_KG_PER_UNIT, VEGETARIAN_KG_PER_UNIT)
            } else {
                (MEAL_KG_PER_UNIT, MEAL_KG_PER_UNIT)
            };
            if quantity == 0.0 {
                default
            } else {
                quantity * per_unit
            }
        }
        "energy" => {
            if quantity == 0.0 {
                DEFAULT_ENERGY_KG
            } else {
                quantity * energy_factor(&mode).unwrap_or(ELECTRICITY_KG_PER_KWH)
            }
        }
        "waste" => WASTE_KG,
        _ => DEFAULT_KG,
    };

    carbon_kg.max(0.0)
}

// Absent and non-finite amounts both read as zero.
fn amount(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
