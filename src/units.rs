//! Conversion of free-text recipe and shopping units into the metric
//! vocabulary the pantry stores.
//!
//! Matching is substring based on the lower-cased unit, checked in a fixed
//! order where the first hit wins. Fluid ounces come before plain ounces
//! because `"fl oz"` also contains `"oz"`.

use serde::{Deserialize, Serialize};

/// Canonical unit produced by [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "ml")]
    Milliliters,
    #[serde(rename = "L")]
    Liters,
    #[serde(rename = "pcs")]
    Pieces,
}

impl MetricUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricUnit::Grams => "g",
            MetricUnit::Kilograms => "kg",
            MetricUnit::Milliliters => "ml",
            MetricUnit::Liters => "L",
            MetricUnit::Pieces => "pcs",
        }
    }
}

impl std::fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Normalized {
    pub quantity: f64,
    pub unit: MetricUnit,
}

impl Normalized {
    fn new(quantity: f64, unit: MetricUnit) -> Self {
        Self { quantity, unit }
    }
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    FluidOunce,
    Ounce,
    Pound,
    Cup,
    Tablespoon,
    Teaspoon,
    Gallon,
    Quart,
    Pint,
}

const RULES: &[(Rule, &[&str])] = &[
    (Rule::FluidOunce, &["fl oz", "fluid ounce"]),
    (Rule::Ounce, &["oz", "ounce"]),
    (Rule::Pound, &["lb", "pound"]),
    (Rule::Cup, &["cup"]),
    (Rule::Tablespoon, &["tbsp", "tablespoon"]),
    (Rule::Teaspoon, &["tsp", "teaspoon"]),
    (Rule::Gallon, &["gallon"]),
    (Rule::Quart, &["quart"]),
    (Rule::Pint, &["pint"]),
];

const GRAMS: &[&str] = &["g", "gs", "gram", "grams", "gramme", "grammes"];
const KILOGRAMS: &[&str] = &["kg", "kgs", "kilogram", "kilograms"];
const MILLILITERS: &[&str] = &[
    "ml",
    "mls",
    "milliliter",
    "milliliters",
    "millilitre",
    "millilitres",
];
const LITERS: &[&str] = &["l", "ls", "liter", "liters", "litre", "litres"];

/// Convert `amount` expressed in `unit` into a metric quantity.
///
/// Total over all inputs: anything unrecognised is treated as a count and
/// returned unchanged as `pcs`.
pub fn normalize(amount: f64, unit: &str) -> Normalized {
    let unit = unit.trim().to_lowercase();

    let rule = RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| unit.contains(n)))
        .map(|(rule, _)| *rule);

    if let Some(rule) = rule {
        return apply(rule, amount);
    }

    let unit = unit.as_str();
    if KILOGRAMS.contains(&unit) {
        Normalized::new(amount, MetricUnit::Kilograms)
    } else if GRAMS.contains(&unit) {
        Normalized::new(amount, MetricUnit::Grams)
    } else if MILLILITERS.contains(&unit) {
        Normalized::new(amount, MetricUnit::Milliliters)
    } else if LITERS.contains(&unit) {
        Normalized::new(amount, MetricUnit::Liters)
    } else {
        Normalized::new(amount, MetricUnit::Pieces)
    }
}

fn apply(rule: Rule, amount: f64) -> Normalized {
    match rule {
        Rule::FluidOunce => Normalized::new((amount * 29.57).round(), MetricUnit::Milliliters),
        Rule::Ounce => Normalized::new((amount * 28.35).round(), MetricUnit::Grams),
        Rule::Pound => {
            let grams = amount * 453.6;
            if grams >= 1000.0 {
                Normalized::new(round2(grams / 1000.0), MetricUnit::Kilograms)
            } else {
                Normalized::new(grams.round(), MetricUnit::Grams)
            }
        }
        Rule::Cup => Normalized::new((amount * 237.0).round(), MetricUnit::Milliliters),
        Rule::Tablespoon => Normalized::new((amount * 15.0).round(), MetricUnit::Milliliters),
        Rule::Teaspoon => Normalized::new((amount * 5.0).round(), MetricUnit::Milliliters),
        Rule::Gallon => Normalized::new(round2(amount * 3.78), MetricUnit::Liters),
        Rule::Quart => Normalized::new(round2(amount * 0.94), MetricUnit::Liters),
        Rule::Pint => Normalized::new((amount * 473.0).round(), MetricUnit::Milliliters),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
