//! Per-meal calorie and protein targets (Mifflin-St Jeor) used to bias the
//! recipe search toward a user's body metrics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl std::str::FromStr for Sex {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            "other" => Ok(Sex::Other),
            other => anyhow::bail!("unknown sex category: {other}"),
        }
    }
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
}

impl ActivityLevel {
    /// 0 days sedentary, 1-2 light, 3-5 moderate, 6+ active.
    pub fn from_workout_days(days: u32) -> Self {
        match days {
            0 => ActivityLevel::Sedentary,
            1..=2 => ActivityLevel::Light,
            3..=5 => ActivityLevel::Moderate,
            _ => ActivityLevel::Active,
        }
    }

    fn calorie_multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
        }
    }

    /// Daily protein in grams per kilogram of body weight.
    fn protein_per_kg(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 0.8,
            ActivityLevel::Light => 1.0,
            ActivityLevel::Moderate => 1.2,
            ActivityLevel::Active => 1.6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
        }
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            other => anyhow::bail!("unknown activity level: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: f64,
    pub sex: Sex,
    pub activity: ActivityLevel,
}

impl BodyProfile {
    /// Stand-in for users whose stored profile is incomplete.
    pub const DEFAULT: BodyProfile = BodyProfile {
        weight_kg: 70.0,
        height_cm: 175.0,
        age_years: 25.0,
        sex: Sex::Other,
        activity: ActivityLevel::Sedentary,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NutritionTarget {
    pub calories_kcal: u32,
    pub protein_g: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum NutritionError {
    #[error("invalid profile: {field} must be positive")]
    InvalidProfile { field: &'static str },
}

/// Share of the daily energy budget assigned to one main meal.
const MEAL_SHARE: f64 = 0.35;
const MEALS_PER_DAY: f64 = 3.0;

pub fn basal_metabolic_rate(p: &BodyProfile) -> Result<f64, NutritionError> {
    for (field, value) in [
        ("weight", p.weight_kg),
        ("height", p.height_cm),
        ("age", p.age_years),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(NutritionError::InvalidProfile { field });
        }
    }

    let base = 10.0 * p.weight_kg + 6.25 * p.height_cm - 5.0 * p.age_years;
    Ok(match p.sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
        Sex::Other => base - 78.0,
    })
}

pub fn meal_target(p: &BodyProfile) -> Result<NutritionTarget, NutritionError> {
    let daily_kcal = basal_metabolic_rate(p)? * p.activity.calorie_multiplier();
    let daily_protein = p.weight_kg * p.activity.protein_per_kg();

    Ok(NutritionTarget {
        calories_kcal: (daily_kcal * MEAL_SHARE).round().max(1.0) as u32,
        protein_g: (daily_protein / MEALS_PER_DAY).round().max(1.0) as u32,
    })
}
