use serde::{Deserialize, Serialize};

use crate::nutrition::NutritionTarget;

use super::reconcile::UsedIngredient;

/// One line of a recipe's ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// What the suggestion should optimise for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Use up as much of the pantry as possible.
    #[default]
    Waste,
    /// Stay inside the user's calorie and protein targets.
    Health,
}

#[derive(Debug, Deserialize)]
pub struct SuggestRecipeRequest {
    #[serde(default)]
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NutritionFacts {
    pub calories_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RecipeSuggestion {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub ready_in_minutes: Option<u32>,
    pub strategy: Strategy,
    pub target: NutritionTarget,
    pub nutrition: NutritionFacts,
    pub instructions: Vec<String>,
    pub used: Vec<UsedIngredient>,
    pub missing: Vec<Ingredient>,
    pub used_count: usize,
    pub missing_count: usize,
}
