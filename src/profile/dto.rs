use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::{Household, User};
use crate::nutrition::{NutritionTarget, Sex};

#[derive(Debug, Serialize)]
pub struct HouseholdSummary {
    pub id: Uuid,
    pub name: String,
    pub join_code: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub age: i32,
    pub height: f64,
    pub weight: f64,
    pub gender: String,
    pub workout_days: i32,
    pub activity_level: String,
    pub allergies: Vec<String>,
    pub dietary_preference: String,
    pub household: Option<HouseholdSummary>,
    /// Absent when the stored metrics cannot produce a target.
    pub meal_target: Option<NutritionTarget>,
}

impl ProfileResponse {
    pub fn new(user: User, household: Option<Household>, meal_target: Option<NutritionTarget>) -> Self {
        let household = household.map(|h| HouseholdSummary {
            is_admin: h.admin_id == Some(user.id),
            id: h.id,
            name: h.name,
            join_code: h.join_code,
        });
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            age: user.age,
            height: user.height_cm,
            weight: user.weight_kg,
            gender: user.gender,
            workout_days: user.workout_days,
            activity_level: user.activity_level,
            allergies: user.allergies,
            dietary_preference: user.dietary_preference,
            household,
            meal_target,
        }
    }
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub age: Option<i32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub gender: Option<Sex>,
    pub workout_days: Option<u32>,
    pub allergies: Option<Vec<String>>,
    pub dietary_preference: Option<String>,
}
