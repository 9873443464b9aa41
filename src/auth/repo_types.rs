use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub age: i32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: String,
    pub workout_days: i32,
    pub activity_level: String,
    pub allergies: Vec<String>,
    pub dietary_preference: String,
    pub household_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

/// Fields written when an account is created.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub age: i32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: &'a str,
    pub workout_days: i32,
    pub activity_level: &'a str,
    pub allergies: &'a [String],
    pub dietary_preference: &'a str,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub join_code: String,
    pub admin_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}
