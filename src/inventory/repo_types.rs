use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Pantry row. `unit` and `category` hold the string forms of
/// `InventoryUnit` and `Category`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub household_id: Option<Uuid>,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub expiry_date: Date,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInventoryItem {
    pub owner_id: Uuid,
    pub household_id: Option<Uuid>,
    pub name: String,
    pub quantity: f64,
    pub unit: &'static str,
    pub category: &'static str,
    pub expiry_date: Date,
}
