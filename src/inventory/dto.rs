use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::inventory::repo::InventoryItem;
use crate::units::MetricUnit;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryUnit {
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "L", alias = "l")]
    L,
    #[serde(rename = "ml")]
    Ml,
    #[serde(rename = "pcs")]
    Pcs,
    #[serde(rename = "pack")]
    Pack,
}

impl InventoryUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            InventoryUnit::Kg => "kg",
            InventoryUnit::G => "g",
            InventoryUnit::L => "L",
            InventoryUnit::Ml => "ml",
            InventoryUnit::Pcs => "pcs",
            InventoryUnit::Pack => "pack",
        }
    }
}

impl From<MetricUnit> for InventoryUnit {
    fn from(unit: MetricUnit) -> Self {
        match unit {
            MetricUnit::Grams => InventoryUnit::G,
            MetricUnit::Kilograms => InventoryUnit::Kg,
            MetricUnit::Milliliters => InventoryUnit::Ml,
            MetricUnit::Liters => InventoryUnit::L,
            MetricUnit::Pieces => InventoryUnit::Pcs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    Vegetable,
    Fruit,
    Dairy,
    Grain,
    Meat,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Vegetable => "Vegetable",
            Category::Fruit => "Fruit",
            Category::Dairy => "Dairy",
            Category::Grain => "Grain",
            Category::Meat => "Meat",
            Category::Other => "Other",
        }
    }
}

/// Quantity, unit, expiry and category as confirmed by the user. Shared by
/// manual adds and shopping-list transfers.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDetails {
    pub quantity: f64,
    pub unit: InventoryUnit,
    #[serde(with = "iso_date")]
    pub expiry_date: Date,
    #[serde(default)]
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct NewItemRequest {
    pub name: String,
    #[serde(flatten)]
    pub details: ItemDetails,
}

#[derive(Debug, Serialize)]
pub struct InventoryItemResponse {
    pub id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    #[serde(with = "iso_date")]
    pub expiry_date: Date,
    pub owner_id: Uuid,
    pub household_id: Option<Uuid>,
}

impl From<InventoryItem> for InventoryItemResponse {
    fn from(item: InventoryItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            quantity: item.quantity,
            unit: item.unit,
            category: item.category,
            expiry_date: item.expiry_date,
            owner_id: item.owner_id,
            household_id: item.household_id,
        }
    }
}
