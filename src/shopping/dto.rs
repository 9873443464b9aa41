use serde::Serialize;
use uuid::Uuid;

use crate::inventory::dto::InventoryUnit;

#[derive(Debug, Serialize, PartialEq)]
pub struct OriginalAmount {
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SuggestedAmount {
    pub quantity: f64,
    pub unit: InventoryUnit,
}

/// Pre-fill for the "move to pantry" form.
#[derive(Debug, Serialize, PartialEq)]
pub struct ConversionResponse {
    pub item_id: Uuid,
    pub name: String,
    pub original: OriginalAmount,
    pub suggested: SuggestedAmount,
}
