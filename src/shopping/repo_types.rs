use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub list_id: Uuid,
    pub name: String,
    pub amount: f64,
    /// Free text as entered or copied from a recipe ("cups", "2 lb bag").
    pub unit: String,
    pub image: Option<String>,
    pub checked: bool,
    pub created_at: OffsetDateTime,
}
