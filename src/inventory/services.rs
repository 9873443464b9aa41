use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::inventory::dto::ItemDetails;
use crate::inventory::repo::{InventoryItem, NewInventoryItem};

/// Whose pantry a request sees: the household's when the user has joined
/// one, otherwise only their own items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PantryScope {
    Household(Uuid),
    Owner(Uuid),
}

impl PantryScope {
    pub fn of(user: &User) -> Self {
        match user.household_id {
            Some(h) => PantryScope::Household(h),
            None => PantryScope::Owner(user.id),
        }
    }

    pub(crate) fn column(self) -> &'static str {
        match self {
            PantryScope::Household(_) => "household_id",
            PantryScope::Owner(_) => "owner_id",
        }
    }

    pub(crate) fn id(self) -> Uuid {
        match self {
            PantryScope::Household(id) | PantryScope::Owner(id) => id,
        }
    }
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Purge expired items, then return what is left.
pub async fn current_pantry(
    db: &PgPool,
    scope: PantryScope,
    today: Date,
) -> anyhow::Result<Vec<InventoryItem>> {
    let purged = InventoryItem::purge_expired(db, scope, today).await?;
    if purged > 0 {
        debug!(?scope, purged, "expired inventory removed");
    }
    InventoryItem::list(db, scope).await
}

pub fn validate_item(
    owner: &User,
    name: &str,
    details: &ItemDetails,
) -> Result<NewInventoryItem, &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Item name is required");
    }
    if !details.quantity.is_finite() || details.quantity <= 0.0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(NewInventoryItem {
        owner_id: owner.id,
        household_id: owner.household_id,
        name: name.to_string(),
        quantity: details.quantity,
        unit: details.unit.as_str(),
        category: details.category.as_str(),
        expiry_date: details.expiry_date,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::auth::repo::User;
    use time::OffsetDateTime;
    use uuid::Uuid;

    pub fn user(household_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "cook".into(),
            email: "cook@example.com".into(),
            password_hash: String::new(),
            age: 25,
            height_cm: 175.0,
            weight_kg: 70.0,
            gender: "male".into(),
            workout_days: 0,
            activity_level: "sedentary".into(),
            allergies: Vec::new(),
            dietary_preference: "None".into(),
            household_id,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }
}
