use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::inventory::dto::{InventoryUnit, ItemDetails};
use crate::inventory::repo::InventoryItem;
use crate::inventory::services::validate_item;
use crate::shopping::dto::{ConversionResponse, OriginalAmount, SuggestedAmount};
use crate::shopping::repo::ShoppingListItem;
use crate::units::normalize;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("shopping list item not found")]
    NotFound,
    #[error("{0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::Db(e.into())
    }
}

pub fn conversion_for(item: &ShoppingListItem) -> ConversionResponse {
    let n = normalize(item.amount, &item.unit);
    ConversionResponse {
        item_id: item.id,
        name: item.name.clone(),
        original: OriginalAmount {
            amount: item.amount,
            unit: item.unit.clone(),
        },
        suggested: SuggestedAmount {
            quantity: n.quantity,
            unit: InventoryUnit::from(n.unit),
        },
    }
}

/// Create the pantry item and consume the shopping list item in one
/// transaction.
#[instrument(skip(db, user, details), fields(user_id = %user.id))]
pub async fn move_to_pantry(
    db: &PgPool,
    user: &User,
    list_id: Uuid,
    item_id: Uuid,
    details: &ItemDetails,
) -> Result<InventoryItem, TransferError> {
    let mut tx = db.begin().await?;

    let item = ShoppingListItem::find_owned(&mut *tx, user.id, list_id, item_id)
        .await?
        .ok_or(TransferError::NotFound)?;
    let new = validate_item(user, &item.name, details).map_err(TransferError::Invalid)?;

    let created = InventoryItem::insert(&mut *tx, &new).await?;
    if !ShoppingListItem::delete(&mut *tx, list_id, item_id).await? {
        // Consumed by a concurrent transfer; dropping `tx` rolls back.
        return Err(TransferError::NotFound);
    }
    tx.commit().await?;

    info!(%item_id, inventory_id = %created.id, "shopping item moved to pantry");
    Ok(created)
}
