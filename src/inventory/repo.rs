use anyhow::Context;
use sqlx::{PgExecutor, PgPool};
use time::Date;
use uuid::Uuid;

pub use crate::inventory::repo_types::{InventoryItem, NewInventoryItem};
use crate::inventory::services::PantryScope;

const ITEM_COLUMNS: &str =
    "id, owner_id, household_id, name, quantity, unit, category, expiry_date, created_at";

impl InventoryItem {
    /// Delete every item in scope whose expiry date is strictly before `today`.
    pub async fn purge_expired(db: &PgPool, scope: PantryScope, today: Date) -> anyhow::Result<u64> {
        let res = sqlx::query(&format!(
            "DELETE FROM inventory_items WHERE {} = $1 AND expiry_date < $2",
            scope.column()
        ))
        .bind(scope.id())
        .bind(today)
        .execute(db)
        .await
        .context("purge expired inventory")?;
        Ok(res.rows_affected())
    }

    /// Items in scope, soonest expiry first.
    pub async fn list(db: &PgPool, scope: PantryScope) -> anyhow::Result<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE {} = $1 \
             ORDER BY expiry_date ASC, created_at ASC",
            scope.column()
        ))
        .bind(scope.id())
        .fetch_all(db)
        .await
        .context("list inventory")?;
        Ok(rows)
    }

    /// Works with a pool or `&mut **tx`.
    pub async fn insert<'e, E>(exec: E, new: &NewInventoryItem) -> anyhow::Result<InventoryItem>
    where
        E: PgExecutor<'e>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            INSERT INTO inventory_items (owner_id, household_id, name, quantity, unit, category, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(new.owner_id)
        .bind(new.household_id)
        .bind(&new.name)
        .bind(new.quantity)
        .bind(new.unit)
        .bind(new.category)
        .bind(new.expiry_date)
        .fetch_one(exec)
        .await
        .context("insert inventory item")?;
        Ok(item)
    }

    pub async fn delete(db: &PgPool, scope: PantryScope, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(&format!(
            "DELETE FROM inventory_items WHERE id = $1 AND {} = $2",
            scope.column()
        ))
        .bind(id)
        .bind(scope.id())
        .execute(db)
        .await
        .context("delete inventory item")?;
        Ok(res.rows_affected() == 1)
    }
}
