use anyhow::Context;
use sqlx::PgExecutor;
use uuid::Uuid;

pub use crate::shopping::repo_types::ShoppingListItem;

impl ShoppingListItem {
    /// The item, provided its list belongs to `user_id`.
    pub async fn find_owned<'e, E>(
        exec: E,
        user_id: Uuid,
        list_id: Uuid,
        item_id: Uuid,
    ) -> anyhow::Result<Option<ShoppingListItem>>
    where
        E: PgExecutor<'e>,
    {
        let item = sqlx::query_as::<_, ShoppingListItem>(
            r#"
            SELECT i.id, i.list_id, i.name, i.amount, i.unit, i.image, i.checked, i.created_at
            FROM shopping_list_items i
            JOIN shopping_lists l ON l.id = i.list_id
            WHERE l.user_id = $1 AND i.list_id = $2 AND i.id = $3
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .bind(item_id)
        .fetch_optional(exec)
        .await
        .context("find shopping list item")?;
        Ok(item)
    }

    pub async fn delete<'e, E>(exec: E, list_id: Uuid, item_id: Uuid) -> anyhow::Result<bool>
    where
        E: PgExecutor<'e>,
    {
        let res = sqlx::query(r#"DELETE FROM shopping_list_items WHERE id = $1 AND list_id = $2"#)
            .bind(item_id)
            .bind(list_id)
            .execute(exec)
            .await
            .context("delete shopping list item")?;
        Ok(res.rows_affected() == 1)
    }
}
