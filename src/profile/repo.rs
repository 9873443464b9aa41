use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo::{Household, User};
use crate::profile::services::ProfileUpdate;

impl User {
    pub async fn update_profile(db: &PgPool, id: Uuid, update: &ProfileUpdate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET age = $2, height_cm = $3, weight_kg = $4, gender = $5, workout_days = $6,
                activity_level = $7, allergies = $8, dietary_preference = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.age)
        .bind(update.height_cm)
        .bind(update.weight_kg)
        .bind(update.gender)
        .bind(update.workout_days)
        .bind(update.activity_level)
        .bind(&update.allergies)
        .bind(&update.dietary_preference)
        .execute(db)
        .await
        .context("update profile")?;
        Ok(())
    }
}

impl Household {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Household>> {
        let household = sqlx::query_as::<_, Household>(
            r#"SELECT id, name, join_code, admin_id, created_at FROM households WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find household by id")?;
        Ok(household)
    }
}
