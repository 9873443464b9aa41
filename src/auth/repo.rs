use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

pub use crate::auth::repo_types::{Household, NewUser, User};

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, age, height_cm, weight_kg, gender,
    workout_days, activity_level, allergies, dietary_preference, household_id, created_at
"#;

impl User {
    /// Find a user by email (case-insensitive) or exact username. An email
    /// match wins over a username match.
    pub async fn find_by_login(db: &PgPool, login: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = lower($1) OR username = $1 \
             ORDER BY (email = lower($1)) DESC LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(db)
        .await
        .context("find user by login")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Whether the email or the username is already registered.
    pub async fn exists(db: &PgPool, email: &str, username: &str) -> anyhow::Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR username = $2)"#,
        )
        .bind(email)
        .bind(username)
        .fetch_one(db)
        .await
        .context("check user exists")?;
        Ok(taken)
    }

    /// Create a new user with hashed password.
    pub async fn create_tx(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewUser<'_>,
        household_id: Option<Uuid>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, age, height_cm, weight_kg, gender,
                               workout_days, activity_level, allergies, dietary_preference,
                               household_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.age)
        .bind(new.height_cm)
        .bind(new.weight_kg)
        .bind(new.gender)
        .bind(new.workout_days)
        .bind(new.activity_level)
        .bind(new.allergies)
        .bind(new.dietary_preference)
        .bind(household_id)
        .fetch_one(&mut **tx)
        .await
        .context("insert user")?;
        Ok(user)
    }

    pub async fn set_household_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        household_id: Uuid,
    ) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET household_id = $2 WHERE id = $1"#)
            .bind(user_id)
            .bind(household_id)
            .execute(&mut **tx)
            .await
            .context("link user to household")?;
        Ok(())
    }
}

/// Pending password reset: hashed code and its deadline.
pub type StoredResetCode = (Option<String>, Option<OffsetDateTime>);

impl User {
    pub async fn set_reset_code(
        db: &PgPool,
        id: Uuid,
        code_hash: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"UPDATE users SET reset_code_hash = $2, reset_code_expires = $3 WHERE id = $1"#,
        )
        .bind(id)
        .bind(code_hash)
        .bind(expires)
        .execute(db)
        .await
        .context("store reset code")?;
        Ok(())
    }

    pub async fn reset_code(db: &PgPool, id: Uuid) -> anyhow::Result<StoredResetCode> {
        let stored = sqlx::query_as::<_, (Option<String>, Option<OffsetDateTime>)>(
            r#"SELECT reset_code_hash, reset_code_expires FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_one(db)
        .await
        .context("load reset code")?;
        Ok(stored)
    }

    /// Replace the password and consume the reset code.
    pub async fn reset_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_code_hash = NULL, reset_code_expires = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await
        .context("reset password")?;
        Ok(())
    }
}

impl Household {
    pub async fn find_by_join_code(
        tx: &mut Transaction<'_, Postgres>,
        join_code: &str,
    ) -> anyhow::Result<Option<Household>> {
        let household = sqlx::query_as::<_, Household>(
            r#"
            SELECT id, name, join_code, admin_id, created_at
            FROM households
            WHERE join_code = upper($1)
            "#,
        )
        .bind(join_code.trim())
        .fetch_optional(&mut **tx)
        .await
        .context("find household by join code")?;
        Ok(household)
    }

    pub async fn create_tx(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        join_code: &str,
        admin_id: Uuid,
    ) -> anyhow::Result<Household> {
        let household = sqlx::query_as::<_, Household>(
            r#"
            INSERT INTO households (name, join_code, admin_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, join_code, admin_id, created_at
            "#,
        )
        .bind(name)
        .bind(join_code)
        .bind(admin_id)
        .fetch_one(&mut **tx)
        .await
        .context("insert household")?;
        Ok(household)
    }
}
