use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::lockout::{
    LoginAttempts, FIRST_LOCKOUT, FIRST_LOCKOUT_AT, LONG_LOCKOUT, LONG_LOCKOUT_FROM,
    SECOND_LOCKOUT, SECOND_LOCKOUT_AT,
};
#[cfg(test)]
pub(crate) use memory::MemoryLoginAttemptStore;

/// Account-side storage of the login counter. Every method is a single
/// atomic operation so concurrent failures are never lost.
#[async_trait]
pub trait LoginAttemptStore: Send + Sync {
    async fn current(&self, account: Uuid) -> anyhow::Result<LoginAttempts>;
    async fn record_failed_login(
        &self,
        account: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<LoginAttempts>;
    async fn record_successful_login(&self, account: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgLoginAttemptStore {
    db: PgPool,
}

impl PgLoginAttemptStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LoginAttemptStore for PgLoginAttemptStore {
    async fn current(&self, account: Uuid) -> anyhow::Result<LoginAttempts> {
        let (attempts, lockout_until) = sqlx::query_as::<_, (i32, Option<OffsetDateTime>)>(
            r#"SELECT login_attempts, lockout_until FROM users WHERE id = $1"#,
        )
        .bind(account)
        .fetch_one(&self.db)
        .await
        .context("load login attempts")?;
        Ok(LoginAttempts {
            attempts,
            lockout_until,
        })
    }

    async fn record_failed_login(
        &self,
        account: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<LoginAttempts> {
        // Right-hand sides see the pre-update row, so `login_attempts + 1`
        // is the new count in every branch.
        let (attempts, lockout_until) = sqlx::query_as::<_, (i32, Option<OffsetDateTime>)>(
            r#"
            UPDATE users
               SET login_attempts = login_attempts + 1,
                   lockout_until = CASE
                       WHEN login_attempts + 1 >= $7 THEN $2 + make_interval(secs => $8::float8)
                       WHEN login_attempts + 1 = $5 THEN $2 + make_interval(secs => $6::float8)
                       WHEN login_attempts + 1 = $3 THEN $2 + make_interval(secs => $4::float8)
                       ELSE lockout_until
                   END
             WHERE id = $1
            RETURNING login_attempts, lockout_until
            "#,
        )
        .bind(account)
        .bind(now)
        .bind(FIRST_LOCKOUT_AT)
        .bind(FIRST_LOCKOUT.whole_seconds() as f64)
        .bind(SECOND_LOCKOUT_AT)
        .bind(SECOND_LOCKOUT.whole_seconds() as f64)
        .bind(LONG_LOCKOUT_FROM)
        .bind(LONG_LOCKOUT.whole_seconds() as f64)
        .fetch_one(&self.db)
        .await
        .context("record failed login")?;
        Ok(LoginAttempts {
            attempts,
            lockout_until,
        })
    }

    async fn record_successful_login(&self, account: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"UPDATE users SET login_attempts = 0, lockout_until = NULL WHERE id = $1"#,
        )
        .bind(account)
        .execute(&self.db)
        .await
        .context("record successful login")?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_failures_are_all_counted() {
        let store = Arc::new(MemoryLoginAttemptStore::default());
        let account = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.record_failed_login(account, now).await })
            })
            .collect();

        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap().unwrap().attempts);
        }
        seen.sort_unstable();

        assert_eq!(seen, (1..=32).collect::<Vec<_>>());
        assert_eq!(store.current(account).await.unwrap().attempts, 32);
    }

    #[tokio::test]
    async fn success_resets_counter() {
        let store = MemoryLoginAttemptStore::default();
        let account = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        for _ in 0..4 {
            store.record_failed_login(account, now).await.unwrap();
        }
        assert!(store.current(account).await.unwrap().lockout_until.is_some());

        store.record_successful_login(account).await.unwrap();
        assert_eq!(store.current(account).await.unwrap(), LoginAttempts::default());
    }
}

/// Runs against `DATABASE_URL`: `cargo test -- --ignored`.
#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::auth::lockout::apply_failure;
    use std::sync::Arc;
    use time::macros::datetime;

    async fn seeded_account() -> (PgPool, Uuid) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for postgres tests");
        let db = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&db).await.expect("migrate");

        let tag = Uuid::new_v4().simple().to_string();
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, email, password_hash, age, height_cm, weight_kg)
            VALUES ($1, $2, 'x', 30, 170, 70)
            RETURNING id
            "#,
        )
        .bind(format!("lockout-{tag}"))
        .bind(format!("lockout-{tag}@example.com"))
        .fetch_one(&db)
        .await
        .expect("seed user");
        (db, id)
    }

    #[tokio::test]
    #[ignore]
    async fn concurrent_failures_are_all_counted_in_postgres() {
        let (db, account) = seeded_account().await;
        let store = Arc::new(PgLoginAttemptStore::new(db));
        let now = OffsetDateTime::now_utc();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.record_failed_login(account, now).await })
            })
            .collect();

        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap().unwrap().attempts);
        }
        seen.sort_unstable();

        assert_eq!(seen, (1..=16).collect::<Vec<_>>());
        assert_eq!(store.current(account).await.unwrap().attempts, 16);
    }

    #[tokio::test]
    #[ignore]
    async fn sql_update_follows_the_lockout_policy() {
        let (db, account) = seeded_account().await;
        let store = PgLoginAttemptStore::new(db);
        let mut expected = LoginAttempts::default();
        let mut now = datetime!(2030-01-01 12:00:00 UTC);

        for _ in 0..10 {
            expected = apply_failure(expected, now);
            let got = store.record_failed_login(account, now).await.unwrap();
            assert_eq!(got, expected, "after {} failures", expected.attempts);
            now += time::Duration::minutes(20);
        }

        store.record_successful_login(account).await.unwrap();
        assert_eq!(store.current(account).await.unwrap(), LoginAttempts::default());
    }
}
