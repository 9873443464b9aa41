pub(crate) use crate::auth::dto::{Claims, JwtKeys, TokenKind};
use crate::auth::attempts::LoginAttemptStore;
use crate::auth::repo::User;
use crate::auth::lockout::{attempts_before_lockout, remaining_minutes, LoginState};
use crate::config::JwtConfig;
use crate::state::AppState;
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{async_trait, extract::{FromRef, FromRequestParts}, http::{request::Parts, StatusCode}};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use rand::Rng;
use regex::Regex;
use sqlx::PgPool;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Usernames share the login field with emails, so they may not contain '@'.
pub(crate) fn check_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username is required");
    }
    if username.contains('@') {
        return Err("Username cannot contain '@'");
    }
    Ok(())
}

/// At least 8 characters including one special character.
pub(crate) fn check_password_policy(password: &str) -> Result<(), &'static str> {
    lazy_static! {
        static ref SPECIAL_RE: Regex = Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).unwrap();
    }
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !SPECIAL_RE.is_match(password) {
        return Err("Password must contain at least one special character");
    }
    Ok(())
}

const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six upper-case alphanumerics shared with household members.
pub(crate) fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Six decimal digits mailed to the account owner.
pub(crate) fn generate_reset_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub const RESET_CODE_TTL: TimeDuration = TimeDuration::minutes(10);

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Result of one login attempt against the lockout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    /// Wrong password, no lockout yet.
    Rejected { attempts: i32, remaining: i32 },
    /// Wrong password that tripped a lockout.
    LockedOut { attempts: i32, until: OffsetDateTime },
    /// Account was already locked; the password was not checked.
    StillLocked { until: OffsetDateTime, minutes: i64 },
}

/// Runs one login attempt. `check_password` is only invoked when the
/// account is not currently locked.
pub async fn attempt_login<F>(
    store: &dyn LoginAttemptStore,
    account: Uuid,
    now: OffsetDateTime,
    check_password: F,
) -> anyhow::Result<LoginOutcome>
where
    F: FnOnce() -> anyhow::Result<bool>,
{
    let record = store.current(account).await?;
    if let LoginState::Locked { until } = LoginState::of(&record, now) {
        let minutes = remaining_minutes(until, now).unwrap_or(1);
        warn!(%account, minutes, "login while locked");
        return Ok(LoginOutcome::StillLocked { until, minutes });
    }

    if check_password()? {
        store.record_successful_login(account).await?;
        return Ok(LoginOutcome::Authenticated);
    }

    let record = store.record_failed_login(account, now).await?;
    Ok(match LoginState::of(&record, now) {
        LoginState::Locked { until } => {
            info!(%account, attempts = record.attempts, %until, "account locked");
            LoginOutcome::LockedOut {
                attempts: record.attempts,
                until,
            }
        }
        _ => LoginOutcome::Rejected {
            attempts: record.attempts,
            remaining: attempts_before_lockout(record.attempts),
        },
    })
}

/// Stored reset code as seen at `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetCode {
    Missing,
    Expired,
    Live { hash: String },
}

impl ResetCode {
    pub fn of(hash: Option<String>, expires: Option<OffsetDateTime>, now: OffsetDateTime) -> Self {
        match (hash, expires) {
            (Some(hash), Some(expires)) if expires >= now => ResetCode::Live { hash },
            (Some(_), _) => ResetCode::Expired,
            (None, _) => ResetCode::Missing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Accepted,
    NoCode,
    Expired,
    /// Wrong code or locked account; wrong codes count as failed logins.
    Refused(LoginOutcome),
}

/// Check a reset code under the same lockout policy as passwords.
pub async fn redeem_reset_code(
    store: &dyn LoginAttemptStore,
    account: Uuid,
    stored: ResetCode,
    code: &str,
    now: OffsetDateTime,
) -> anyhow::Result<ResetOutcome> {
    let hash = match stored {
        ResetCode::Missing => return Ok(ResetOutcome::NoCode),
        ResetCode::Expired => return Ok(ResetOutcome::Expired),
        ResetCode::Live { hash } => hash,
    };
    Ok(
        match attempt_login(store, account, now, || verify_password(code.trim(), &hash)).await? {
            LoginOutcome::Authenticated => ResetOutcome::Accepted,
            other => ResetOutcome::Refused(other),
        },
    )
}

/// Load the account behind a verified token. A token for a deleted account
/// is treated like a bad token.
pub(crate) async fn current_user(db: &PgPool, user_id: Uuid) -> Result<User, (StatusCode, String)> {
    match User::find_by_id(db, user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            warn!(%user_id, "token for unknown user");
            Err((StatusCode::UNAUTHORIZED, "User not found".into()))
        }
        Err(e) => {
            error!(error = %e, %user_id, "load user failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Access)
    }
    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Refresh)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}



pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        ))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Access token required".to_string(),
            ));
        }

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod reset_tests {
    use super::*;
    use crate::auth::attempts::MemoryLoginAttemptStore;
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2024-03-01 12:00:00 UTC);

    #[test]
    fn reset_codes_are_six_digits() {
        for _ in 0..20 {
            let code = generate_reset_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn stored_code_expires_after_ten_minutes() {
        let expires = T0 + RESET_CODE_TTL;
        assert_eq!(
            ResetCode::of(Some("h".into()), Some(expires), T0 + TimeDuration::minutes(9)),
            ResetCode::Live { hash: "h".into() }
        );
        assert_eq!(
            ResetCode::of(Some("h".into()), Some(expires), T0 + TimeDuration::minutes(11)),
            ResetCode::Expired
        );
        assert_eq!(ResetCode::of(None, Some(expires), T0), ResetCode::Missing);
    }

    #[tokio::test]
    async fn right_code_is_accepted_and_wrong_codes_count_towards_lockout() {
        let store = MemoryLoginAttemptStore::default();
        let account = Uuid::new_v4();
        let hash = hash_password("482913").unwrap();
        let live = || ResetCode::Live { hash: hash.clone() };

        for n in 1..=3 {
            assert_eq!(
                redeem_reset_code(&store, account, live(), "000000", T0).await.unwrap(),
                ResetOutcome::Refused(LoginOutcome::Rejected {
                    attempts: n,
                    remaining: 4 - n
                })
            );
        }
        assert_eq!(
            redeem_reset_code(&store, account, live(), " 482913 ", T0).await.unwrap(),
            ResetOutcome::Accepted
        );
        assert_eq!(store.current(account).await.unwrap().attempts, 0);
    }

    #[tokio::test]
    async fn locked_accounts_cannot_redeem_codes() {
        let store = MemoryLoginAttemptStore::default();
        let account = Uuid::new_v4();
        let hash = hash_password("482913").unwrap();
        for _ in 0..4 {
            store.record_failed_login(account, T0).await.unwrap();
        }

        let outcome = redeem_reset_code(
            &store,
            account,
            ResetCode::Live { hash },
            "482913",
            T0 + TimeDuration::seconds(10),
        )
        .await
        .unwrap();
        assert!(matches!(
            outcome,
            ResetOutcome::Refused(LoginOutcome::StillLocked { minutes: 1, .. })
        ));
    }

    #[tokio::test]
    async fn missing_or_expired_codes_do_not_count() {
        let store = MemoryLoginAttemptStore::default();
        let account = Uuid::new_v4();
        assert_eq!(
            redeem_reset_code(&store, account, ResetCode::Missing, "1", T0).await.unwrap(),
            ResetOutcome::NoCode
        );
        assert_eq!(
            redeem_reset_code(&store, account, ResetCode::Expired, "1", T0).await.unwrap(),
            ResetOutcome::Expired
        );
        assert_eq!(store.current(account).await.unwrap().attempts, 0);
    }
}
