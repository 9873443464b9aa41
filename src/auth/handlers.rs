use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    app::internal,
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, HouseholdChoice, LoginRequest, MessageResponse,
            PublicUser, RefreshRequest, RegisterRequest, ResetPasswordRequest,
        },
        email::{reset_code_message, EmailError},
        lockout::lockout_for,
        repo::{Household, NewUser, User},
        services::{
            attempt_login, check_password_policy, check_username, generate_join_code,
            generate_reset_code, hash_password, is_valid_email, redeem_reset_code, verify_password,
            JwtKeys, LoginOutcome, ResetCode, ResetOutcome, RESET_CODE_TTL,
        },
    },
    nutrition::ActivityLevel,
    profile::services::{normalize_allergies, normalize_diet},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh_token = keys.sign_refresh(user.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
            household_id: user.household_id,
        },
    })
}

fn plural(n: i64, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn locked_out_message(attempts: i32) -> String {
    match lockout_for(attempts) {
        Some(d) => format!(
            "Account locked due to multiple failures. Try again in {}.",
            plural(d.whole_minutes(), "minute")
        ),
        None => "Account locked due to multiple failures.".into(),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if let Err(msg) = check_username(&payload.username) {
        warn!(username = %payload.username, "username rejected");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if let Err(msg) = check_password_policy(&payload.password) {
        warn!("password rejected by policy");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }
    let metrics_ok = payload.age > 0
        && payload.height.is_finite()
        && payload.height > 0.0
        && payload.weight.is_finite()
        && payload.weight > 0.0;
    if !metrics_ok {
        return Err((
            StatusCode::BAD_REQUEST,
            "Age, height and weight must be positive".into(),
        ));
    }

    if User::exists(&state.db, &payload.email, &payload.username)
        .await
        .map_err(internal)?
    {
        warn!(email = %payload.email, "email or username already registered");
        return Err((StatusCode::CONFLICT, "User already exists".into()));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let allergies = normalize_allergies(&payload.allergies);
    let dietary_preference = normalize_diet(payload.dietary_preference.as_deref());
    let workout_days = payload.workout_days.min(7);
    let new_user = NewUser {
        username: &payload.username,
        email: &payload.email,
        password_hash: &hash,
        age: payload.age,
        height_cm: payload.height,
        weight_kg: payload.weight,
        gender: payload.gender.as_str(),
        workout_days: workout_days as i32,
        activity_level: ActivityLevel::from_workout_days(workout_days).as_str(),
        allergies: &allergies,
        dietary_preference: &dietary_preference,
    };

    let mut tx = state.db.begin().await.map_err(internal)?;

    let joined = match &payload.household {
        HouseholdChoice::Join { join_code } => {
            match Household::find_by_join_code(&mut tx, join_code)
                .await
                .map_err(internal)?
            {
                Some(h) => Some(h.id),
                None => {
                    warn!(%join_code, "unknown join code");
                    return Err((StatusCode::NOT_FOUND, "Invalid join code".into()));
                }
            }
        }
        HouseholdChoice::Create { .. } => None,
    };

    let mut user = User::create_tx(&mut tx, &new_user, joined)
        .await
        .map_err(internal)?;

    if let HouseholdChoice::Create { name } = &payload.household {
        let name = name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}'s Pantry", user.username));
        let household = Household::create_tx(&mut tx, &name, &generate_join_code(), user.id)
            .await
            .map_err(internal)?;
        User::set_household_tx(&mut tx, user.id, household.id)
            .await
            .map_err(internal)?;
        user.household_id = Some(household.id);
    }

    tx.commit().await.map_err(internal)?;

    info!(user_id = %user.id, household_id = ?user.household_id, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let login = payload.login.trim();

    let user = match User::find_by_login(&state.db, login).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("login unknown account");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_login failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let outcome = attempt_login(
        state.attempts.as_ref(),
        user.id,
        OffsetDateTime::now_utc(),
        || verify_password(&payload.password, &user.password_hash),
    )
    .await
    .map_err(internal)?;

    match outcome {
        LoginOutcome::Authenticated => {
            info!(user_id = %user.id, "user logged in");
            Ok(Json(issue_tokens(&state, user)?))
        }
        LoginOutcome::StillLocked { minutes, .. } => Err((
            StatusCode::TOO_MANY_REQUESTS,
            format!(
                "Too many failed attempts. Account locked. Try again in {}.",
                plural(minutes, "minute")
            ),
        )),
        LoginOutcome::LockedOut { attempts, .. } => Err((
            StatusCode::TOO_MANY_REQUESTS,
            locked_out_message(attempts),
        )),
        LoginOutcome::Rejected { attempts, remaining } => {
            warn!(user_id = %user.id, attempts, "login invalid password");
            Err((
                StatusCode::UNAUTHORIZED,
                format!(
                    "Invalid credentials. {} remaining before lockout.",
                    plural(remaining as i64, "attempt")
                ),
            ))
        }
    }
}

fn message(msg: &str) -> Json<MessageResponse> {
    Json(MessageResponse { msg: msg.into() })
}

fn invalid_code() -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, "Invalid Code".into())
}

/// Mails a reset code. Unknown addresses get the same answer as known ones.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let Some(user) = User::find_by_login(&state.db, &email)
        .await
        .map_err(internal)?
    else {
        warn!("password reset for unknown email");
        return Ok(message("Reset code sent to email"));
    };

    let code = generate_reset_code();
    let code_hash = hash_password(&code).map_err(internal)?;
    let expires = OffsetDateTime::now_utc() + RESET_CODE_TTL;
    User::set_reset_code(&state.db, user.id, &code_hash, expires)
        .await
        .map_err(internal)?;

    match state.email.send(&reset_code_message(&user.email, &code)).await {
        Ok(()) => {
            info!(user_id = %user.id, "reset code sent");
            Ok(message("Reset code sent to email"))
        }
        Err(EmailError::NotConfigured) => {
            error!("password reset requested but email is not configured");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                "Email delivery is unavailable".into(),
            ))
        }
        Err(e) => {
            error!(error = %e, user_id = %user.id, "reset email failed");
            Err((StatusCode::BAD_GATEWAY, "Email could not be sent".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if let Err(msg) = check_password_policy(&payload.new_password) {
        warn!("new password rejected by policy");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let user = User::find_by_login(&state.db, &email)
        .await
        .map_err(internal)?
        .ok_or_else(invalid_code)?;

    let now = OffsetDateTime::now_utc();
    let (hash, expires) = User::reset_code(&state.db, user.id)
        .await
        .map_err(internal)?;
    let stored = ResetCode::of(hash, expires, now);

    match redeem_reset_code(state.attempts.as_ref(), user.id, stored, &payload.code, now)
        .await
        .map_err(internal)?
    {
        ResetOutcome::Accepted => {
            let hash = hash_password(&payload.new_password).map_err(internal)?;
            User::reset_password(&state.db, user.id, &hash)
                .await
                .map_err(internal)?;
            info!(user_id = %user.id, "password reset");
            Ok(message("Password updated successfully"))
        }
        ResetOutcome::NoCode => Err(invalid_code()),
        ResetOutcome::Expired => Err((StatusCode::BAD_REQUEST, "Code Expired".into())),
        ResetOutcome::Refused(LoginOutcome::Rejected { attempts, .. }) => {
            warn!(user_id = %user.id, attempts, "wrong reset code");
            Err(invalid_code())
        }
        ResetOutcome::Refused(LoginOutcome::LockedOut { attempts, .. }) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            locked_out_message(attempts),
        )),
        ResetOutcome::Refused(LoginOutcome::StillLocked { minutes, .. }) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            format!(
                "Too many failed attempts. Account locked. Try again in {}.",
                plural(minutes, "minute")
            ),
        )),
        ResetOutcome::Refused(LoginOutcome::Authenticated) => Err(internal(anyhow::anyhow!(
            "reset code accepted but not redeemed"
        ))),
    }
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, format!("{}", e)))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(issue_tokens(&state, user)?))
}
