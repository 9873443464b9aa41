use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    app::internal,
    auth::{
        repo::{Household, User},
        services::{current_user, AuthUser},
    },
    nutrition::meal_target,
    profile::{
        dto::{ProfileResponse, UpdateProfileRequest},
        services::{body_profile, merge_update},
    },
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me/profile", put(update_profile))
}

async fn profile_response(state: &AppState, user: User) -> Result<ProfileResponse, (StatusCode, String)> {
    let household = match user.household_id {
        Some(id) => Household::find_by_id(&state.db, id).await.map_err(internal)?,
        None => None,
    };
    let target = meal_target(&body_profile(&user)).ok();
    Ok(ProfileResponse::new(user, household, target))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let user = current_user(&state.db, user_id).await?;
    Ok(Json(profile_response(&state, user).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let user = current_user(&state.db, user_id).await?;
    let update = merge_update(&user, &payload).map_err(|msg| {
        warn!(%user_id, msg, "profile update rejected");
        (StatusCode::BAD_REQUEST, msg.to_string())
    })?;
    User::update_profile(&state.db, user_id, &update)
        .await
        .map_err(internal)?;
    info!(%user_id, activity = update.activity_level, "profile updated");

    let user = current_user(&state.db, user_id).await?;
    Ok(Json(profile_response(&state, user).await?))
}
