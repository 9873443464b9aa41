use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    app::internal,
    auth::services::{current_user, AuthUser},
    inventory::services::{current_pantry, today_utc, PantryScope},
    profile::services::target_or_default,
    recipes::{
        client::RecipeSearchError,
        dto::{RecipeSuggestion, SuggestRecipeRequest},
        services::{suggest, SuggestError},
    },
    state::AppState,
};

const NO_RECIPES: &str = "No recipes found, try a different pantry or strategy.";

pub fn recipe_routes() -> Router<AppState> {
    Router::new().route("/recipes/suggest", post(suggest_recipe))
}

fn rejection(e: SuggestError) -> (StatusCode, String) {
    match e {
        SuggestError::EmptyPantry => (
            StatusCode::BAD_REQUEST,
            "Your pantry is empty. Add some items first.".into(),
        ),
        SuggestError::NoRecipes => (StatusCode::NOT_FOUND, NO_RECIPES.into()),
        SuggestError::Search(RecipeSearchError::NotConfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Recipe search is not configured".into(),
        ),
        SuggestError::Search(_) => (StatusCode::BAD_GATEWAY, NO_RECIPES.into()),
    }
}

#[instrument(skip(state, payload))]
pub async fn suggest_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SuggestRecipeRequest>,
) -> Result<Json<RecipeSuggestion>, (StatusCode, String)> {
    let user = current_user(&state.db, user_id).await?;
    let target = target_or_default(&user);
    let pantry = current_pantry(&state.db, PantryScope::of(&user), today_utc())
        .await
        .map_err(internal)?;

    let suggestion = suggest(state.recipes.as_ref(), &user, payload.strategy, target, &pantry)
        .await
        .map_err(|e| {
            warn!(%user_id, error = %e, "no suggestion");
            rejection(e)
        })?;

    info!(%user_id, recipe_id = suggestion.id, used = suggestion.used_count, missing = suggestion.missing_count, "recipe suggested");
    Ok(Json(suggestion))
}
