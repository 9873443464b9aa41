use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app::internal,
    auth::services::{current_user, AuthUser},
    inventory::{
        dto::{InventoryItemResponse, NewItemRequest},
        repo::InventoryItem,
        services::{current_pantry, today_utc, validate_item, PantryScope},
    },
    state::AppState,
};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory).post(add_item))
        .route("/inventory/:id", delete(delete_item))
}

#[instrument(skip(state))]
pub async fn list_inventory(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<InventoryItemResponse>>, (StatusCode, String)> {
    let user = current_user(&state.db, user_id).await?;
    let items = current_pantry(&state.db, PantryScope::of(&user), today_utc())
        .await
        .map_err(internal)?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NewItemRequest>,
) -> Result<(StatusCode, Json<InventoryItemResponse>), (StatusCode, String)> {
    let user = current_user(&state.db, user_id).await?;
    let new = validate_item(&user, &payload.name, &payload.details).map_err(|msg| {
        warn!(%user_id, msg, "inventory item rejected");
        (StatusCode::BAD_REQUEST, msg.to_string())
    })?;
    let item = InventoryItem::insert(&state.db, &new)
        .await
        .map_err(internal)?;
    info!(%user_id, item_id = %item.id, "inventory item added");
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = current_user(&state.db, user_id).await?;
    if InventoryItem::delete(&state.db, PantryScope::of(&user), id)
        .await
        .map_err(internal)?
    {
        info!(%user_id, item_id = %id, "inventory item deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Item not found".into()))
    }
}
