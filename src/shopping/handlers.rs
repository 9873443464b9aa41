use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{
    app::internal,
    auth::services::{current_user, AuthUser},
    inventory::dto::{InventoryItemResponse, ItemDetails},
    shopping::{
        dto::ConversionResponse,
        repo::ShoppingListItem,
        services::{conversion_for, move_to_pantry, TransferError},
    },
    state::AppState,
};

pub fn shopping_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/shopping-lists/:list_id/items/:item_id/conversion",
            get(conversion),
        )
        .route(
            "/shopping-lists/:list_id/items/:item_id/to-pantry",
            post(to_pantry),
        )
}

#[instrument(skip(state))]
pub async fn conversion(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((list_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ConversionResponse>, (StatusCode, String)> {
    let item = ShoppingListItem::find_owned(&state.db, user_id, list_id, item_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))?;
    Ok(Json(conversion_for(&item)))
}

#[instrument(skip(state, payload))]
pub async fn to_pantry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((list_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ItemDetails>,
) -> Result<(StatusCode, Json<InventoryItemResponse>), (StatusCode, String)> {
    let user = current_user(&state.db, user_id).await?;
    match move_to_pantry(&state.db, &user, list_id, item_id, &payload).await {
        Ok(item) => Ok((StatusCode::CREATED, Json(item.into()))),
        Err(TransferError::NotFound) => Err((StatusCode::NOT_FOUND, "Item not found".into())),
        Err(TransferError::Invalid(msg)) => {
            warn!(%user_id, msg, "transfer rejected");
            Err((StatusCode::BAD_REQUEST, msg.into()))
        }
        Err(TransferError::Db(e)) => {
            error!(error = %e, %user_id, "transfer failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
