//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::{RepoError, menu};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_URL_LEN, validate_optional_text, validate_price, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};

const RESOURCE: &str = "menu";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub available: bool,
}

fn menu_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::MenuItemNotFound).with_detail("menu_id", id)
}

/// GET /api/menus - list menu items, newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<MenuItem>>>> {
    let items = menu::find_all(state.pool(), query.available).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// GET /api/menus/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let item = menu::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| menu_not_found(id))?;
    Ok(Json(ApiResponse::success(item)))
}

/// POST /api/menus - create menu item
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_price(payload.price)?;
    validate_optional_text(&payload.category, "category", MAX_NAME_LEN)?;
    validate_optional_text(&payload.image_url, "image_url", MAX_URL_LEN)?;

    let item = menu::create(state.pool(), payload).await?;
    tracing::info!(menu_id = item.id, name = %item.name, "Menu item created");

    let id = item.id.to_string();
    state
        .broadcast_sync(RESOURCE, "created", &id, Some(&item))
        .await;

    Ok(Json(ApiResponse::success(item)))
}

/// PUT /api/menus/:id - partial update
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    validate_optional_text(&payload.category, "category", MAX_NAME_LEN)?;
    validate_optional_text(&payload.image_url, "image_url", MAX_URL_LEN)?;

    let item = menu::update(state.pool(), id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => menu_not_found(id),
            other => other.into(),
        })?;

    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&item))
        .await;

    Ok(Json(ApiResponse::success(item)))
}

/// POST /api/menus/:id/availability - flip availability
pub async fn toggle_availability(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let item = menu::toggle_availability(state.pool(), id)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => menu_not_found(id),
            other => other.into(),
        })?;
    tracing::info!(menu_id = id, available = item.is_available, "Menu availability toggled");

    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&item))
        .await;

    Ok(Json(ApiResponse::success(item)))
}

/// DELETE /api/menus/:id
///
/// Past orders keep their name and price snapshot.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<bool>>> {
    if !menu::delete(state.pool(), id).await? {
        return Err(menu_not_found(id));
    }
    tracing::info!(menu_id = id, "Menu item deleted");

    state
        .broadcast_sync::<()>(RESOURCE, "deleted", &id.to_string(), None)
        .await;

    Ok(Json(ApiResponse::success(true)))
}
