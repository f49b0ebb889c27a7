//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{OrderDetail, OrderSubmission, StatusUpdate};
use shared::stats::TimeWindow;

use crate::core::ServerState;
use crate::db::repository::order::{self, OrderFilter};
use crate::orders;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, time};

/// `GET /api/orders` query
///
/// Without `range` every order is returned.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// Hide completed orders (kitchen view)
    #[serde(default)]
    pub active: bool,
}

/// POST /api/orders - submit a checkout
pub async fn submit(
    State(state): State<ServerState>,
    Json(payload): Json<OrderSubmission>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = orders::submit(&state, payload).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// GET /api/orders - orders with items, newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderDetail>>>> {
    let mut filter = OrderFilter {
        active_only: query.active,
        ..Default::default()
    };
    if query.range.is_some() {
        let window = TimeWindow::parse(
            query.range.as_deref(),
            query.start.as_deref(),
            query.end.as_deref(),
        )?;
        let (start, end) = window.bounds(&time::now_in(state.tz));
        filter.start = Some(start);
        filter.end = Some(end);
    }

    let orders = order::list(state.pool(), filter).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /api/orders/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = order::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id))?;
    Ok(Json(ApiResponse::success(detail)))
}

/// PATCH /api/orders/:id/status - `{ "from": "pending", "to": "cooking" }`
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = orders::transition(&state, id, payload).await?;
    Ok(Json(ApiResponse::success(detail)))
}
