//! Statistics API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::stats::{StatisticsReport, TimeWindow, build_report};

use crate::core::ServerState;
use crate::db::repository::order::{self, OrderFilter};
use crate::utils::{ApiResponse, AppResult, time};

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    /// today | week | month | custom
    pub range: Option<String>,
    /// YYYY-MM-DD, custom only
    pub start: Option<String>,
    pub end: Option<String>,
}

/// GET /api/statistics - dashboard aggregates and revenue series
pub async fn get_statistics(
    State(state): State<ServerState>,
    Query(query): Query<StatisticsQuery>,
) -> AppResult<Json<ApiResponse<StatisticsReport>>> {
    let window = TimeWindow::parse(
        query.range.as_deref(),
        query.start.as_deref(),
        query.end.as_deref(),
    )?;
    let now = time::now_in(state.tz);
    let (start, end) = window.bounds(&now);

    let headers = order::list_headers(
        state.pool(),
        OrderFilter {
            start: Some(start),
            end: Some(end),
            active_only: false,
        },
    )
    .await?;

    tracing::debug!(?window, orders = headers.len(), "Building statistics");
    Ok(Json(ApiResponse::success(build_report(&headers, window, &now))))
}
