//! Payment method catalog route

use axum::{Json, Router, routing::get};

use crate::core::ServerState;
use crate::utils::ApiResponse;
use shared::models::{PaymentMethod, PaymentMethodInfo};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payment-methods", get(list))
}

/// GET /api/payment-methods
pub async fn list() -> Json<ApiResponse<Vec<PaymentMethodInfo>>> {
    let methods = PaymentMethod::all().iter().map(PaymentMethodInfo::from).collect();
    Json(ApiResponse::success(methods))
}
