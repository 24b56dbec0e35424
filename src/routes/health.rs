use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{response::ApiResponse, state::AppState};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    /// Whether the order store answered a read.
    pub orders_store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
        tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let orders_store = match state.orders.last_order_number().await {
        Ok(_) => "ok",
        Err(err) => {
            tracing::warn!(error = %err, "order store unreachable");
            "unavailable"
        }
    };

    let data = HealthData {
        status: "ok".to_string(),
        orders_store: orders_store.to_string(),
    };

    Json(ApiResponse::ok("Health check", data))
}
