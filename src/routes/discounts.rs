use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::discounts::{ActivateEventDiscountRequest, EventDiscountStatus},
    error::AppResult,
    middleware::auth::AuthUser,
    pricing::EventDiscount,
    response::ApiResponse,
    services::discount_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/event",
        get(event_discount)
            .put(activate_event_discount)
            .delete(deactivate_event_discount),
    )
}

#[utoipa::path(
    get,
    path = "/api/discounts/event",
    responses(
        (status = 200, description = "Current event discount", body = ApiResponse<EventDiscountStatus>),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn event_discount(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<EventDiscountStatus>>> {
    let current = discount_service::current(&state).await?;
    Ok(Json(ApiResponse::ok("OK", current.into())))
}

#[utoipa::path(
    put,
    path = "/api/discounts/event",
    request_body = ActivateEventDiscountRequest,
    responses(
        (status = 200, description = "Event discount activated", body = ApiResponse<EventDiscount>),
        (status = 400, description = "Invalid discount configuration"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn activate_event_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ActivateEventDiscountRequest>,
) -> AppResult<Json<ApiResponse<EventDiscount>>> {
    let discount = discount_service::activate(&state, &user, payload).await?;
    Ok(Json(ApiResponse::ok("Event discount activated", discount)))
}

#[utoipa::path(
    delete,
    path = "/api/discounts/event",
    responses(
        (status = 200, description = "Event discount deactivated", body = ApiResponse<EventDiscountStatus>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn deactivate_event_discount(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<EventDiscountStatus>>> {
    let discount = discount_service::deactivate(&state, &user).await?;
    Ok(Json(ApiResponse::ok("Event discount deactivated", discount.into())))
}
