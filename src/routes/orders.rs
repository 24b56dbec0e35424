use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CancelOrderRequest, CancelOrderResponse, CheckoutRequest, ModifyOrderRequest,
        ModifyOrderResponse, OrderHistory, OrderList, QuoteRequest, QuoteResponse,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{checkout_service, discount_service, order_mutation_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/quote", post(quote))
        .route("/checkout", post(checkout))
        .route("/{id}", get(get_order))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/cancel/retry", post(retry_cancel))
        .route("/{id}/modify", post(modify_order))
        .route("/{id}/history", get(order_history))
}

#[utoipa::path(
    post,
    path = "/api/orders/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Totals for the submitted cart", body = ApiResponse<QuoteResponse>),
        (status = 400, description = "Empty cart or invalid discount"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn quote(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<Json<ApiResponse<QuoteResponse>>> {
    let event = discount_service::active(&state).await?;
    let quote = checkout_service::quote(&state, payload, event.as_ref())?;
    Ok(Json(ApiResponse::ok("OK", quote)))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<Order>),
        (status = 400, description = "Empty cart, invalid discount or payment"),
        (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let event = discount_service::active(&state).await?;
    let order = checkout_service::checkout(&state, &user, payload, event.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Checkout success", order)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders, newest first", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let (orders, meta) = order_service::list_orders(&state, query).await?;
    Ok(Json(ApiResponse::with_meta("Ok", orders, meta)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = order_service::get_order(&state, id).await?;
    Ok(Json(ApiResponse::ok("OK", order)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order canceled", body = ApiResponse<CancelOrderResponse>),
        (status = 400, description = "Order is already canceled"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Cancellation recorded but order not updated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelOrderRequest>>,
) -> AppResult<Json<ApiResponse<CancelOrderResponse>>> {
    let reason = payload.and_then(|Json(request)| request.reason);
    let outcome = order_mutation_service::cancel_order(&state, id, user.user_id, reason).await?;
    Ok(Json(ApiResponse::ok("Order canceled", outcome.into())))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel/retry",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Cancellation reconciled", body = ApiResponse<CancelOrderResponse>),
        (status = 400, description = "No cancellation record to reconcile"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn retry_cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CancelOrderResponse>>> {
    ensure_admin(&user)?;
    let outcome = order_mutation_service::retry_cancel_status(&state, id).await?;
    Ok(Json(ApiResponse::ok("Cancellation reconciled", outcome.into())))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/modify",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ModifyOrderRequest,
    responses(
        (status = 200, description = "Order modified, or canceled when every item was removed", body = ApiResponse<ModifyOrderResponse>),
        (status = 400, description = "Order is canceled or the new payment is invalid"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Modification recorded but order not updated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn modify_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModifyOrderRequest>,
) -> AppResult<Json<ApiResponse<ModifyOrderResponse>>> {
    let outcome = order_mutation_service::modify_order(&state, id, user.user_id, payload).await?;
    Ok(Json(ApiResponse::ok("Order updated", outcome.into())))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/history",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Cancel and modify snapshots", body = ApiResponse<OrderHistory>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_history(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderHistory>>> {
    let history = order_service::order_history(&state, id).await?;
    Ok(Json(ApiResponse::ok("OK", history)))
}
