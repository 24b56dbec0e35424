use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::customers::{CustomerLookupQuery, UpsertCustomerRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Customer,
    response::ApiResponse,
    services::customer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(lookup_customer).post(save_customer))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    params(CustomerLookupQuery),
    responses(
        (status = 200, description = "Customer with this phone number", body = ApiResponse<Customer>),
        (status = 404, description = "No customer with this phone number"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customers"
)]
pub async fn lookup_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<CustomerLookupQuery>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let customer = customer_service::lookup_by_phone(&state, &query.phone).await?;
    Ok(Json(ApiResponse::ok("OK", customer)))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = UpsertCustomerRequest,
    responses(
        (status = 200, description = "Customer created or updated", body = ApiResponse<Customer>),
        (status = 400, description = "Phone and name are required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customers"
)]
pub async fn save_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpsertCustomerRequest>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let customer = customer_service::register_customer(&state, &user, payload).await?;
    Ok(Json(ApiResponse::ok("Customer saved", customer)))
}
