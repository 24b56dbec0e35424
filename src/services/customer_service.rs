use crate::{
    audit::log_audit,
    dto::customers::UpsertCustomerRequest,
    error::{AppError, AppResult},
    gateway::NewCustomer,
    middleware::auth::AuthUser,
    models::Customer,
    state::AppState,
};

pub async fn lookup_by_phone(state: &AppState, phone: &str) -> AppResult<Customer> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(AppError::BadRequest("phone is required".into()));
    }
    state
        .customers
        .find_by_phone(phone)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn register_customer(
    state: &AppState,
    user: &AuthUser,
    payload: UpsertCustomerRequest,
) -> AppResult<Customer> {
    let phone = payload.phone.trim().to_string();
    let name = payload.name.trim().to_string();
    if phone.is_empty() || name.is_empty() {
        return Err(AppError::BadRequest("phone and name are required".into()));
    }
    let address = payload
        .address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let customer = state
        .customers
        .upsert(NewCustomer {
            phone,
            name,
            address,
        })
        .await?;

    log_audit(
        state.audit.as_ref(),
        Some(user.user_id),
        "customer_saved",
        Some("customers"),
        Some(serde_json::json!({ "customer_id": customer.id })),
    )
    .await;

    Ok(customer)
}
