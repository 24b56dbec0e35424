use chrono::Utc;

use crate::{
    audit::log_audit,
    dto::discounts::ActivateEventDiscountRequest,
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    pricing::EventDiscount,
    state::AppState,
};

pub async fn current(state: &AppState) -> AppResult<Option<EventDiscount>> {
    state.event_discounts.current().await
}

pub async fn active(state: &AppState) -> AppResult<Option<EventDiscount>> {
    Ok(current(state).await?.filter(|discount| discount.is_active))
}

pub async fn activate(
    state: &AppState,
    user: &AuthUser,
    payload: ActivateEventDiscountRequest,
) -> AppResult<EventDiscount> {
    ensure_admin(user)?;
    let discount = EventDiscount::activate(
        &payload.event_name,
        payload.percentage,
        user.user_id,
        Utc::now(),
    )?;
    state.event_discounts.save(&discount).await?;

    tracing::info!(
        event_name = %discount.event_name,
        percentage = %discount.percentage,
        "event discount activated"
    );
    log_audit(
        state.audit.as_ref(),
        Some(user.user_id),
        "event_discount_activated",
        Some("event_discount"),
        Some(serde_json::json!({
            "event_name": discount.event_name,
            "percentage": discount.percentage,
        })),
    )
    .await;

    Ok(discount)
}

/// Turns the event discount off. Deactivating when none is active is a no-op.
pub async fn deactivate(state: &AppState, user: &AuthUser) -> AppResult<Option<EventDiscount>> {
    ensure_admin(user)?;
    let Some(mut discount) = active(state).await? else {
        return Ok(None);
    };
    discount.deactivate();
    state.event_discounts.save(&discount).await?;

    tracing::info!(event_name = %discount.event_name, "event discount deactivated");
    log_audit(
        state.audit.as_ref(),
        Some(user.user_id),
        "event_discount_deactivated",
        Some("event_discount"),
        Some(serde_json::json!({ "event_name": discount.event_name })),
    )
    .await;

    Ok(Some(discount))
}
