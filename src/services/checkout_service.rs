use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    audit::log_audit,
    cart::{Cart, CartItem},
    dto::{
        cart::CartLine,
        orders::{CheckoutRequest, QuoteRequest, QuoteResponse},
    },
    error::{AppError, AppResult},
    gateway::NewOrder,
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    numbering,
    payment::settle,
    pricing::{EventDiscount, OrderDiscount, extract_vat, resolve_payable},
    state::AppState,
};

pub const WALK_IN_CUSTOMER: &str = "Walk-in";

// 9_999_999_999.99, the largest amount the NUMERIC(12, 2) money columns hold.
pub const MAX_ORDER_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

fn checked_line_total(line: &CartLine) -> AppResult<Decimal> {
    let rejected = |reason: &str| AppError::BadRequest(format!("item {}: {reason}", line.id));
    if line.unit_price < Decimal::ZERO {
        return Err(rejected("price must not be negative"));
    }
    let mut unit_price = line.unit_price;
    for modifier in &line.modifiers {
        let extra = modifier.price_contribution();
        if extra < Decimal::ZERO {
            return Err(rejected("extra price must not be negative"));
        }
        unit_price = unit_price
            .checked_add(extra)
            .ok_or_else(|| rejected("amount out of range"))?;
    }
    unit_price
        .checked_mul(Decimal::from(line.quantity))
        .filter(|total| *total <= MAX_ORDER_AMOUNT)
        .ok_or_else(|| rejected("amount out of range"))
}

pub(crate) fn freeze_lines(lines: Vec<CartLine>) -> AppResult<(Vec<OrderItem>, Decimal)> {
    let mut running = Decimal::ZERO;
    for line in lines.iter().filter(|line| line.quantity > 0) {
        running = running
            .checked_add(checked_line_total(line)?)
            .filter(|total| *total <= MAX_ORDER_AMOUNT)
            .ok_or_else(|| AppError::BadRequest("order total out of range".into()))?;
    }

    let cart = Cart::from_items(lines.into_iter().map(CartItem::from));
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }
    let items = cart.freeze_items();
    let subtotal = items.iter().map(|item| item.total_price).sum();
    Ok((items, subtotal))
}

fn validated(discount: Option<OrderDiscount>) -> AppResult<Option<OrderDiscount>> {
    if let Some(discount) = &discount {
        discount.validate()?;
    }
    Ok(discount)
}

/// Totals for the payment screen; nothing is persisted.
pub fn quote(
    state: &AppState,
    payload: QuoteRequest,
    event_discount: Option<&EventDiscount>,
) -> AppResult<QuoteResponse> {
    let discount = validated(payload.discount)?;
    let (items, subtotal) = freeze_lines(payload.items)?;
    let totals = resolve_payable(subtotal, discount.as_ref(), event_discount);

    Ok(QuoteResponse {
        item_count: items.iter().map(|item| i64::from(item.quantity)).sum(),
        totals,
        vat: extract_vat(totals.payable, state.settings.vat_rate),
        event_discount_name: event_discount
            .filter(|event| event.is_active)
            .map(|event| event.event_name.clone()),
    })
}

/// Places an order from the submitted cart. The event discount is whatever
/// was active when the caller read it; it is frozen onto the order.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
    event_discount: Option<&EventDiscount>,
) -> AppResult<Order> {
    let discount = validated(payload.discount)?;
    let (items, subtotal) = freeze_lines(payload.items)?;
    let totals = resolve_payable(subtotal, discount.as_ref(), event_discount);
    let settlement = settle(totals.payable, &payload.payment)?;

    let serial_day = state
        .settings
        .daily_serial_enabled
        .then(|| Utc::now().date_naive());
    let numbers = numbering::assign(state.orders.as_ref(), serial_day).await?;

    let customer_name = payload
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(WALK_IN_CUSTOMER)
        .to_string();
    let event = event_discount.filter(|event| event.is_active);

    let order = state
        .orders
        .insert_order(NewOrder {
            order_number: numbers.order_number,
            daily_serial: numbers.daily_serial,
            customer_id: payload.customer_id,
            customer_name,
            items,
            subtotal,
            total_amount: totals.payable,
            settlement,
            discount_type: discount.map(|d| d.kind()),
            discount_value: discount.map(|d| d.value()),
            discount_amount: totals.discount_amount,
            event_discount_name: event.map(|e| e.event_name.clone()),
            event_discount_percentage: event.map(|e| e.percentage),
            event_discount_amount: totals.event_discount_amount,
            vat_amount: extract_vat(totals.payable, state.settings.vat_rate).vat,
            created_by: user.user_id,
        })
        .await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = %order.total_amount,
        method = order.payment_method.as_str(),
        "order placed"
    );

    if let Some(customer_id) = order.customer_id {
        if let Err(err) = state
            .customers
            .record_purchase(customer_id, order.total_amount, &order.order_number)
            .await
        {
            tracing::warn!(
                error = %err,
                customer_id = %customer_id,
                order_id = %order.id,
                "customer totals not updated"
            );
        }
    }

    log_audit(
        state.audit.as_ref(),
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "order_number": order.order_number,
        })),
    )
    .await;

    Ok(order)
}
