use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::ModifyOrderRequest,
    error::{AppError, AppResult},
    gateway::{NewCanceledOrder, NewModifiedOrder, OrderChanges},
    models::{CanceledOrder, ModificationType, ModifiedOrder, Order, OrderStatus, PaymentMethod},
    money::approx_eq,
    payment::{PaymentRequest, Settlement, settle},
    pricing::{OrderDiscount, extract_vat, resolve_with_event_rate},
    services::checkout_service::freeze_lines,
    state::AppState,
};

pub const ALL_ITEMS_REMOVED_REASON: &str = "All items removed from order";

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub order: Order,
    pub record: CanceledOrder,
}

#[derive(Debug, Clone)]
pub enum ModifyOutcome {
    Modified { order: Order, record: ModifiedOrder },
    Canceled(CancelOutcome),
}

async fn load_order(state: &AppState, order_id: Uuid) -> AppResult<Order> {
    state
        .orders
        .get_order_by_id(order_id)
        .await?
        .ok_or(AppError::OrderNotFound(order_id))
}

fn ensure_transition(order: &Order, next: OrderStatus) -> AppResult<()> {
    if order.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::InvalidStatusTransition {
            from: order.status.as_str(),
            to: next.as_str(),
        })
    }
}

async fn write_live_row(
    state: &AppState,
    order_id: Uuid,
    audit_id: Uuid,
    changes: OrderChanges,
) -> AppResult<Order> {
    state
        .orders
        .update_order(order_id, changes)
        .await
        .map_err(|err| {
            tracing::error!(
                target: "pos::reconcile",
                order_id = %order_id,
                audit_id = %audit_id,
                error = %err,
                "audit record written but order row not updated"
            );
            AppError::PartialFailure { order_id, audit_id }
        })
}

pub async fn cancel_order(
    state: &AppState,
    order_id: Uuid,
    canceled_by: Uuid,
    reason: Option<String>,
) -> AppResult<CancelOutcome> {
    let order = load_order(state, order_id).await?;
    ensure_transition(&order, OrderStatus::Canceled)?;

    // A record without the status flip is left over from a failed cancel.
    let existing = state.orders.list_canceled_for(order_id).await?;
    if let Some(record) = existing.into_iter().last() {
        tracing::warn!(
            target: "pos::reconcile",
            order_id = %order_id,
            audit_id = %record.id,
            "order already has a cancellation record, updating status only"
        );
        let order =
            write_live_row(state, order_id, record.id, OrderChanges::status(OrderStatus::Canceled))
                .await?;
        return Ok(CancelOutcome { order, record });
    }

    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let record = state
        .orders
        .insert_canceled_order(NewCanceledOrder {
            original_order_id: order_id,
            canceled_by,
            reason,
            order_data: order,
        })
        .await?;

    let order =
        write_live_row(state, order_id, record.id, OrderChanges::status(OrderStatus::Canceled))
            .await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        audit_id = %record.id,
        "order canceled"
    );

    log_audit(
        state.audit.as_ref(),
        Some(canceled_by),
        "order_canceled",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "canceled_order_id": record.id,
            "reason": record.reason,
        })),
    )
    .await;

    Ok(CancelOutcome { order, record })
}

/// Re-issues the status update for an order whose cancellation record was
/// written but whose row was not flipped to canceled.
pub async fn retry_cancel_status(state: &AppState, order_id: Uuid) -> AppResult<CancelOutcome> {
    let order = load_order(state, order_id).await?;
    let record = state
        .orders
        .list_canceled_for(order_id)
        .await?
        .into_iter()
        .last()
        .ok_or_else(|| {
            AppError::BadRequest(format!("order {order_id} has no cancellation to reconcile"))
        })?;

    if order.status == OrderStatus::Canceled {
        return Ok(CancelOutcome { order, record });
    }

    let order =
        write_live_row(state, order_id, record.id, OrderChanges::status(OrderStatus::Canceled))
            .await?;
    tracing::info!(order_id = %order.id, audit_id = %record.id, "cancellation reconciled");
    Ok(CancelOutcome { order, record })
}

pub async fn modify_order(
    state: &AppState,
    order_id: Uuid,
    modified_by: Uuid,
    request: ModifyOrderRequest,
) -> AppResult<ModifyOutcome> {
    let original = load_order(state, order_id).await?;
    ensure_transition(&original, OrderStatus::Modified)?;

    let removes_everything = request
        .items
        .as_ref()
        .is_some_and(|lines| lines.iter().all(|line| line.quantity <= 0));
    if removes_everything {
        let outcome = cancel_order(
            state,
            order_id,
            modified_by,
            Some(ALL_ITEMS_REMOVED_REASON.to_string()),
        )
        .await?;
        return Ok(ModifyOutcome::Canceled(outcome));
    }

    let requested_type = request.modification_type;
    let updated = apply_modification(&original, request, state.settings.vat_rate)?;
    let modification_type =
        requested_type.unwrap_or_else(|| infer_modification_type(&original, &updated));

    let record = state
        .orders
        .insert_modified_order(NewModifiedOrder {
            original_order_id: order_id,
            modified_by,
            modification_type,
            original_data: original,
            new_data: updated.clone(),
        })
        .await?;

    let order =
        write_live_row(state, order_id, record.id, OrderChanges::from_snapshot(&updated)).await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        audit_id = %record.id,
        modification_type = modification_type.as_str(),
        total = %order.total_amount,
        "order modified"
    );

    log_audit(
        state.audit.as_ref(),
        Some(modified_by),
        "order_modified",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "modified_order_id": record.id,
            "modification_type": modification_type.as_str(),
        })),
    )
    .await;

    Ok(ModifyOutcome::Modified { order, record })
}

/// Builds the post-edit snapshot. Totals are recomputed from the items using
/// the discounts frozen on the order at checkout.
pub fn apply_modification(
    original: &Order,
    request: ModifyOrderRequest,
    vat_rate: Decimal,
) -> AppResult<Order> {
    let mut updated = original.clone();

    if let Some(name) = request
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        updated.customer_name = name.to_string();
    }

    if let Some(lines) = request.items {
        let (items, _) = freeze_lines(lines)?;
        updated.items = items;
    }
    let subtotal = updated.items_total();

    let discount = original
        .discount_type
        .zip(original.discount_value)
        .map(|(kind, value)| OrderDiscount::from_parts(kind, value));
    let totals =
        resolve_with_event_rate(subtotal, discount.as_ref(), original.event_discount_percentage);

    let settlement = match request.payment {
        Some(payment) => settle(totals.payable, &payment)?,
        None => resettle(original, totals.payable)?,
    };

    updated.subtotal = subtotal;
    updated.discount_amount = totals.discount_amount;
    updated.event_discount_amount = totals.event_discount_amount;
    updated.total_amount = totals.payable;
    updated.vat_amount = extract_vat(totals.payable, vat_rate).vat;
    updated.payment_method = settlement.method;
    updated.cash_amount = settlement.cash_amount;
    updated.card_amount = settlement.card_amount;
    updated.cash_received = settlement.cash_received;
    updated.change_amount = settlement.change_amount;
    updated.status = OrderStatus::Modified;
    updated.updated_at = Utc::now();

    Ok(updated)
}

/// Keeps the original tender when the total did not move. A mixed split
/// cannot be carried over to a new total and must be re-entered.
fn resettle(original: &Order, payable: Decimal) -> AppResult<Settlement> {
    if approx_eq(payable, original.total_amount) {
        return Ok(Settlement {
            method: original.payment_method,
            cash_amount: original.cash_amount,
            card_amount: original.card_amount,
            cash_received: original.cash_received,
            change_amount: original.change_amount,
        });
    }
    match original.payment_method {
        PaymentMethod::Cash => settle(payable, &PaymentRequest::cash()),
        PaymentMethod::Card => settle(payable, &PaymentRequest::card()),
        PaymentMethod::Mixed => Err(AppError::PaymentSplitMismatch),
    }
}

/// Classifies an edit. More than one of payment method, line count and
/// line quantities changing is `MultipleChanges`.
pub fn infer_modification_type(original: &Order, updated: &Order) -> ModificationType {
    let payment_changed = original.payment_method != updated.payment_method;
    let count_changed = original.items.len() != updated.items.len();
    let quantities_changed = original.items.iter().any(|before| {
        updated
            .items
            .iter()
            .find(|after| after.id == before.id)
            .is_some_and(|after| after.quantity != before.quantity)
    });

    let changed = [payment_changed, count_changed, quantities_changed]
        .into_iter()
        .filter(|flag| *flag)
        .count();
    if changed > 1 {
        return ModificationType::MultipleChanges;
    }

    if count_changed {
        if updated.items.len() > original.items.len() {
            ModificationType::ItemAdded
        } else {
            ModificationType::ItemRemoved
        }
    } else if quantities_changed {
        ModificationType::QuantityChanged
    } else if original.items != updated.items {
        ModificationType::ItemReplaced
    } else {
        ModificationType::MultipleChanges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dto::cart::CartLine, gateway::NewOrder, models::MenuCategory, pricing::DiscountKind};
    use rust_decimal_macros::dec;

    fn line(id: &str, price: Decimal, quantity: i32) -> CartLine {
        CartLine {
            id: id.into(),
            name: id.into(),
            name_ar: None,
            description: None,
            unit_price: price,
            quantity,
            category: MenuCategory::Main,
            modifiers: Vec::new(),
        }
    }

    fn placed(lines: Vec<CartLine>, settlement: Settlement) -> Order {
        let (items, subtotal) = freeze_lines(lines).expect("lines");
        NewOrder {
            order_number: "ORD-0001".into(),
            daily_serial: None,
            customer_id: None,
            customer_name: "Walk-in".into(),
            items,
            subtotal,
            total_amount: subtotal,
            settlement,
            discount_type: None,
            discount_value: None,
            discount_amount: Decimal::ZERO,
            event_discount_name: None,
            event_discount_percentage: None,
            event_discount_amount: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            created_by: Uuid::nil(),
        }
        .into_order(Uuid::new_v4(), Utc::now())
    }

    fn cash(amount: Decimal) -> Settlement {
        Settlement {
            method: PaymentMethod::Cash,
            cash_amount: Some(amount),
            card_amount: None,
            cash_received: None,
            change_amount: None,
        }
    }

    fn edit_items(lines: Vec<CartLine>) -> ModifyOrderRequest {
        ModifyOrderRequest {
            items: Some(lines),
            ..ModifyOrderRequest::default()
        }
    }

    #[test]
    fn adding_a_line_reprices_and_recharges_cash() {
        let original = placed(vec![line("burger", dec!(20), 1)], cash(dec!(20)));
        let updated = apply_modification(
            &original,
            edit_items(vec![line("burger", dec!(20), 1), line("fries", dec!(8), 1)]),
            dec!(15),
        )
        .expect("modification");

        assert_eq!(updated.status, OrderStatus::Modified);
        assert_eq!(updated.subtotal, dec!(28));
        assert_eq!(updated.total_amount, dec!(28));
        assert_eq!(updated.cash_amount, Some(dec!(28)));
        assert_eq!(updated.vat_amount, dec!(3.65));
        assert_eq!(
            infer_modification_type(&original, &updated),
            ModificationType::ItemAdded
        );
    }

    #[test]
    fn frozen_discounts_are_reapplied() {
        let mut original = placed(vec![line("burger", dec!(50), 2)], cash(dec!(72)));
        original.discount_type = Some(DiscountKind::Percentage);
        original.discount_value = Some(dec!(10));
        original.event_discount_percentage = Some(dec!(20));

        let updated = apply_modification(
            &original,
            edit_items(vec![line("burger", dec!(50), 1)]),
            dec!(0),
        )
        .expect("modification");

        assert_eq!(updated.subtotal, dec!(50));
        assert_eq!(updated.discount_amount, dec!(5));
        assert_eq!(updated.event_discount_amount, dec!(10));
        assert_eq!(updated.total_amount, dec!(35));
        assert_eq!(
            infer_modification_type(&original, &updated),
            ModificationType::QuantityChanged
        );
    }

    #[test]
    fn mixed_payment_must_be_reentered_when_total_moves() {
        let split = Settlement {
            method: PaymentMethod::Mixed,
            cash_amount: Some(dec!(10)),
            card_amount: Some(dec!(10)),
            cash_received: None,
            change_amount: None,
        };
        let original = placed(vec![line("burger", dec!(20), 1)], split);

        let result = apply_modification(
            &original,
            edit_items(vec![line("burger", dec!(20), 2)]),
            dec!(15),
        );
        assert!(matches!(result, Err(AppError::PaymentSplitMismatch)));

        let request = ModifyOrderRequest {
            items: Some(vec![line("burger", dec!(20), 2)]),
            payment: Some(PaymentRequest::mixed(dec!(25), dec!(15))),
            ..ModifyOrderRequest::default()
        };
        let updated = apply_modification(&original, request, dec!(15)).expect("new split");
        assert_eq!(updated.cash_amount, Some(dec!(25)));
        assert_eq!(updated.card_amount, Some(dec!(15)));
    }

    #[test]
    fn name_only_edit_keeps_tender() {
        let original = placed(vec![line("burger", dec!(20), 1)], cash(dec!(20)));
        let request = ModifyOrderRequest {
            customer_name: Some("  Sara ".into()),
            ..ModifyOrderRequest::default()
        };
        let updated = apply_modification(&original, request, dec!(15)).expect("modification");
        assert_eq!(updated.customer_name, "Sara");
        assert_eq!(updated.total_amount, dec!(20));
        assert_eq!(updated.cash_amount, Some(dec!(20)));
        assert_eq!(
            infer_modification_type(&original, &updated),
            ModificationType::MultipleChanges
        );
    }

    #[test]
    fn inference_rules() {
        let original = placed(
            vec![line("burger", dec!(20), 1), line("tea", dec!(5), 1)],
            cash(dec!(25)),
        );
        let with = |lines: Vec<CartLine>| {
            apply_modification(&original, edit_items(lines), dec!(15)).expect("modification")
        };

        let removed = with(vec![line("burger", dec!(20), 1)]);
        assert_eq!(
            infer_modification_type(&original, &removed),
            ModificationType::ItemRemoved
        );

        let replaced = with(vec![line("burger", dec!(20), 1), line("juice", dec!(7), 1)]);
        assert_eq!(
            infer_modification_type(&original, &replaced),
            ModificationType::ItemReplaced
        );

        let added_and_bumped = with(vec![
            line("burger", dec!(20), 3),
            line("tea", dec!(5), 1),
            line("fries", dec!(8), 1),
        ]);
        assert_eq!(
            infer_modification_type(&original, &added_and_bumped),
            ModificationType::MultipleChanges
        );

        let mut paid_by_card = with(vec![line("burger", dec!(20), 1), line("tea", dec!(5), 2)]);
        paid_by_card.payment_method = PaymentMethod::Card;
        assert_eq!(
            infer_modification_type(&original, &paid_by_card),
            ModificationType::MultipleChanges
        );
    }
}
