mod common;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use restaurant_pos_api::{
    audit::MemoryAuditTrail,
    config::PosSettings,
    dto::orders::ModifyOrderRequest,
    error::{AppError, AppResult},
    gateway::{
        InMemoryCustomerDirectory, InMemoryEventDiscountStore, InMemoryOrderGateway,
        NewCanceledOrder, NewModifiedOrder, NewOrder, OrderChanges, OrderGateway, OrderQuery,
    },
    models::{
        CanceledOrder, DailySerial, ModificationType, ModifiedOrder, Order, OrderStatus,
        PaymentMethod,
    },
    payment::PaymentRequest,
    services::{
        checkout_service,
        order_mutation_service::{self, ALL_ITEMS_REMOVED_REASON, ModifyOutcome},
        order_service,
    },
    state::AppState,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{cash_checkout, cashier, line, state};

async fn place(state: &AppState) -> anyhow::Result<Order> {
    let items = vec![line("burger", dec!(20), 1), line("tea", dec!(5), 2)];
    Ok(checkout_service::checkout(state, &cashier(), cash_checkout(items), None).await?)
}

#[tokio::test]
async fn cancel_marks_order_and_keeps_one_snapshot() -> anyhow::Result<()> {
    let state = state();
    let order = place(&state).await?;
    let manager = Uuid::new_v4();

    let outcome = order_mutation_service::cancel_order(
        &state,
        order.id,
        manager,
        Some("Customer left".into()),
    )
    .await?;
    assert_eq!(outcome.order.status, OrderStatus::Canceled);
    assert_eq!(outcome.record.canceled_by, manager);
    assert_eq!(outcome.record.reason.as_deref(), Some("Customer left"));
    assert_eq!(outcome.record.order_data.status, OrderStatus::Completed);
    assert_eq!(outcome.record.order_data.total_amount, order.total_amount);

    let fetched = order_service::get_order(&state, order.id).await?;
    assert_eq!(fetched.status, OrderStatus::Canceled);

    let history = order_service::order_history(&state, order.id).await?;
    assert_eq!(history.cancellations.len(), 1);
    assert!(history.modifications.is_empty());
    Ok(())
}

#[tokio::test]
async fn canceled_orders_are_terminal() -> anyhow::Result<()> {
    let state = state();
    let order = place(&state).await?;
    order_mutation_service::cancel_order(&state, order.id, Uuid::new_v4(), None).await?;

    let again = order_mutation_service::cancel_order(&state, order.id, Uuid::new_v4(), None).await;
    assert!(matches!(
        again,
        Err(AppError::InvalidStatusTransition {
            from: "canceled",
            to: "canceled"
        })
    ));

    let modify = order_mutation_service::modify_order(
        &state,
        order.id,
        Uuid::new_v4(),
        ModifyOrderRequest {
            customer_name: Some("Late edit".into()),
            ..ModifyOrderRequest::default()
        },
    )
    .await;
    assert!(matches!(modify, Err(AppError::InvalidStatusTransition { .. })));

    let history = order_service::order_history(&state, order.id).await?;
    assert_eq!(history.cancellations.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let state = state();
    let id = Uuid::new_v4();
    let result = order_mutation_service::cancel_order(&state, id, Uuid::new_v4(), None).await;
    assert!(matches!(result, Err(AppError::OrderNotFound(missing)) if missing == id));
}

#[tokio::test]
async fn removing_every_item_cancels() -> anyhow::Result<()> {
    let state = state();
    let order = place(&state).await?;

    let outcome = order_mutation_service::modify_order(
        &state,
        order.id,
        Uuid::new_v4(),
        ModifyOrderRequest {
            items: Some(Vec::new()),
            ..ModifyOrderRequest::default()
        },
    )
    .await?;

    let ModifyOutcome::Canceled(canceled) = outcome else {
        panic!("expected the order to be canceled");
    };
    assert_eq!(canceled.order.status, OrderStatus::Canceled);
    assert_eq!(canceled.record.reason.as_deref(), Some(ALL_ITEMS_REMOVED_REASON));

    let history = order_service::order_history(&state, order.id).await?;
    assert_eq!(history.cancellations.len(), 1);
    assert!(history.modifications.is_empty());
    Ok(())
}

#[tokio::test]
async fn modifications_form_a_history_chain() -> anyhow::Result<()> {
    let state = state();
    let order = place(&state).await?;
    assert_eq!(order.total_amount, dec!(30));

    let first = order_mutation_service::modify_order(
        &state,
        order.id,
        Uuid::new_v4(),
        ModifyOrderRequest {
            items: Some(vec![
                line("burger", dec!(20), 1),
                line("tea", dec!(5), 2),
                line("fries", dec!(8), 1),
            ]),
            ..ModifyOrderRequest::default()
        },
    )
    .await?;
    let ModifyOutcome::Modified { order: after_first, record } = first else {
        panic!("expected a modification");
    };
    assert_eq!(record.modification_type, ModificationType::ItemAdded);
    assert_eq!(after_first.status, OrderStatus::Modified);
    assert_eq!(after_first.total_amount, dec!(38));
    assert_eq!(after_first.cash_amount, Some(dec!(38)));
    assert_eq!(record.original_data.total_amount, dec!(30));
    assert_eq!(record.new_data.total_amount, dec!(38));

    let second = order_mutation_service::modify_order(
        &state,
        order.id,
        Uuid::new_v4(),
        ModifyOrderRequest {
            modification_type: Some(ModificationType::ItemReplaced),
            items: Some(vec![line("burger", dec!(20), 1), line("juice", dec!(7), 1)]),
            payment: Some(PaymentRequest::mixed(dec!(17), dec!(10))),
            ..ModifyOrderRequest::default()
        },
    )
    .await?;
    let ModifyOutcome::Modified { order: after_second, record } = second else {
        panic!("expected a modification");
    };
    assert_eq!(record.modification_type, ModificationType::ItemReplaced);
    assert_eq!(after_second.payment_method, PaymentMethod::Mixed);
    assert_eq!(after_second.total_amount, dec!(27));
    assert_eq!(record.original_data.total_amount, dec!(38));

    let history = order_service::order_history(&state, order.id).await?;
    assert_eq!(history.modifications.len(), 2);
    assert_eq!(
        history.modifications[0].new_data.items,
        history.modifications[1].original_data.items
    );
    assert_eq!(history.order.status, OrderStatus::Modified);

    // a modified order can still be canceled
    let canceled =
        order_mutation_service::cancel_order(&state, order.id, Uuid::new_v4(), None).await?;
    assert_eq!(canceled.record.order_data.status, OrderStatus::Modified);
    Ok(())
}

#[tokio::test]
async fn invalid_new_payment_leaves_order_untouched() -> anyhow::Result<()> {
    let state = state();
    let order = place(&state).await?;

    let result = order_mutation_service::modify_order(
        &state,
        order.id,
        Uuid::new_v4(),
        ModifyOrderRequest {
            payment: Some(PaymentRequest::mixed(dec!(20), dec!(5))),
            ..ModifyOrderRequest::default()
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::PaymentSplitMismatch)));

    let history = order_service::order_history(&state, order.id).await?;
    assert!(history.modifications.is_empty());
    assert_eq!(history.order, order);
    Ok(())
}

/// Wraps the in-memory gateway and fails live-row updates while `failing` is set.
struct FlakyUpdates {
    inner: InMemoryOrderGateway,
    failing: AtomicBool,
}

#[async_trait]
impl OrderGateway for FlakyUpdates {
    async fn insert_order(&self, order: NewOrder) -> AppResult<Order> {
        self.inner.insert_order(order).await
    }

    async fn get_order_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        self.inner.get_order_by_id(id).await
    }

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> AppResult<Order> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("connection reset".into()));
        }
        self.inner.update_order(id, changes).await
    }

    async fn insert_canceled_order(&self, record: NewCanceledOrder) -> AppResult<CanceledOrder> {
        self.inner.insert_canceled_order(record).await
    }

    async fn insert_modified_order(&self, record: NewModifiedOrder) -> AppResult<ModifiedOrder> {
        self.inner.insert_modified_order(record).await
    }

    async fn next_daily_serial(&self, date: NaiveDate) -> AppResult<DailySerial> {
        self.inner.next_daily_serial(date).await
    }

    async fn last_order_number(&self) -> AppResult<Option<String>> {
        self.inner.last_order_number().await
    }

    async fn list_orders(&self, query: OrderQuery) -> AppResult<(Vec<Order>, i64)> {
        self.inner.list_orders(query).await
    }

    async fn list_canceled_for(&self, order_id: Uuid) -> AppResult<Vec<CanceledOrder>> {
        self.inner.list_canceled_for(order_id).await
    }

    async fn list_modified_for(&self, order_id: Uuid) -> AppResult<Vec<ModifiedOrder>> {
        self.inner.list_modified_for(order_id).await
    }
}

fn flaky_state() -> (AppState, Arc<FlakyUpdates>) {
    let gateway = Arc::new(FlakyUpdates {
        inner: InMemoryOrderGateway::new(),
        failing: AtomicBool::new(false),
    });
    let state = AppState {
        orders: gateway.clone(),
        customers: Arc::new(InMemoryCustomerDirectory::new()),
        event_discounts: Arc::new(InMemoryEventDiscountStore::new()),
        audit: Arc::new(MemoryAuditTrail::new()),
        settings: PosSettings::default(),
    };
    (state, gateway)
}

#[tokio::test]
async fn failed_status_update_reports_partial_failure() -> anyhow::Result<()> {
    let (state, gateway) = flaky_state();
    let order = place(&state).await?;

    gateway.failing.store(true, Ordering::SeqCst);
    let result = order_mutation_service::cancel_order(&state, order.id, Uuid::new_v4(), None).await;
    let (order_id, audit_id) = match result {
        Err(AppError::PartialFailure { order_id, audit_id }) => (order_id, audit_id),
        other => panic!("expected a partial failure, got {other:?}"),
    };
    assert_eq!(order_id, order.id);

    // the snapshot exists but the order still reads as completed
    let records = gateway.inner.canceled_records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, audit_id);
    let live = order_service::get_order(&state, order.id).await?;
    assert_eq!(live.status, OrderStatus::Completed);

    gateway.failing.store(false, Ordering::SeqCst);
    let reconciled = order_mutation_service::retry_cancel_status(&state, order.id).await?;
    assert_eq!(reconciled.order.status, OrderStatus::Canceled);
    assert_eq!(reconciled.record.id, audit_id);
    assert_eq!(gateway.inner.canceled_records().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn repeated_cancel_reuses_orphaned_snapshot() -> anyhow::Result<()> {
    let (state, gateway) = flaky_state();
    let order = place(&state).await?;

    gateway.failing.store(true, Ordering::SeqCst);
    let first = order_mutation_service::cancel_order(&state, order.id, Uuid::new_v4(), None).await;
    assert!(matches!(first, Err(AppError::PartialFailure { .. })));

    gateway.failing.store(false, Ordering::SeqCst);
    let second =
        order_mutation_service::cancel_order(&state, order.id, Uuid::new_v4(), None).await?;
    assert_eq!(second.order.status, OrderStatus::Canceled);
    assert_eq!(gateway.inner.canceled_records().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_modify_write_keeps_audit_record() -> anyhow::Result<()> {
    let (state, gateway) = flaky_state();
    let order = place(&state).await?;

    gateway.failing.store(true, Ordering::SeqCst);
    let result = order_mutation_service::modify_order(
        &state,
        order.id,
        Uuid::new_v4(),
        ModifyOrderRequest {
            items: Some(vec![line("burger", dec!(20), 2)]),
            ..ModifyOrderRequest::default()
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::PartialFailure { .. })));
    assert_eq!(gateway.inner.modified_records().await.len(), 1);

    let live = order_service::get_order(&state, order.id).await?;
    assert_eq!(live.total_amount, dec!(30));
    Ok(())
}

#[tokio::test]
async fn retry_without_cancellation_is_rejected() -> anyhow::Result<()> {
    let state = state();
    let order = place(&state).await?;
    let result = order_mutation_service::retry_cancel_status(&state, order.id).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn negative_priced_edit_is_rejected() -> anyhow::Result<()> {
    let state = state();
    let order = place(&state).await?;

    let result = order_mutation_service::modify_order(
        &state,
        order.id,
        Uuid::new_v4(),
        ModifyOrderRequest {
            items: Some(vec![line("burger", dec!(20), 1), line("voucher", dec!(-25), 1)]),
            ..ModifyOrderRequest::default()
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let history = order_service::order_history(&state, order.id).await?;
    assert!(history.modifications.is_empty());
    assert_eq!(history.order, order);
    Ok(())
}
