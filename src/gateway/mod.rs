use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        CanceledOrder, Customer, DailySerial, ModificationType, ModifiedOrder, Order, OrderItem,
        OrderStatus,
    },
    payment::Settlement,
    pricing::{DiscountKind, EventDiscount},
};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCustomerDirectory, InMemoryEventDiscountStore, InMemoryOrderGateway};
pub use postgres::{PgCustomerDirectory, PgEventDiscountStore, PgOrderGateway};

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub daily_serial: Option<DailySerial>,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
    pub settlement: Settlement,
    pub discount_type: Option<DiscountKind>,
    pub discount_value: Option<Decimal>,
    pub discount_amount: Decimal,
    pub event_discount_name: Option<String>,
    pub event_discount_percentage: Option<Decimal>,
    pub event_discount_amount: Decimal,
    pub vat_amount: Decimal,
    pub created_by: Uuid,
}

impl NewOrder {
    pub fn into_order(self, id: Uuid, now: DateTime<Utc>) -> Order {
        Order {
            id,
            order_number: self.order_number,
            daily_serial: self.daily_serial.map(|s| s.serial),
            serial_date: self.daily_serial.map(|s| s.serial_date),
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            items: self.items,
            subtotal: self.subtotal,
            total_amount: self.total_amount,
            payment_method: self.settlement.method,
            status: OrderStatus::Completed,
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            discount_amount: self.discount_amount,
            event_discount_name: self.event_discount_name,
            event_discount_percentage: self.event_discount_percentage,
            event_discount_amount: self.event_discount_amount,
            cash_amount: self.settlement.cash_amount,
            card_amount: self.settlement.card_amount,
            cash_received: self.settlement.cash_received,
            change_amount: self.settlement.change_amount,
            vat_amount: self.vat_amount,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a live order row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub customer_name: Option<String>,
    pub items: Option<Vec<OrderItem>>,
    pub subtotal: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub event_discount_amount: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub settlement: Option<Settlement>,
}

impl OrderChanges {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Every mutable column of `order`, used to write a modified snapshot back.
    pub fn from_snapshot(order: &Order) -> Self {
        Self {
            status: Some(order.status),
            customer_name: Some(order.customer_name.clone()),
            items: Some(order.items.clone()),
            subtotal: Some(order.subtotal),
            total_amount: Some(order.total_amount),
            discount_amount: Some(order.discount_amount),
            event_discount_amount: Some(order.event_discount_amount),
            vat_amount: Some(order.vat_amount),
            settlement: Some(Settlement {
                method: order.payment_method,
                cash_amount: order.cash_amount,
                card_amount: order.card_amount,
                cash_received: order.cash_received,
                change_amount: order.change_amount,
            }),
        }
    }

    pub fn apply_to(&self, order: &mut Order, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(name) = &self.customer_name {
            order.customer_name = name.clone();
        }
        if let Some(items) = &self.items {
            order.items = items.clone();
        }
        if let Some(subtotal) = self.subtotal {
            order.subtotal = subtotal;
        }
        if let Some(total) = self.total_amount {
            order.total_amount = total;
        }
        if let Some(amount) = self.discount_amount {
            order.discount_amount = amount;
        }
        if let Some(amount) = self.event_discount_amount {
            order.event_discount_amount = amount;
        }
        if let Some(vat) = self.vat_amount {
            order.vat_amount = vat;
        }
        if let Some(settlement) = self.settlement {
            order.payment_method = settlement.method;
            order.cash_amount = settlement.cash_amount;
            order.card_amount = settlement.card_amount;
            order.cash_received = settlement.cash_received;
            order.change_amount = settlement.change_amount;
        }
        order.updated_at = now;
    }
}

#[derive(Debug, Clone)]
pub struct NewCanceledOrder {
    pub original_order_id: Uuid,
    pub canceled_by: Uuid,
    pub reason: Option<String>,
    pub order_data: Order,
}

#[derive(Debug, Clone)]
pub struct NewModifiedOrder {
    pub original_order_id: Uuid,
    pub modified_by: Uuid,
    pub modification_type: ModificationType,
    pub original_data: Order,
    pub new_data: Order,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderQuery {
    pub limit: i64,
    pub offset: i64,
    pub status: Option<OrderStatus>,
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> AppResult<Order>;

    async fn get_order_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> AppResult<Order>;

    async fn insert_canceled_order(&self, record: NewCanceledOrder) -> AppResult<CanceledOrder>;

    async fn insert_modified_order(&self, record: NewModifiedOrder) -> AppResult<ModifiedOrder>;

    /// Atomically takes the next serial for `date`, starting at 1 each day.
    async fn next_daily_serial(&self, date: NaiveDate) -> AppResult<DailySerial>;

    async fn last_order_number(&self) -> AppResult<Option<String>>;

    async fn list_orders(&self, query: OrderQuery) -> AppResult<(Vec<Order>, i64)>;

    async fn list_canceled_for(&self, order_id: Uuid) -> AppResult<Vec<CanceledOrder>>;

    async fn list_modified_for(&self, order_id: Uuid) -> AppResult<Vec<ModifiedOrder>>;
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub phone: String,
    pub name: String,
    pub address: Option<String>,
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Customer>>;

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<Customer>>;

    async fn upsert(&self, customer: NewCustomer) -> AppResult<Customer>;

    /// Adds `order_total` to the running totals and stamps `last_order_at`.
    async fn record_purchase(
        &self,
        customer_id: Uuid,
        order_total: Decimal,
        order_number: &str,
    ) -> AppResult<Customer>;
}

#[async_trait]
pub trait EventDiscountStore: Send + Sync {
    async fn current(&self) -> AppResult<Option<EventDiscount>>;

    async fn save(&self, discount: &EventDiscount) -> AppResult<()>;
}
