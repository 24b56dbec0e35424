use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CustomerDirectory, EventDiscountStore, NewCanceledOrder, NewCustomer, NewModifiedOrder,
    NewOrder, OrderChanges, OrderGateway, OrderQuery,
};
use crate::{
    error::{AppError, AppResult},
    models::{CanceledOrder, Customer, DailySerial, ModifiedOrder, Order},
    pricing::EventDiscount,
};

#[derive(Default)]
struct OrderTables {
    // insertion order doubles as creation order
    orders: Vec<Order>,
    canceled: Vec<CanceledOrder>,
    modified: Vec<ModifiedOrder>,
    daily_serials: HashMap<NaiveDate, i32>,
}

#[derive(Default)]
pub struct InMemoryOrderGateway {
    tables: RwLock<OrderTables>,
}

impl InMemoryOrderGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn canceled_records(&self) -> Vec<CanceledOrder> {
        self.tables.read().await.canceled.clone()
    }

    pub async fn modified_records(&self) -> Vec<ModifiedOrder> {
        self.tables.read().await.modified.clone()
    }
}

#[async_trait]
impl OrderGateway for InMemoryOrderGateway {
    async fn insert_order(&self, order: NewOrder) -> AppResult<Order> {
        let mut tables = self.tables.write().await;
        if tables
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(AppError::Persistence(format!(
                "duplicate order number {}",
                order.order_number
            )));
        }
        let order = order.into_order(Uuid::new_v4(), Utc::now());
        tables.orders.push(order.clone());
        Ok(order)
    }

    async fn get_order_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> AppResult<Order> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(AppError::OrderNotFound(id))?;
        changes.apply_to(order, Utc::now());
        Ok(order.clone())
    }

    async fn insert_canceled_order(&self, record: NewCanceledOrder) -> AppResult<CanceledOrder> {
        let record = CanceledOrder {
            id: Uuid::new_v4(),
            original_order_id: record.original_order_id,
            canceled_at: Utc::now(),
            canceled_by: record.canceled_by,
            reason: record.reason,
            order_data: record.order_data,
        };
        self.tables.write().await.canceled.push(record.clone());
        Ok(record)
    }

    async fn insert_modified_order(&self, record: NewModifiedOrder) -> AppResult<ModifiedOrder> {
        let record = ModifiedOrder {
            id: Uuid::new_v4(),
            original_order_id: record.original_order_id,
            modified_at: Utc::now(),
            modified_by: record.modified_by,
            modification_type: record.modification_type,
            original_data: record.original_data,
            new_data: record.new_data,
        };
        self.tables.write().await.modified.push(record.clone());
        Ok(record)
    }

    async fn next_daily_serial(&self, date: NaiveDate) -> AppResult<DailySerial> {
        let mut tables = self.tables.write().await;
        let serial = tables.daily_serials.entry(date).or_insert(0);
        *serial += 1;
        Ok(DailySerial {
            serial: *serial,
            serial_date: date,
        })
    }

    async fn last_order_number(&self) -> AppResult<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.last().map(|o| o.order_number.clone()))
    }

    async fn list_orders(&self, query: OrderQuery) -> AppResult<(Vec<Order>, i64)> {
        let tables = self.tables.read().await;
        let matching: Vec<&Order> = tables
            .orders
            .iter()
            .rev()
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn list_canceled_for(&self, order_id: Uuid) -> AppResult<Vec<CanceledOrder>> {
        let tables = self.tables.read().await;
        Ok(tables
            .canceled
            .iter()
            .filter(|r| r.original_order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_modified_for(&self, order_id: Uuid) -> AppResult<Vec<ModifiedOrder>> {
        let tables = self.tables.read().await;
        Ok(tables
            .modified
            .iter()
            .filter(|r| r.original_order_id == order_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerDirectory {
    customers: RwLock<HashMap<Uuid, Customer>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.values().find(|c| c.phone == phone).cloned())
    }

    async fn upsert(&self, customer: NewCustomer) -> AppResult<Customer> {
        let mut customers = self.customers.write().await;
        if let Some(existing) = customers.values_mut().find(|c| c.phone == customer.phone) {
            existing.name = customer.name;
            existing.address = customer.address;
            return Ok(existing.clone());
        }
        let created = Customer {
            id: Uuid::new_v4(),
            phone: customer.phone,
            name: customer.name,
            address: customer.address,
            total_purchases: Decimal::ZERO,
            order_count: 0,
            last_order_at: None,
            created_at: Utc::now(),
        };
        customers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn record_purchase(
        &self,
        customer_id: Uuid,
        order_total: Decimal,
        _order_number: &str,
    ) -> AppResult<Customer> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(&customer_id)
            .ok_or(AppError::CustomerNotFound(customer_id))?;
        customer.total_purchases += order_total;
        customer.order_count += 1;
        customer.last_order_at = Some(Utc::now());
        Ok(customer.clone())
    }
}

#[derive(Default)]
pub struct InMemoryEventDiscountStore {
    slot: RwLock<Option<EventDiscount>>,
}

impl InMemoryEventDiscountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventDiscountStore for InMemoryEventDiscountStore {
    async fn current(&self) -> AppResult<Option<EventDiscount>> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, discount: &EventDiscount) -> AppResult<()> {
        *self.slot.write().await = Some(discount.clone());
        Ok(())
    }
}
