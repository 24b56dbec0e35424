use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    CustomerDirectory, EventDiscountStore, NewCanceledOrder, NewCustomer, NewModifiedOrder,
    NewOrder, OrderChanges, OrderGateway, OrderQuery,
};
use crate::{
    db::{DbPool, OrmConn},
    entity::{
        canceled_orders::{
            ActiveModel as CanceledActive, Column as CanceledCol, Entity as CanceledOrders,
            Model as CanceledModel,
        },
        customers::{
            ActiveModel as CustomerActive, Column as CustomerCol, Entity as Customers,
            Model as CustomerModel,
        },
        modified_orders::{
            ActiveModel as ModifiedActive, Column as ModifiedCol, Entity as ModifiedOrders,
            Model as ModifiedModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    models::{
        CanceledOrder, Customer, DailySerial, ModificationType, ModifiedOrder, Order,
        OrderStatus, PaymentMethod,
    },
    pricing::{DiscountKind, EventDiscount},
};

#[derive(Clone)]
pub struct PgOrderGateway {
    orm: OrmConn,
    pool: DbPool,
}

impl PgOrderGateway {
    pub fn new(orm: OrmConn, pool: DbPool) -> Self {
        Self { orm, pool }
    }
}

#[async_trait]
impl OrderGateway for PgOrderGateway {
    async fn insert_order(&self, order: NewOrder) -> AppResult<Order> {
        let items = to_json(&order.items)?;
        let model = OrderActive {
            id: Set(Uuid::new_v4()),
            order_number: Set(order.order_number),
            daily_serial: Set(order.daily_serial.map(|s| s.serial)),
            serial_date: Set(order.daily_serial.map(|s| s.serial_date)),
            customer_id: Set(order.customer_id),
            customer_name: Set(order.customer_name),
            items: Set(items),
            subtotal: Set(order.subtotal),
            total_amount: Set(order.total_amount),
            payment_method: Set(order.settlement.method.as_str().into()),
            status: Set(OrderStatus::Completed.as_str().into()),
            discount_type: Set(order.discount_type.map(|k| k.as_str().into())),
            discount_value: Set(order.discount_value),
            discount_amount: Set(order.discount_amount),
            event_discount_name: Set(order.event_discount_name),
            event_discount_percentage: Set(order.event_discount_percentage),
            event_discount_amount: Set(order.event_discount_amount),
            cash_amount: Set(order.settlement.cash_amount),
            card_amount: Set(order.settlement.card_amount),
            cash_received: Set(order.settlement.cash_received),
            change_amount: Set(order.settlement.change_amount),
            vat_amount: Set(order.vat_amount),
            created_by: Set(order.created_by),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&self.orm)
        .await?;

        order_from_entity(model)
    }

    async fn get_order_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Orders::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> AppResult<Order> {
        let order = Orders::find_by_id(id)
            .one(&self.orm)
            .await?
            .ok_or(AppError::OrderNotFound(id))?;

        let mut active: OrderActive = order.into();
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().into());
        }
        if let Some(name) = changes.customer_name {
            active.customer_name = Set(name);
        }
        if let Some(items) = &changes.items {
            active.items = Set(to_json(items)?);
        }
        if let Some(subtotal) = changes.subtotal {
            active.subtotal = Set(subtotal);
        }
        if let Some(total) = changes.total_amount {
            active.total_amount = Set(total);
        }
        if let Some(amount) = changes.discount_amount {
            active.discount_amount = Set(amount);
        }
        if let Some(amount) = changes.event_discount_amount {
            active.event_discount_amount = Set(amount);
        }
        if let Some(vat) = changes.vat_amount {
            active.vat_amount = Set(vat);
        }
        if let Some(settlement) = changes.settlement {
            active.payment_method = Set(settlement.method.as_str().into());
            active.cash_amount = Set(settlement.cash_amount);
            active.card_amount = Set(settlement.card_amount);
            active.cash_received = Set(settlement.cash_received);
            active.change_amount = Set(settlement.change_amount);
        }
        active.updated_at = Set(Utc::now().into());

        order_from_entity(active.update(&self.orm).await?)
    }

    async fn insert_canceled_order(&self, record: NewCanceledOrder) -> AppResult<CanceledOrder> {
        let model = CanceledActive {
            id: Set(Uuid::new_v4()),
            original_order_id: Set(record.original_order_id),
            canceled_at: NotSet,
            canceled_by: Set(record.canceled_by),
            reason: Set(record.reason),
            order_data: Set(to_json(&record.order_data)?),
        }
        .insert(&self.orm)
        .await?;

        canceled_from_entity(model)
    }

    async fn insert_modified_order(&self, record: NewModifiedOrder) -> AppResult<ModifiedOrder> {
        let model = ModifiedActive {
            id: Set(Uuid::new_v4()),
            original_order_id: Set(record.original_order_id),
            modified_at: NotSet,
            modified_by: Set(record.modified_by),
            modification_type: Set(record.modification_type.as_str().into()),
            original_data: Set(to_json(&record.original_data)?),
            new_data: Set(to_json(&record.new_data)?),
        }
        .insert(&self.orm)
        .await?;

        modified_from_entity(model)
    }

    async fn next_daily_serial(&self, date: NaiveDate) -> AppResult<DailySerial> {
        // single statement so concurrent checkouts never share a serial
        let (serial,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO daily_serials (serial_date, last_serial)
            VALUES ($1, 1)
            ON CONFLICT (serial_date)
            DO UPDATE SET last_serial = daily_serials.last_serial + 1
            RETURNING last_serial
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySerial {
            serial,
            serial_date: date,
        })
    }

    async fn last_order_number(&self) -> AppResult<Option<String>> {
        let last = Orders::find()
            .order_by_desc(OrderCol::CreatedAt)
            .one(&self.orm)
            .await?;
        Ok(last.map(|o| o.order_number))
    }

    async fn list_orders(&self, query: OrderQuery) -> AppResult<(Vec<Order>, i64)> {
        let mut condition = Condition::all();
        if let Some(status) = query.status {
            condition = condition.add(OrderCol::Status.eq(status.as_str()));
        }

        let finder = Orders::find()
            .filter(condition)
            .order_by_desc(OrderCol::CreatedAt);

        let total = finder.clone().count(&self.orm).await? as i64;

        let orders = finder
            .limit(query.limit as u64)
            .offset(query.offset as u64)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((orders, total))
    }

    async fn list_canceled_for(&self, order_id: Uuid) -> AppResult<Vec<CanceledOrder>> {
        CanceledOrders::find()
            .filter(CanceledCol::OriginalOrderId.eq(order_id))
            .order_by_asc(CanceledCol::CanceledAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(canceled_from_entity)
            .collect()
    }

    async fn list_modified_for(&self, order_id: Uuid) -> AppResult<Vec<ModifiedOrder>> {
        ModifiedOrders::find()
            .filter(ModifiedCol::OriginalOrderId.eq(order_id))
            .order_by_asc(ModifiedCol::ModifiedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(modified_from_entity)
            .collect()
    }
}

#[derive(Clone)]
pub struct PgCustomerDirectory {
    orm: OrmConn,
}

impl PgCustomerDirectory {
    pub fn new(orm: OrmConn) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl CustomerDirectory for PgCustomerDirectory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        Ok(Customers::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(customer_from_entity))
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<Customer>> {
        Ok(Customers::find()
            .filter(CustomerCol::Phone.eq(phone))
            .one(&self.orm)
            .await?
            .map(customer_from_entity))
    }

    async fn upsert(&self, customer: NewCustomer) -> AppResult<Customer> {
        let active = CustomerActive {
            id: Set(Uuid::new_v4()),
            phone: Set(customer.phone),
            name: Set(customer.name),
            address: Set(customer.address),
            total_purchases: Set(Decimal::ZERO),
            order_count: Set(0),
            last_order_at: Set(None),
            created_at: NotSet,
        };
        let model = Customers::insert(active)
            .on_conflict(
                OnConflict::column(CustomerCol::Phone)
                    .update_columns([CustomerCol::Name, CustomerCol::Address])
                    .to_owned(),
            )
            .exec_with_returning(&self.orm)
            .await?;
        Ok(customer_from_entity(model))
    }

    async fn record_purchase(
        &self,
        customer_id: Uuid,
        order_total: Decimal,
        order_number: &str,
    ) -> AppResult<Customer> {
        let result = Customers::update_many()
            .col_expr(
                CustomerCol::TotalPurchases,
                Expr::col(CustomerCol::TotalPurchases).add(order_total),
            )
            .col_expr(CustomerCol::OrderCount, Expr::col(CustomerCol::OrderCount).add(1))
            .col_expr(CustomerCol::LastOrderAt, Expr::value(Utc::now()))
            .filter(CustomerCol::Id.eq(customer_id))
            .exec(&self.orm)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::CustomerNotFound(customer_id));
        }
        tracing::debug!(customer_id = %customer_id, order_number, "purchase recorded");

        self.find_by_id(customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound(customer_id))
    }
}

#[derive(FromRow)]
struct EventDiscountRow {
    percentage: Decimal,
    event_name: String,
    activated_by: Uuid,
    activated_at: chrono::DateTime<Utc>,
    is_active: bool,
}

/// Single-row table (`id = 1`), so at most one event discount exists.
#[derive(Clone)]
pub struct PgEventDiscountStore {
    pool: DbPool,
}

impl PgEventDiscountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventDiscountStore for PgEventDiscountStore {
    async fn current(&self) -> AppResult<Option<EventDiscount>> {
        let row = sqlx::query_as::<_, EventDiscountRow>(
            r#"
            SELECT percentage, event_name, activated_by, activated_at, is_active
            FROM event_discount
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| EventDiscount {
            percentage: row.percentage,
            event_name: row.event_name,
            activated_by: row.activated_by,
            activated_at: row.activated_at,
            is_active: row.is_active,
        }))
    }

    async fn save(&self, discount: &EventDiscount) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO event_discount (id, percentage, event_name, activated_by, activated_at, is_active)
            VALUES (1, $1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET percentage = EXCLUDED.percentage,
                event_name = EXCLUDED.event_name,
                activated_by = EXCLUDED.activated_by,
                activated_at = EXCLUDED.activated_at,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(discount.percentage)
        .bind(&discount.event_name)
        .bind(discount.activated_by)
        .bind(discount.activated_at)
        .bind(discount.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|err| AppError::Persistence(err.to_string()))
}

fn from_json<T: DeserializeOwned>(value: serde_json::Value, column: &str) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|err| AppError::Persistence(format!("invalid {column}: {err}")))
}

fn parse_column<T>(value: &str, column: &str, parse: fn(&str) -> Option<T>) -> AppResult<T> {
    parse(value).ok_or_else(|| AppError::Persistence(format!("invalid {column}: {value}")))
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        order_number: model.order_number,
        daily_serial: model.daily_serial,
        serial_date: model.serial_date,
        customer_id: model.customer_id,
        customer_name: model.customer_name,
        items: from_json(model.items, "orders.items")?,
        subtotal: model.subtotal,
        total_amount: model.total_amount,
        payment_method: parse_column(
            &model.payment_method,
            "orders.payment_method",
            PaymentMethod::parse,
        )?,
        status: parse_column(&model.status, "orders.status", OrderStatus::parse)?,
        discount_type: model
            .discount_type
            .as_deref()
            .map(|kind| parse_column(kind, "orders.discount_type", DiscountKind::parse))
            .transpose()?,
        discount_value: model.discount_value,
        discount_amount: model.discount_amount,
        event_discount_name: model.event_discount_name,
        event_discount_percentage: model.event_discount_percentage,
        event_discount_amount: model.event_discount_amount,
        cash_amount: model.cash_amount,
        card_amount: model.card_amount,
        cash_received: model.cash_received,
        change_amount: model.change_amount,
        vat_amount: model.vat_amount,
        created_by: model.created_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn canceled_from_entity(model: CanceledModel) -> AppResult<CanceledOrder> {
    Ok(CanceledOrder {
        id: model.id,
        original_order_id: model.original_order_id,
        canceled_at: model.canceled_at.with_timezone(&Utc),
        canceled_by: model.canceled_by,
        reason: model.reason,
        order_data: from_json(model.order_data, "canceled_orders.order_data")?,
    })
}

fn modified_from_entity(model: ModifiedModel) -> AppResult<ModifiedOrder> {
    Ok(ModifiedOrder {
        id: model.id,
        original_order_id: model.original_order_id,
        modified_at: model.modified_at.with_timezone(&Utc),
        modified_by: model.modified_by,
        modification_type: parse_column(
            &model.modification_type,
            "modified_orders.modification_type",
            ModificationType::parse,
        )?,
        original_data: from_json(model.original_data, "modified_orders.original_data")?,
        new_data: from_json(model.new_data, "modified_orders.new_data")?,
    })
}

fn customer_from_entity(model: CustomerModel) -> Customer {
    Customer {
        id: model.id,
        phone: model.phone,
        name: model.name,
        address: model.address,
        total_purchases: model.total_purchases,
        order_count: model.order_count,
        last_order_at: model.last_order_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
