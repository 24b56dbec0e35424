use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{modifiers::Modifier, pricing::DiscountKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mixed,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mixed => "mixed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "mixed" => Some(PaymentMethod::Mixed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Completed,
    Canceled,
    Modified,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Modified => "modified",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(OrderStatus::Completed),
            "canceled" => Some(OrderStatus::Canceled),
            "modified" => Some(OrderStatus::Modified),
            _ => None,
        }
    }

    /// Canceled is terminal and nothing returns to Completed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Completed, OrderStatus::Canceled)
                | (OrderStatus::Completed, OrderStatus::Modified)
                | (OrderStatus::Modified, OrderStatus::Modified)
                | (OrderStatus::Modified, OrderStatus::Canceled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModificationType {
    ItemAdded,
    ItemRemoved,
    QuantityChanged,
    ItemReplaced,
    MultipleChanges,
}

impl ModificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationType::ItemAdded => "item_added",
            ModificationType::ItemRemoved => "item_removed",
            ModificationType::QuantityChanged => "quantity_changed",
            ModificationType::ItemReplaced => "item_replaced",
            ModificationType::MultipleChanges => "multiple_changes",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "item_added" => Some(ModificationType::ItemAdded),
            "item_removed" => Some(ModificationType::ItemRemoved),
            "quantity_changed" => Some(ModificationType::QuantityChanged),
            "item_replaced" => Some(ModificationType::ItemReplaced),
            "multiple_changes" => Some(ModificationType::MultipleChanges),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MenuCategory {
    Appetizer,
    Main,
    Sandwich,
    Side,
    Dessert,
    Beverage,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemDetails {
    pub description: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    pub category: MenuCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: String,
    #[serde(rename = "type")]
    pub category: MenuCategory,
    pub name: String,
    pub name_ar: Option<String>,
    pub quantity: i32,
    /// Base price plus extras.
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub details: OrderItemDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub daily_serial: Option<i32>,
    pub serial_date: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub discount_type: Option<DiscountKind>,
    pub discount_value: Option<Decimal>,
    pub discount_amount: Decimal,
    pub event_discount_name: Option<String>,
    pub event_discount_percentage: Option<Decimal>,
    pub event_discount_amount: Decimal,
    pub cash_amount: Option<Decimal>,
    pub card_amount: Option<Decimal>,
    pub cash_received: Option<Decimal>,
    pub change_amount: Option<Decimal>,
    pub vat_amount: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|item| item.total_price).sum()
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CanceledOrder {
    pub id: Uuid,
    pub original_order_id: Uuid,
    pub canceled_at: DateTime<Utc>,
    pub canceled_by: Uuid,
    pub reason: Option<String>,
    pub order_data: Order,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModifiedOrder {
    pub id: Uuid,
    pub original_order_id: Uuid,
    pub modified_at: DateTime<Utc>,
    pub modified_by: Uuid,
    pub modification_type: ModificationType,
    pub original_data: Order,
    pub new_data: Order,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub phone: String,
    pub name: String,
    pub address: Option<String>,
    pub total_purchases: Decimal,
    pub order_count: i32,
    pub last_order_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailySerial {
    pub serial: i32,
    pub serial_date: NaiveDate,
}
