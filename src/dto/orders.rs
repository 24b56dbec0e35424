use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::cart::CartLine,
    models::{CanceledOrder, ModificationType, ModifiedOrder, Order},
    payment::PaymentRequest,
    pricing::{OrderDiscount, PayableBreakdown, VatBreakdown},
    services::order_mutation_service::{CancelOutcome, ModifyOutcome},
};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub discount: Option<OrderDiscount>,
    pub payment: PaymentRequest,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub items: Vec<CartLine>,
    pub discount: Option<OrderDiscount>,
}

/// Totals shown on the payment screen before the order is placed.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub item_count: i64,
    pub totals: PayableBreakdown,
    pub vat: VatBreakdown,
    pub event_discount_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ModifyOrderRequest {
    /// Left empty, the type is inferred from what changed.
    pub modification_type: Option<ModificationType>,
    pub customer_name: Option<String>,
    pub items: Option<Vec<CartLine>>,
    pub payment: Option<PaymentRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelOrderResponse {
    pub order: Order,
    pub record: CanceledOrder,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModifyOrderResponse {
    Modified { order: Order, record: ModifiedOrder },
    /// All items were removed, so the order was canceled instead.
    Canceled { order: Order, record: CanceledOrder },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderHistory {
    pub order: Order,
    pub cancellations: Vec<CanceledOrder>,
    pub modifications: Vec<ModifiedOrder>,
}

impl From<CancelOutcome> for CancelOrderResponse {
    fn from(outcome: CancelOutcome) -> Self {
        Self {
            order: outcome.order,
            record: outcome.record,
        }
    }
}

impl From<ModifyOutcome> for ModifyOrderResponse {
    fn from(outcome: ModifyOutcome) -> Self {
        match outcome {
            ModifyOutcome::Modified { order, record } => Self::Modified { order, record },
            ModifyOutcome::Canceled(CancelOutcome { order, record }) => {
                Self::Canceled { order, record }
            }
        }
    }
}
