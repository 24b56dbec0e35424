use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pricing::EventDiscount;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivateEventDiscountRequest {
    pub event_name: String,
    pub percentage: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventDiscountStatus {
    pub active: bool,
    pub discount: Option<EventDiscount>,
}

impl From<Option<EventDiscount>> for EventDiscountStatus {
    fn from(discount: Option<EventDiscount>) -> Self {
        Self {
            active: discount.as_ref().is_some_and(|d| d.is_active),
            discount,
        }
    }
}
