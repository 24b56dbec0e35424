use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    money::{percent_of, round_money},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Amount,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Amount => "amount",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "percentage" => Some(DiscountKind::Percentage),
            "amount" => Some(DiscountKind::Amount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderDiscount {
    Percentage { value: Decimal },
    Amount { value: Decimal },
}

impl OrderDiscount {
    pub fn kind(&self) -> DiscountKind {
        match self {
            OrderDiscount::Percentage { .. } => DiscountKind::Percentage,
            OrderDiscount::Amount { .. } => DiscountKind::Amount,
        }
    }

    pub fn value(&self) -> Decimal {
        match self {
            OrderDiscount::Percentage { value } | OrderDiscount::Amount { value } => *value,
        }
    }

    pub fn from_parts(kind: DiscountKind, value: Decimal) -> Self {
        match kind {
            DiscountKind::Percentage => OrderDiscount::Percentage { value },
            DiscountKind::Amount => OrderDiscount::Amount { value },
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !fits_cents(self.value()) {
            return Err(AppError::InvalidDiscountConfig(format!(
                "discount value must have at most 2 decimal places, got {}",
                self.value()
            )));
        }
        match *self {
            OrderDiscount::Percentage { value }
                if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED =>
            {
                Err(AppError::InvalidDiscountConfig(format!(
                    "percentage must be between 0 and 100, got {value}"
                )))
            }
            OrderDiscount::Amount { value } if value < Decimal::ZERO => {
                Err(AppError::InvalidDiscountConfig(format!(
                    "amount must not be negative, got {value}"
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn amount_for(&self, subtotal: Decimal) -> Decimal {
        match *self {
            OrderDiscount::Percentage { value } => percent_of(subtotal, value),
            OrderDiscount::Amount { value } => value.min(subtotal).max(Decimal::ZERO),
        }
    }
}

// Discount columns are NUMERIC(_, 2); anything finer would be rounded on write.
fn fits_cents(value: Decimal) -> bool {
    value.normalize().scale() <= 2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventDiscount {
    pub percentage: Decimal,
    pub event_name: String,
    pub activated_by: Uuid,
    pub activated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl EventDiscount {
    pub fn activate(
        event_name: &str,
        percentage: Decimal,
        activated_by: Uuid,
        activated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let event_name = event_name.trim();
        if event_name.is_empty() {
            return Err(AppError::InvalidDiscountConfig(
                "event name is required".into(),
            ));
        }
        if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(AppError::InvalidDiscountConfig(format!(
                "event percentage must be greater than 0 and at most 100, got {percentage}"
            )));
        }
        if !fits_cents(percentage) {
            return Err(AppError::InvalidDiscountConfig(format!(
                "event percentage must have at most 2 decimal places, got {percentage}"
            )));
        }
        Ok(Self {
            percentage,
            event_name: event_name.to_string(),
            activated_by,
            activated_at,
            is_active: true,
        })
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PayableBreakdown {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub event_discount_amount: Decimal,
    pub payable: Decimal,
}

pub fn resolve_payable(
    subtotal: Decimal,
    order_discount: Option<&OrderDiscount>,
    event_discount: Option<&EventDiscount>,
) -> PayableBreakdown {
    let event_percentage = event_discount
        .filter(|d| d.is_active)
        .map(|d| d.percentage);
    resolve_with_event_rate(subtotal, order_discount, event_percentage)
}

/// Same as [`resolve_payable`] with the event discount given as a bare
/// percentage, as frozen on an existing order.
///
/// The event amount is capped at what the order discount leaves, so the
/// deductions never exceed the subtotal.
pub fn resolve_with_event_rate(
    subtotal: Decimal,
    order_discount: Option<&OrderDiscount>,
    event_percentage: Option<Decimal>,
) -> PayableBreakdown {
    let discount_amount = order_discount
        .map(|d| d.amount_for(subtotal))
        .unwrap_or(Decimal::ZERO);
    let remaining = (subtotal - discount_amount).max(Decimal::ZERO);
    let event_discount_amount = event_percentage
        .map(|pct| percent_of(subtotal, pct).min(remaining))
        .unwrap_or(Decimal::ZERO);
    let payable = round_money(subtotal - discount_amount - event_discount_amount).max(Decimal::ZERO);

    PayableBreakdown {
        subtotal,
        discount_amount,
        event_discount_amount,
        payable,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct VatBreakdown {
    pub rate: Decimal,
    pub net: Decimal,
    pub vat: Decimal,
}

pub fn extract_vat(gross: Decimal, rate: Decimal) -> VatBreakdown {
    let vat = if rate <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        round_money(gross * rate / (Decimal::ONE_HUNDRED + rate))
    };
    VatBreakdown {
        rate,
        net: gross - vat,
        vat,
    }
}
