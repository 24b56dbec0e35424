use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::PaymentMethod,
    money::MONEY_TOLERANCE,
};

/// Mixed payments only: both parts positive, neither above the payable,
/// and together within one cent of it.
pub fn validate_split(payable: Decimal, cash_amount: Decimal, card_amount: Decimal) -> bool {
    // bounds first so the sum cannot overflow
    cash_amount > Decimal::ZERO
        && card_amount > Decimal::ZERO
        && cash_amount <= payable
        && card_amount <= payable
        && (cash_amount + card_amount - payable).abs() < MONEY_TOLERANCE
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub cash_amount: Option<Decimal>,
    pub card_amount: Option<Decimal>,
    /// Cash physically handed over, used to compute change.
    pub cash_received: Option<Decimal>,
}

impl PaymentRequest {
    pub fn cash() -> Self {
        Self::single(PaymentMethod::Cash)
    }

    pub fn card() -> Self {
        Self::single(PaymentMethod::Card)
    }

    pub fn mixed(cash_amount: Decimal, card_amount: Decimal) -> Self {
        Self {
            method: PaymentMethod::Mixed,
            cash_amount: Some(cash_amount),
            card_amount: Some(card_amount),
            cash_received: None,
        }
    }

    pub fn with_cash_received(mut self, cash_received: Decimal) -> Self {
        self.cash_received = Some(cash_received);
        self
    }

    fn single(method: PaymentMethod) -> Self {
        Self {
            method,
            cash_amount: None,
            card_amount: None,
            cash_received: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Settlement {
    pub method: PaymentMethod,
    pub cash_amount: Option<Decimal>,
    pub card_amount: Option<Decimal>,
    pub cash_received: Option<Decimal>,
    pub change_amount: Option<Decimal>,
}

pub fn settle(payable: Decimal, request: &PaymentRequest) -> AppResult<Settlement> {
    match request.method {
        PaymentMethod::Cash => {
            let (cash_received, change_amount) = tendered_change(request.cash_received, payable)?;
            Ok(Settlement {
                method: PaymentMethod::Cash,
                cash_amount: Some(payable),
                card_amount: None,
                cash_received,
                change_amount,
            })
        }
        PaymentMethod::Card => Ok(Settlement {
            method: PaymentMethod::Card,
            cash_amount: None,
            card_amount: Some(payable),
            cash_received: None,
            change_amount: None,
        }),
        PaymentMethod::Mixed => {
            let (Some(cash), Some(card)) = (request.cash_amount, request.card_amount) else {
                return Err(AppError::PaymentSplitMismatch);
            };
            if !validate_split(payable, cash, card) {
                return Err(AppError::PaymentSplitMismatch);
            }
            let (cash_received, change_amount) = tendered_change(request.cash_received, cash)?;
            Ok(Settlement {
                method: PaymentMethod::Mixed,
                cash_amount: Some(cash),
                card_amount: Some(card),
                cash_received,
                change_amount,
            })
        }
    }
}

fn tendered_change(
    cash_received: Option<Decimal>,
    cash_due: Decimal,
) -> AppResult<(Option<Decimal>, Option<Decimal>)> {
    match cash_received {
        None => Ok((None, None)),
        Some(received) if received < cash_due => Err(AppError::InsufficientCash),
        Some(received) => Ok((Some(received), Some(received - cash_due))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn split_must_reconcile_exactly() {
        assert!(validate_split(dec!(100), dec!(60), dec!(40)));
        assert!(!validate_split(dec!(100), dec!(60), dec!(30)));
        assert!(!validate_split(dec!(100), dec!(0), dec!(100)));
        assert!(!validate_split(dec!(100), Decimal::MAX, Decimal::MAX));
        assert!(!validate_split(dec!(100), dec!(100), dec!(0)));
        assert!(!validate_split(dec!(100), dec!(120), dec!(-20)));
        assert!(validate_split(dec!(100), dec!(59.999), dec!(40)));
    }

    #[test]
    fn cash_computes_change() {
        let settlement =
            settle(dec!(45), &PaymentRequest::cash().with_cash_received(dec!(50))).expect("cash");
        assert_eq!(settlement.cash_amount, Some(dec!(45)));
        assert_eq!(settlement.change_amount, Some(dec!(5)));

        assert!(matches!(
            settle(dec!(45), &PaymentRequest::cash().with_cash_received(dec!(40))),
            Err(AppError::InsufficientCash)
        ));
    }

    #[test]
    fn card_bypasses_split_validation() {
        let settlement = settle(dec!(80), &PaymentRequest::card()).expect("card");
        assert_eq!(settlement.card_amount, Some(dec!(80)));
        assert_eq!(settlement.cash_amount, None);
    }

    #[test]
    fn mixed_requires_both_parts() {
        let missing = PaymentRequest {
            method: PaymentMethod::Mixed,
            cash_amount: Some(dec!(50)),
            card_amount: None,
            cash_received: None,
        };
        assert!(matches!(
            settle(dec!(50), &missing),
            Err(AppError::PaymentSplitMismatch)
        ));

        let ok = settle(dec!(100), &PaymentRequest::mixed(dec!(60), dec!(40))).expect("mixed");
        assert_eq!(ok.method, PaymentMethod::Mixed);
        assert_eq!(ok.card_amount, Some(dec!(40)));
    }
}
