use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Order {0} not found")]
    OrderNotFound(Uuid),

    #[error("Customer {0} not found")]
    CustomerNotFound(Uuid),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Invalid discount configuration: {0}")]
    InvalidDiscountConfig(String),

    #[error("Cash and card amounts do not add up to the payable total")]
    PaymentSplitMismatch,

    #[error("Cash received is less than the payable total")]
    InsufficientCash,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Order cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The audit record was written but the live order row was not updated.
    #[error("Order {order_id} needs reconciliation (audit record {audit_id} written)")]
    PartialFailure { order_id: Uuid, audit_id: Uuid },

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::BadRequest(_)
                | AppError::InvalidDiscountConfig(_)
                | AppError::PaymentSplitMismatch
                | AppError::InsufficientCash
                | AppError::EmptyCart
                | AppError::InvalidStatusTransition { .. }
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::OrderNotFound(_) | AppError::CustomerNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            err if err.is_validation() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = ?self, "request failed");
                "Failed to save changes, please retry".to_string()
            }
            _ => self.to_string(),
        };

        (status, axum::Json(ApiResponse::error(message, self.to_string()))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        assert_eq!(AppError::PaymentSplitMismatch.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidDiscountConfig("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::OrderNotFound(Uuid::nil()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::PartialFailure {
                order_id: Uuid::nil(),
                audit_id: Uuid::nil()
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
