#![allow(dead_code)]

use restaurant_pos_api::{
    config::PosSettings,
    dto::{cart::CartLine, orders::CheckoutRequest},
    middleware::auth::AuthUser,
    models::MenuCategory,
    modifiers::Modifier,
    payment::PaymentRequest,
    state::AppState,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn state() -> AppState {
    AppState::in_memory(PosSettings::default())
}

pub fn cashier() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "cashier".into(),
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    }
}

pub fn line(id: &str, price: Decimal, quantity: i32) -> CartLine {
    CartLine {
        id: id.into(),
        name: id.into(),
        name_ar: None,
        description: None,
        unit_price: price,
        quantity,
        category: MenuCategory::Main,
        modifiers: Vec::new(),
    }
}

pub fn line_with(id: &str, price: Decimal, quantity: i32, modifiers: Vec<Modifier>) -> CartLine {
    CartLine {
        modifiers,
        ..line(id, price, quantity)
    }
}

pub fn cash_checkout(items: Vec<CartLine>) -> CheckoutRequest {
    CheckoutRequest {
        items,
        customer_id: None,
        customer_name: None,
        discount: None,
        payment: PaymentRequest::cash(),
    }
}
