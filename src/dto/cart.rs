use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{cart::CartItem, models::MenuCategory, modifiers::Modifier};

/// A cart line as sent by the till. Derived totals are recomputed server-side.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub category: MenuCategory,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl From<CartLine> for CartItem {
    fn from(line: CartLine) -> Self {
        let mut item = CartItem::new(line.id, line.name, line.unit_price, line.category)
            .with_modifiers(line.modifiers)
            .with_quantity(line.quantity);
        item.name_ar = line.name_ar;
        item.description = line.description;
        item
    }
}
