use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    models::{MenuCategory, OrderItem, OrderItemDetails},
    modifiers::{self, Modifier},
    money::round_money,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub category: MenuCategory,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub modifiers_total: Decimal,
}

impl CartItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        category: MenuCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            name_ar: None,
            description: None,
            unit_price,
            quantity: 1,
            category,
            modifiers: Vec::new(),
            modifiers_total: Decimal::ZERO,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self.refresh_modifiers_total();
        self
    }

    pub fn with_quantity(mut self, quantity: i32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn effective_unit_price(&self) -> Decimal {
        self.unit_price + self.modifiers_total
    }

    pub fn line_total(&self) -> Decimal {
        self.effective_unit_price() * Decimal::from(self.quantity)
    }

    fn refresh_modifiers_total(&mut self) {
        self.modifiers_total = modifiers::extras_total(&self.modifiers);
    }

    pub fn freeze(&self) -> OrderItem {
        let unit_price = self.effective_unit_price();
        OrderItem {
            id: self.id.clone(),
            category: self.category,
            name: self.name.clone(),
            name_ar: self.name_ar.clone(),
            quantity: self.quantity,
            unit_price,
            total_price: round_money(unit_price * Decimal::from(self.quantity)),
            details: OrderItemDetails {
                description: self.description.clone(),
                modifiers: self.modifiers.clone(),
                category: self.category,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    items: Vec<CartItem>,
    total: Decimal,
    item_count: i64,
    is_open: bool,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self {
            items: items
                .into_iter()
                .filter(|item| item.quantity > 0)
                .map(|mut item| {
                    item.refresh_modifiers_total();
                    item
                })
                .collect(),
            ..Self::default()
        };
        cart.is_open = !cart.items.is_empty();
        cart.recalculate();
        cart
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn item_count(&self) -> i64 {
        self.item_count
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add_item(&mut self, item: CartItem) {
        let was_empty = self.items.is_empty();
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity += 1;
        } else {
            let mut item = item;
            item.quantity = 1;
            item.refresh_modifiers_total();
            self.items.push(item);
        }
        if was_empty {
            self.is_open = true;
        }
        self.recalculate();
    }

    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|i| i.id != id);
        if self.items.is_empty() {
            self.is_open = false;
        }
        self.recalculate();
    }

    /// A quantity of zero or less removes the line.
    pub fn update_quantity(&mut self, id: &str, quantity: i32) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity;
        }
        self.recalculate();
    }

    pub fn toggle_modifier(&mut self, id: &str, modifier: Modifier) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            modifiers::toggle(&mut item.modifiers, modifier);
            item.refresh_modifiers_total();
        }
        self.recalculate();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.is_open = false;
        self.recalculate();
    }

    pub fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    pub fn freeze_items(&self) -> Vec<OrderItem> {
        self.items.iter().map(CartItem::freeze).collect()
    }

    // Stored derived fields are never trusted.
    fn reprice(&mut self) {
        self.items.iter_mut().for_each(CartItem::refresh_modifiers_total);
        self.recalculate();
    }

    // Round once after summing so per-line rounding does not compound.
    fn recalculate(&mut self) {
        self.total = round_money(self.items.iter().map(CartItem::line_total).sum());
        self.item_count = self.items.iter().map(|i| i64::from(i.quantity)).sum();
    }
}

#[derive(Debug, Error)]
pub enum CartStorageError {
    #[error("cart storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("cart storage encoding: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("cart storage unavailable")]
    Unavailable,
}

pub trait CartStorage: Send + Sync {
    fn load(&self) -> Result<Option<Cart>, CartStorageError>;
    fn save(&self, cart: &Cart) -> Result<(), CartStorageError>;
    fn clear(&self) -> Result<(), CartStorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<Cart>, CartStorageError> {
        let slot = self.slot.lock().map_err(|_| CartStorageError::Unavailable)?;
        slot.as_deref()
            .map(serde_json::from_str::<Cart>)
            .transpose()
            .map_err(CartStorageError::from)
    }

    fn save(&self, cart: &Cart) -> Result<(), CartStorageError> {
        let encoded = serde_json::to_string(cart)?;
        *self.slot.lock().map_err(|_| CartStorageError::Unavailable)? = Some(encoded);
        Ok(())
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        *self.slot.lock().map_err(|_| CartStorageError::Unavailable)? = None;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Option<Cart>, CartStorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), CartStorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(cart)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

// Storage failures are logged and swallowed; the in-memory cart stays
// authoritative for the session.
pub struct PersistentCart<S: CartStorage> {
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> PersistentCart<S> {
    pub fn restore(storage: S) -> Self {
        let cart = match storage.load() {
            Ok(Some(mut cart)) => {
                cart.reprice();
                cart
            }
            Ok(None) => Cart::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to restore cart, starting empty");
                Cart::new()
            }
        };
        Self { cart, storage }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn add_item(&mut self, item: CartItem) {
        self.cart.add_item(item);
        self.persist();
    }

    pub fn remove_item(&mut self, id: &str) {
        self.cart.remove_item(id);
        self.persist();
    }

    pub fn update_quantity(&mut self, id: &str, quantity: i32) {
        self.cart.update_quantity(id, quantity);
        self.persist();
    }

    pub fn toggle_modifier(&mut self, id: &str, modifier: Modifier) {
        self.cart.toggle_modifier(id, modifier);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        if let Err(err) = self.storage.clear() {
            tracing::warn!(error = %err, "failed to clear stored cart");
        }
    }

    fn persist(&self) {
        if let Err(err) = self.storage.save(&self.cart) {
            tracing::warn!(error = %err, "failed to persist cart");
        }
    }
}
