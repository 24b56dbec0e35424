use std::sync::Arc;

use crate::{
    audit::{AuditTrail, MemoryAuditTrail, PgAuditTrail},
    config::PosSettings,
    db::{DbPool, OrmConn},
    gateway::{
        CustomerDirectory, EventDiscountStore, InMemoryCustomerDirectory,
        InMemoryEventDiscountStore, InMemoryOrderGateway, OrderGateway, PgCustomerDirectory,
        PgEventDiscountStore, PgOrderGateway,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderGateway>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub event_discounts: Arc<dyn EventDiscountStore>,
    pub audit: Arc<dyn AuditTrail>,
    pub settings: PosSettings,
}

impl AppState {
    pub fn postgres(pool: DbPool, orm: OrmConn, settings: PosSettings) -> Self {
        Self {
            orders: Arc::new(PgOrderGateway::new(orm.clone(), pool.clone())),
            customers: Arc::new(PgCustomerDirectory::new(orm)),
            event_discounts: Arc::new(PgEventDiscountStore::new(pool.clone())),
            audit: Arc::new(PgAuditTrail::new(pool)),
            settings,
        }
    }

    pub fn in_memory(settings: PosSettings) -> Self {
        Self {
            orders: Arc::new(InMemoryOrderGateway::new()),
            customers: Arc::new(InMemoryCustomerDirectory::new()),
            event_discounts: Arc::new(InMemoryEventDiscountStore::new()),
            audit: Arc::new(MemoryAuditTrail::new()),
            settings,
        }
    }
}
