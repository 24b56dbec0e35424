use uuid::Uuid;

use crate::{
    dto::orders::{OrderHistory, OrderList},
    error::{AppError, AppResult},
    gateway::OrderQuery,
    models::Order,
    response::Meta,
    routes::params::OrderListQuery,
    state::AppState,
};

pub async fn list_orders(state: &AppState, query: OrderListQuery) -> AppResult<(OrderList, Meta)> {
    let (page, limit, offset) = query.pagination().normalize();
    let (orders, total) = state
        .orders
        .list_orders(OrderQuery {
            limit,
            offset,
            status: query.status,
        })
        .await?;

    Ok((OrderList { items: orders }, Meta::page(page, limit, total)))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<Order> {
    state
        .orders
        .get_order_by_id(id)
        .await?
        .ok_or(AppError::OrderNotFound(id))
}

pub async fn order_history(state: &AppState, id: Uuid) -> AppResult<OrderHistory> {
    let order = get_order(state, id).await?;
    let mut cancellations = state.orders.list_canceled_for(id).await?;
    cancellations.sort_by_key(|record| record.canceled_at);
    let mut modifications = state.orders.list_modified_for(id).await?;
    modifications.sort_by_key(|record| record.modified_at);

    Ok(OrderHistory {
        order,
        cancellations,
        modifications,
    })
}
