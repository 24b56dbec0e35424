mod common;

use restaurant_pos_api::{
    config::PosSettings,
    db::{create_pool, orm_from_pool, run_migrations},
    dto::{
        customers::UpsertCustomerRequest, discounts::ActivateEventDiscountRequest,
        orders::ModifyOrderRequest,
    },
    models::{ModificationType, OrderStatus},
    services::{
        checkout_service, customer_service, discount_service,
        order_mutation_service::{self, ModifyOutcome},
        order_service,
    },
    state::AppState,
};
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

use common::{admin, cash_checkout, cashier, line};

// Integration flow against Postgres: customer -> event discount -> checkout -> modify -> cancel.
#[tokio::test]
async fn checkout_modify_and_cancel_against_postgres() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL to run the Postgres flow test.");
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let cashier = cashier();

    let customer = customer_service::register_customer(
        &state,
        &cashier,
        UpsertCustomerRequest {
            phone: "0555000111".into(),
            name: "Flow Test".into(),
            address: None,
        },
    )
    .await?;

    discount_service::activate(
        &state,
        &admin(),
        ActivateEventDiscountRequest {
            event_name: "Grand Opening".into(),
            percentage: dec!(20),
        },
    )
    .await?;
    let event = discount_service::active(&state).await?;

    let mut request = cash_checkout(vec![line("platter", dec!(50), 2)]);
    request.customer_id = Some(customer.id);
    let order = checkout_service::checkout(&state, &cashier, request, event.as_ref()).await?;
    assert_eq!(order.order_number, "ORD-0001");
    assert_eq!(order.daily_serial, Some(1));
    assert_eq!(order.total_amount, dec!(80));
    assert_eq!(order.event_discount_name.as_deref(), Some("Grand Opening"));

    let stored = order_service::get_order(&state, order.id).await?;
    assert_eq!(stored.items, order.items);
    assert_eq!(stored.total_amount, dec!(80));

    let refreshed = customer_service::lookup_by_phone(&state, "0555000111").await?;
    assert_eq!(refreshed.order_count, 1);
    assert_eq!(refreshed.total_purchases, dec!(80));

    // event ends; the modify still reprices with the rate frozen on the order
    discount_service::deactivate(&state, &admin()).await?;
    let outcome = order_mutation_service::modify_order(
        &state,
        order.id,
        cashier.user_id,
        ModifyOrderRequest {
            items: Some(vec![line("platter", dec!(50), 1)]),
            ..ModifyOrderRequest::default()
        },
    )
    .await?;
    let ModifyOutcome::Modified { order: modified, record } = outcome else {
        panic!("expected a modification");
    };
    assert_eq!(record.modification_type, ModificationType::QuantityChanged);
    assert_eq!(modified.total_amount, dec!(40));
    assert_eq!(modified.status, OrderStatus::Modified);

    let canceled =
        order_mutation_service::cancel_order(&state, order.id, cashier.user_id, None).await?;
    assert_eq!(canceled.order.status, OrderStatus::Canceled);

    let history = order_service::order_history(&state, order.id).await?;
    assert_eq!(history.modifications.len(), 1);
    assert_eq!(history.cancellations.len(), 1);
    assert_eq!(history.cancellations[0].order_data.total_amount, dec!(40));

    // an id the customer directory has never seen still completes the sale
    let mut walk_up = cash_checkout(vec![line("tea", dec!(4), 1)]);
    walk_up.customer_id = Some(Uuid::new_v4());
    let order = checkout_service::checkout(&state, &cashier, walk_up, None).await?;
    assert_eq!(order_service::get_order(&state, order.id).await?.customer_id, order.customer_id);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = orm_from_pool(&pool);
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE canceled_orders, modified_orders, orders, customers, daily_serials, event_discount, audit_logs CASCADE",
    ))
    .await?;

    Ok(AppState::postgres(pool, orm, PosSettings::default()))
}
