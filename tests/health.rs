use axum::extract::State;
use restaurant_pos_api::{config::PosSettings, routes::health::health_check, state::AppState};

#[tokio::test]
async fn health_check_returns_ok() {
    let state = AppState::in_memory(PosSettings::default());
    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.orders_store, "ok");
}
