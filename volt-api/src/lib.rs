use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod adapters;
pub mod admin;
pub mod config;
pub mod contracts;
pub mod error;
pub mod orders;
pub mod state;
pub mod wallet;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(orders::routes())
        .merge(admin::routes())
        .merge(wallet::routes())
        .merge(contracts::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
