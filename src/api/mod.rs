// HTTP surface: thin axum handlers over BankService.

pub mod handlers;
pub mod responses;

use crate::core::service::BankService;
use crate::domain::ports::Deadline;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub service: BankService,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(service: BankService, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }

    /// Fresh deadline for the request being handled.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/swift-codes", post(handlers::add_swift_code))
        .route(
            "/v1/swift-codes/:swift_code",
            get(handlers::get_swift_code).delete(handlers::delete_swift_code),
        )
        .route(
            "/v1/swift-codes/country/:country_iso2",
            get(handlers::get_swift_codes_by_country),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn router_with_cors(state: AppState) -> Router {
    router(state).layer(CorsLayer::permissive())
}
