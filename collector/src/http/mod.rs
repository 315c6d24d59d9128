pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use ipnet::IpNet;
use rsa::RsaPrivateKey;
use tower_http::trace::TraceLayer;

use crate::controller::Controller;
use crate::metrics::track_metrics;

/// Shared application state for every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    pub private_key: Option<Arc<RsaPrivateKey>>,
    pub trusted_subnet: Option<IpNet>,
}

/// Builds the full HTTP router: plain routes plus the `/updates/` route
/// wrapped in its own decrypt + IP-allow-list middleware stack, matching the
/// HTTP routes table (only `/updates/` is documented as guarded).
pub fn router(state: AppState, export_prometheus: bool) -> Router {
    let updates_route = Router::new()
        .route("/updates/", post(handlers::update_metrics))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::trusted_ip,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::decrypt,
        ));

    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/ping", get(handlers::ping))
        .route("/value/:kind/:name", get(handlers::get_metric_uri))
        .route("/value/", post(handlers::get_metric_json))
        .route("/update/:kind/:name/:value", post(handlers::update_metric_uri))
        .route("/update/", post(handlers::update_metric_json))
        .merge(updates_route)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    if export_prometheus {
        router.merge(crate::metrics::metrics_router())
    } else {
        router
    }
}
