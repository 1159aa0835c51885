//! meterline-api: HTTP surface of the metrics pipeline.
//!
//! Provides the Prometheus exposition endpoint, a JSON snapshot dump, and
//! the simulated shop traffic routes that drive the pipeline in demos.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/healthz` | Snapshot store health |
//! | GET | `/api/v1/metrics` | JSON dump of stored snapshots |
//! | POST | `/api/v1/test/generate` | Record one sample of each metric kind |
//! | GET | `/api/v1/shop/join` | Simulated visitor joins |
//! | GET | `/api/v1/shop/look-around` | Simulated visitor browses |
//! | GET | `/api/v1/shop/leave` | Simulated visitor leaves |
//! | GET | `/api/v1/shop/served` | Simulated visitor is served |
//! | POST | `/api/v1/shop/simulate` | One random visitor action |
//! | GET | `/api/v1/shop/error` | Simulated failure (returns 500) |

pub mod handlers;
pub mod shop;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use meterline_collect::Collector;
use meterline_store::SnapshotStore;

use crate::shop::ShopMetrics;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub collector: Collector,
    pub store: Arc<dyn SnapshotStore>,
    pub shop: Arc<ShopMetrics>,
}

impl ApiState {
    pub fn new(collector: Collector, store: Arc<dyn SnapshotStore>) -> Self {
        let shop = Arc::new(ShopMetrics::new(collector.clone()));
        Self {
            collector,
            store,
            shop,
        }
    }
}

/// Build the complete router (exposition + health + shop simulation).
pub fn build_router(state: ApiState) -> Router {
    let shop_routes = Router::new()
        .route("/join", get(shop::join))
        .route("/look-around", get(shop::look_around))
        .route("/leave", get(shop::leave))
        .route("/served", get(shop::served))
        .route("/simulate", post(shop::simulate))
        .route("/error", get(shop::fail));

    let api_routes = Router::new()
        .route("/metrics", get(handlers::metrics_dump))
        .route("/test/generate", post(handlers::generate_test_metrics))
        .nest("/shop", shop_routes);

    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api_routes)
        .with_state(state)
}
