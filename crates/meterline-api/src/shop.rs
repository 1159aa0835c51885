//! Simulated shop traffic.
//!
//! A small state machine of visitors (waiting, active, served) that feeds
//! the collector: every transition bumps the `user_events` counter and
//! republishes the visitor gauges, and every handler records its own
//! duration into the `api_request_duration_ms` histogram. Handlers sleep a
//! bounded random duration to make the latency distribution non-trivial.

use std::ops::Range;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rand::Rng;
use tracing::{error, info};

use meterline_collect::Collector;

use crate::ApiState;

const SERVICE_LABELS: &[(&str, &str)] = &[("service", "shop")];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShopCounts {
    pub waiting: u64,
    pub active: u64,
    pub served: u64,
    pub total: u64,
}

/// Visitor state machine publishing business metrics through the collector.
pub struct ShopMetrics {
    counts: Mutex<ShopCounts>,
    collector: Collector,
}

impl ShopMetrics {
    pub fn new(collector: Collector) -> Self {
        Self {
            counts: Mutex::new(ShopCounts::default()),
            collector,
        }
    }

    pub fn counts(&self) -> ShopCounts {
        *self.counts.lock().expect("shop lock poisoned")
    }

    pub fn user_joined(&self) {
        let counts = {
            let mut c = self.counts.lock().expect("shop lock poisoned");
            c.waiting += 1;
            c.total += 1;
            *c
        };
        self.record_event("joined");
        self.publish_gauges(counts);
    }

    /// A waiting visitor starts browsing. No-op when nobody is waiting.
    pub fn user_looking_around(&self) {
        let (counts, moved) = {
            let mut c = self.counts.lock().expect("shop lock poisoned");
            let moved = c.waiting > 0;
            if moved {
                c.waiting -= 1;
                c.active += 1;
            }
            (*c, moved)
        };
        if moved {
            self.record_event("looking_around");
        }
        self.publish_gauges(counts);
    }

    /// An active visitor leaves without being served. No-op when nobody is
    /// active.
    pub fn user_left(&self) {
        let (counts, moved) = {
            let mut c = self.counts.lock().expect("shop lock poisoned");
            let moved = c.active > 0;
            if moved {
                c.active -= 1;
            }
            (*c, moved)
        };
        if moved {
            self.record_event("left");
        }
        self.publish_gauges(counts);
    }

    /// An active visitor is served. No-op when nobody is active.
    pub fn user_served(&self) {
        let (counts, moved) = {
            let mut c = self.counts.lock().expect("shop lock poisoned");
            let moved = c.active > 0;
            if moved {
                c.active -= 1;
                c.served += 1;
            }
            (*c, moved)
        };
        if moved {
            self.record_event("served");
        }
        self.publish_gauges(counts);
    }

    fn record_event(&self, event: &str) {
        self.collector
            .increment_counter("user_events", 1.0, &[("event", event)]);
    }

    fn publish_gauges(&self, c: ShopCounts) {
        self.collector
            .set_gauge("users_waiting", c.waiting as f64, SERVICE_LABELS);
        self.collector
            .set_gauge("users_active", c.active as f64, SERVICE_LABELS);
        self.collector
            .set_gauge("users_served", c.served as f64, SERVICE_LABELS);
        self.collector
            .set_gauge("users_total", c.total as f64, SERVICE_LABELS);
    }
}

/// Sleep a random duration within `millis` to simulate processing time.
async fn simulate_work(millis: Range<u64>) {
    let delay = { rand::thread_rng().gen_range(millis) };
    tokio::time::sleep(Duration::from_millis(delay)).await;
}

fn record_duration(state: &ApiState, endpoint: &str, method: &str, started: Instant) {
    state.collector.record_histogram(
        "api_request_duration_ms",
        started.elapsed().as_secs_f64() * 1000.0,
        &[("endpoint", endpoint), ("method", method)],
    );
}

/// GET /api/v1/shop/join
pub async fn join(State(state): State<ApiState>) -> impl IntoResponse {
    let started = Instant::now();
    simulate_work(50..200).await;
    state.shop.user_joined();
    info!("visitor joined the shop");
    record_duration(&state, "join", "GET", started);
    "Visitor joined the shop."
}

/// GET /api/v1/shop/look-around
pub async fn look_around(State(state): State<ApiState>) -> impl IntoResponse {
    let started = Instant::now();
    simulate_work(100..300).await;
    state.shop.user_looking_around();
    info!("visitor is looking around");
    record_duration(&state, "look-around", "GET", started);
    "Visitor is looking around."
}

/// GET /api/v1/shop/leave
pub async fn leave(State(state): State<ApiState>) -> impl IntoResponse {
    let started = Instant::now();
    simulate_work(25..100).await;
    state.shop.user_left();
    info!("visitor left the shop");
    record_duration(&state, "leave", "GET", started);
    "Visitor left the shop."
}

/// GET /api/v1/shop/served
pub async fn served(State(state): State<ApiState>) -> impl IntoResponse {
    let started = Instant::now();
    simulate_work(200..500).await;
    state.shop.user_served();
    info!("visitor has been served");
    record_duration(&state, "served", "GET", started);
    "Visitor has been served."
}

/// POST /api/v1/shop/simulate
pub async fn simulate(State(state): State<ApiState>) -> impl IntoResponse {
    let started = Instant::now();
    let action = {
        let mut rng = rand::thread_rng();
        ["join", "look", "leave", "serve"][rng.gen_range(0..4)]
    };
    simulate_work(50..200).await;

    match action {
        "join" => state.shop.user_joined(),
        "look" => state.shop.user_looking_around(),
        "leave" => state.shop.user_left(),
        _ => state.shop.user_served(),
    }

    record_duration(&state, "simulate", "POST", started);
    Json(serde_json::json!({
        "action": action,
        "message": format!("simulated {action}"),
    }))
}

/// GET /api/v1/shop/error
pub async fn fail(State(state): State<ApiState>) -> impl IntoResponse {
    let started = Instant::now();
    simulate_work(100..300).await;
    state
        .collector
        .increment_counter("api_errors", 1.0, &[("endpoint", "error")]);
    error!("visitor encountered an error");
    record_duration(&state, "error", "GET", started);
    (StatusCode::INTERNAL_SERVER_ERROR, "Visitor encountered an error.")
}
