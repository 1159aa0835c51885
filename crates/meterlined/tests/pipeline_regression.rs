//! End-to-end pipeline regression tests.
//!
//! Drives the full record → flush → store → render path over the in-memory
//! store backend and the real HTTP router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use meterline_api::{ApiState, build_router};
use meterline_collect::{Collector, DEFAULT_FLUSH_INTERVAL, Flusher};
use meterline_store::{MemorySnapshotStore, SnapshotStore};

struct Pipeline {
    collector: Collector,
    store: Arc<MemorySnapshotStore>,
    flusher: Flusher,
}

fn pipeline() -> Pipeline {
    let collector = Collector::new();
    let store = Arc::new(MemorySnapshotStore::new());
    let flusher = Flusher::new(collector.clone(), store.clone(), DEFAULT_FLUSH_INTERVAL);
    Pipeline {
        collector,
        store,
        flusher,
    }
}

fn router(p: &Pipeline) -> axum::Router {
    let store: Arc<dyn SnapshotStore> = p.store.clone();
    build_router(ApiState::new(p.collector.clone(), store))
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn recorded_metrics_reach_the_exposition_endpoint() {
    let p = pipeline();

    p.collector.increment_counter("user_events", 3.0, &[("event", "joined")]);
    p.collector.set_gauge("users_waiting", 2.0, &[("service", "shop")]);
    p.collector.record_histogram("api_request_duration_ms", 12.5, &[("endpoint", "join")]);
    p.flusher.flush_once().await.unwrap();

    let resp = router(&p)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"],
        "text/plain; version=0.0.4"
    );

    let body = body_string(resp).await;
    assert!(body.contains("# TYPE user_events counter"));
    assert!(body.contains("user_events{event=\"joined\"} 3 "));
    assert!(body.contains("users_waiting{service=\"shop\"} 2 "));
    assert!(body.contains("api_request_duration_ms_count{endpoint=\"join\"} 1 "));
    assert!(body.contains("api_request_duration_ms_sum{endpoint=\"join\"} 12.5 "));
}

#[tokio::test]
async fn exposition_without_new_flush_is_stable() {
    let p = pipeline();

    p.collector.increment_counter("hits", 1.0, &[]);
    p.flusher.flush_once().await.unwrap();

    let app = router(&p);
    let first = body_string(
        app.clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    let second = body_string(
        app.oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn unflushed_metrics_are_not_visible() {
    let p = pipeline();
    p.collector.increment_counter("hits", 1.0, &[]);

    // No flush: the read path only sees the store.
    let body = body_string(
        router(&p)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    assert!(body.is_empty());
}

#[tokio::test]
async fn shop_join_drives_counters_gauges_and_histograms() {
    let p = pipeline();
    let app = router(&p);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/shop/join")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(
        p.collector.counter_value("user_events", &[("event", "joined")]),
        Some(1.0)
    );
    assert_eq!(
        p.collector.gauge_value("users_waiting", &[("service", "shop")]),
        Some(1.0)
    );
    assert_eq!(
        p.collector.histogram_depth(
            "api_request_duration_ms",
            &[("endpoint", "join"), ("method", "GET")]
        ),
        1
    );
}

#[tokio::test]
async fn shop_error_returns_500_and_counts() {
    let p = pipeline();

    let resp = router(&p)
        .oneshot(
            Request::builder()
                .uri("/api/v1/shop/error")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        p.collector.counter_value("api_errors", &[("endpoint", "error")]),
        Some(1.0)
    );
}

#[tokio::test]
async fn shop_simulate_performs_one_action() {
    let p = pipeline();

    let resp = router(&p)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/shop/simulate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    let action = json["action"].as_str().unwrap();
    assert!(["join", "look", "leave", "serve"].contains(&action));
}

#[tokio::test]
async fn generate_then_flush_then_dump() {
    let p = pipeline();
    let app = router(&p);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/test/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    p.flusher.flush_once().await.unwrap();

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["count"], 3);
    let requests =
        &json["metrics"]["metrics:counter:test_requests_total:method=GET,status=200"];
    assert_eq!(requests["type"], "counter");
    assert_eq!(requests["value"], 1.0);
}

#[tokio::test]
async fn healthz_reports_store_health() {
    let p = pipeline();

    let resp = router(&p)
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn snapshots_expire_after_their_ttl() {
    use meterline_store::SnapshotEntry;

    let store = MemorySnapshotStore::new();
    store
        .batch_set(
            vec![SnapshotEntry::new(
                "metrics:counter:short_lived".to_string(),
                br#"{"type":"counter","value":1.0,"timestamp":1}"#.to_vec(),
            )],
            Duration::from_millis(10),
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    // Absence after expiry is "no data in the window", not an error.
    let rendered = meterline_render::render(&store).await.unwrap();
    assert!(rendered.is_empty());
}
