//! Integration tests for the vision service.
//!
//! These run the real server on an ephemeral port and, where needed, a fake
//! orchestrator built with axum on another ephemeral port.
//! Run with: cargo test --test integration

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

use io_vision::caps::{spawn_caps_report, CapsReportOutcome};
use io_vision::config::Config;
use io_vision::server;

/// A port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Client bypassing any proxy configured in the environment.
fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn test_config(orch_port: u16) -> Config {
    Config {
        orch_host: "127.0.0.1".to_string(),
        orch_port: orch_port.to_string(),
        ..Config::default()
    }
}

/// Start the service; returns its address and a shutdown trigger.
async fn start_service(config: Config) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        server::serve(config, listener, async {
            let _ = rx.await;
        })
        .await
        .unwrap();
    });

    (addr, tx)
}

/// Start an orchestrator that accepts connections and never answers.
async fn start_silent_orchestrator() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    port
}

/// Received report body and headers.
type Captured = (HeaderMap, Value);

/// Start a fake orchestrator answering `/event` with `status`.
async fn start_orchestrator(status: StatusCode) -> (u16, mpsc::UnboundedReceiver<Captured>) {
    let (tx, rx) = mpsc::unbounded_channel::<Captured>();

    let app = Router::new()
        .route(
            "/event",
            post(
                move |State(tx): State<mpsc::UnboundedSender<Captured>>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    let _ = tx.send((headers, body));
                    (status, Json(json!({"accepted": status.is_success()})))
                },
            ),
        )
        .with_state(tx);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (port, rx)
}

/// Test that startup completes and requests are served while the
/// orchestrator refuses connections.
#[tokio::test]
async fn test_serves_when_orchestrator_is_down() {
    let (addr, shutdown) = start_service(test_config(closed_port())).await;
    let client = http_client();

    let response = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok", "service": "unison-io-vision"}));

    let _ = shutdown.send(());
}

/// Test that unusable orchestrator settings do not stop the service.
#[tokio::test]
async fn test_serves_with_unusable_orchestrator_settings() {
    let configs = [
        Config {
            orch_host: String::new(),
            ..Config::default()
        },
        Config {
            orch_host: "127.0.0.1".to_string(),
            orch_port: "not-a-port".to_string(),
            ..Config::default()
        },
    ];

    for config in configs {
        assert!(config.validate().is_err());

        let (addr, shutdown) = start_service(config).await;
        let response = http_client()
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let _ = shutdown.send(());
    }
}

/// Test that an orchestrator which never answers neither delays serving nor
/// holds the report past its timeout.
#[tokio::test]
async fn test_silent_orchestrator_times_out_in_background() {
    let config = test_config(start_silent_orchestrator().await);

    let started = Instant::now();
    let report = spawn_caps_report(&config);
    let (addr, shutdown) = start_service(config).await;

    let response = tokio::time::timeout(
        Duration::from_millis(500),
        http_client().get(format!("http://{addr}/health")).send(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response.status(), 200);
    assert!(!report.is_finished());

    let outcome = tokio::time::timeout(Duration::from_secs(4), report)
        .await
        .unwrap()
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(outcome, CapsReportOutcome { ok: false, status: 0 });
    assert!(elapsed >= Duration::from_millis(1900), "returned after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3500), "returned after {elapsed:?}");

    let _ = shutdown.send(());
}

/// Test that the capability report reaches the orchestrator.
#[tokio::test]
async fn test_caps_report_delivered() {
    let (port, mut reports) = start_orchestrator(StatusCode::ACCEPTED).await;
    let config = Config {
        default_person_id: "person-7".to_string(),
        has_bci_adapter: true,
        ..test_config(port)
    };

    let outcome = spawn_caps_report(&config).await.unwrap();
    assert_eq!(outcome, CapsReportOutcome { ok: true, status: 202 });

    let (headers, body) = tokio::time::timeout(Duration::from_secs(2), reports.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(headers["accept"], "application/json");
    assert_eq!(body["intent"], "caps.report");
    assert_eq!(body["source"], "unison-io-vision");
    assert_eq!(body["payload"]["person_id"], "person-7");
    assert_eq!(body["payload"]["caps"]["camera"]["present"], true);
    assert_eq!(body["payload"]["caps"]["camera"]["confidence"], 0.6);
    assert_eq!(body["payload"]["caps"]["bci_adapter"]["present"], true);
    assert!(body["timestamp"].is_string());
}

/// Test that a non-accepting status is a soft failure carrying the status.
#[tokio::test]
async fn test_caps_report_rejected_status() {
    let (port, _reports) = start_orchestrator(StatusCode::INTERNAL_SERVER_ERROR).await;

    let outcome = spawn_caps_report(&test_config(port)).await.unwrap();

    assert_eq!(outcome, CapsReportOutcome { ok: false, status: 500 });
}

/// Test that the server sends its report on startup.
#[tokio::test]
async fn test_server_reports_on_startup() {
    let (port, mut reports) = start_orchestrator(StatusCode::OK).await;
    let (_addr, shutdown) = start_service(test_config(port)).await;

    let (_, body) = tokio::time::timeout(Duration::from_secs(3), reports.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(body["intent"], "caps.report");

    let _ = shutdown.send(());
}

/// Test the request sequence against the metrics exposition.
#[tokio::test]
async fn test_metrics_reflect_request_sequence() {
    let (addr, shutdown) = start_service(test_config(closed_port())).await;
    let client = http_client();

    for _ in 0..5 {
        client.get(format!("http://{addr}/health")).send().await.unwrap();
    }
    for _ in 0..3 {
        client
            .post(format!("http://{addr}/vision/capture"))
            .header("X-Event-ID", "evt")
            .json(&json!({}))
            .send()
            .await
            .unwrap();
    }

    let exposition = client
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(exposition.contains("unison_io_vision_requests_total{endpoint=\"/health\"} 5"));
    assert!(exposition.contains("unison_io_vision_requests_total{endpoint=\"/vision/capture\"} 3"));

    let health_line = exposition.find("endpoint=\"/health\"").unwrap();
    let capture_line = exposition.find("endpoint=\"/vision/capture\"").unwrap();
    assert!(health_line < capture_line);

    let _ = shutdown.send(());
}

/// Test concurrent requests to one endpoint are all counted.
#[tokio::test]
async fn test_concurrent_requests_are_counted() {
    let (addr, shutdown) = start_service(test_config(closed_port())).await;
    let client = http_client();

    let requests: Vec<_> = (0..50)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .post(format!("http://{addr}/vision/describe"))
                    .json(&json!({"image_url": "data:image/png;base64,AAAA", "session_id": format!("s{i}")}))
                    .send()
                    .await
                    .unwrap()
                    .json::<Value>()
                    .await
                    .unwrap()
            })
        })
        .collect();

    for request in requests {
        let body = request.await.unwrap();
        assert_eq!(body["ok"], true);
    }

    let exposition = client
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(exposition.contains("{endpoint=\"/vision/describe\"} 50\n"));

    let _ = shutdown.send(());
}
