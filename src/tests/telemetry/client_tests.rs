use crate::{
    BackendSignature, ClusterConnection, GpuTelemetryClient, LabelSelector, MetricKind,
    RateLimitConfig, ServicePort, TelemetryError, TelemetryResult,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

#[tokio::test]
async fn test_unconfigured_client_returns_empty_results() {
    let client = GpuTelemetryClient::builder().build().await.unwrap();

    assert!(client.direct_address().is_none());
    assert!(!client.backend_installed().await);
    assert!(client.locate_backend().await.is_none());
    assert!(client.pod_metrics(&["a"]).await.unwrap().is_empty());
    assert!(client.all_node_metrics().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_address_is_rejected() {
    let result = GpuTelemetryClient::builder()
        .prometheus_address("ftp://prometheus:9090")
        .build()
        .await;
    assert!(matches!(result, Err(TelemetryError::Validation(_))));

    let result = GpuTelemetryClient::builder()
        .prometheus_address("")
        .build()
        .await;
    assert!(matches!(result, Err(TelemetryError::Validation(_))));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let result = GpuTelemetryClient::builder()
        .prometheus_address("http://prometheus:9090")
        .rate_limit(RateLimitConfig {
            requests_per_second: 0,
            burst_size: 1,
        })
        .build()
        .await;
    assert!(matches!(result, Err(TelemetryError::Validation(_))));

    let result = GpuTelemetryClient::builder()
        .query_timeout(Duration::ZERO)
        .build()
        .await;
    assert!(matches!(result, Err(TelemetryError::Validation(_))));
}

#[tokio::test]
async fn test_direct_address_skips_discovery() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"resultType": "vector", "result": []}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GpuTelemetryClient::builder()
        .prometheus_address(mock_server.uri())
        .cluster(ClusterConnection::new(mock_server.uri()).unwrap())
        .build()
        .await
        .unwrap();

    assert!(client.direct_address().is_some());
    assert!(client.locate_backend().await.is_none());
    assert!(client.backend_installed().await);
    assert!(client.node_metrics(&["n1"]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_custom_signatures_are_used_for_discovery() {
    let mock_server = MockServer::start().await;

    let signature = BackendSignature {
        name: "victoria".to_string(),
        service_labels: LabelSelector::new("app=vmselect").unwrap(),
        protocol: "http".to_string(),
        port: ServicePort::new(8481).unwrap(),
        path: "select/0/prometheus/api/v1/query".to_string(),
        metric_names: MetricKind::series_names(),
    };

    Mock::given(method("GET"))
        .and(path("/api/v1/services"))
        .and(query_param("labelSelector", "app=vmselect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"metadata": {"namespace": "vm", "name": "vmselect"}}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/namespaces/vm/services/http:vmselect:8481/proxy/select/0/prometheus/api/v1/query",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"resultType": "vector", "result": [
                {"metric": {"__name__": "nvidia_gpu_duty_cycle", "node_name": "n1", "minor_number": "2"},
                 "value": [1700000000, "7"]}
            ]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GpuTelemetryClient::builder()
        .cluster(ClusterConnection::new(mock_server.uri()).unwrap())
        .signatures(vec![signature])
        .build()
        .await
        .unwrap();

    let nodes = client.node_metrics(&["n1"]).await.unwrap();
    assert_eq!(nodes["n1"]["2"].duty_cycle, 7.0);
}

async fn counted_build(builds: &AtomicUsize) -> TelemetryResult<GpuTelemetryClient> {
    builds.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    GpuTelemetryClient::builder()
        .prometheus_address("http://prometheus.monitoring:9090")
        .build()
        .await
}

#[tokio::test]
async fn test_shared_client_is_initialized_once() {
    let cell = OnceCell::new();
    let builds = AtomicUsize::new(0);

    let (first, second) = tokio::join!(
        GpuTelemetryClient::shared_in(&cell, || counted_build(&builds)),
        GpuTelemetryClient::shared_in(&cell, || counted_build(&builds)),
    );
    let first = first.unwrap();
    let second = second.unwrap();
    let third = GpuTelemetryClient::shared_in(&cell, || counted_build(&builds))
        .await
        .unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(std::ptr::eq(first, second));
    assert!(std::ptr::eq(first, third));
    assert_eq!(
        first.direct_address().map(ToString::to_string),
        Some("http://prometheus.monitoring:9090/".to_string())
    );
}

#[tokio::test]
async fn test_failed_shared_initialization_is_retried() {
    let cell = OnceCell::new();

    let failed = GpuTelemetryClient::shared_in(&cell, || async {
        Err::<GpuTelemetryClient, _>(TelemetryError::Configuration(
            "token unreadable".to_string(),
        ))
    })
    .await;
    assert!(matches!(failed, Err(TelemetryError::Configuration(_))));
    assert!(cell.get().is_none());

    let client = GpuTelemetryClient::shared_in(&cell, || GpuTelemetryClient::builder().build())
        .await
        .unwrap();
    assert!(client.direct_address().is_none());
    assert!(std::ptr::eq(client, cell.get().unwrap()));
}
