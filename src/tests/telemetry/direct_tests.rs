use crate::{GIB, GpuTelemetryClient, MetricKind, QueryRequest, QueryScope, TelemetryError};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

async fn create_client(mock_server: &MockServer) -> GpuTelemetryClient {
    GpuTelemetryClient::builder()
        .prometheus_address(mock_server.uri())
        .build()
        .await
        .unwrap()
}

fn expression(scope: QueryScope, targets: &[&str]) -> String {
    QueryRequest::new(scope, targets).expression(&MetricKind::series_names())
}

fn vector(result: Value) -> Value {
    json!({
        "status": "success",
        "data": {"resultType": "vector", "result": result}
    })
}

fn series(name: &str, labels: Value, value: &str) -> Value {
    let mut metric = labels;
    metric["__name__"] = json!(name);
    json!({"metric": metric, "value": [1700000000.123, value]})
}

#[tokio::test]
async fn test_pod_metrics_success() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).await;

    let pod_a = json!({"namespace_name": "default", "pod_name": "a", "node_name": "n1", "minor_number": "0"});
    let pod_b = json!({"namespace_name": "default", "pod_name": "b", "node_name": "n1", "minor_number": "1"});
    let pod_c = json!({"namespace_name": "default", "pod_name": "c", "node_name": "n2", "minor_number": "0"});

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", expression(QueryScope::Instance, &["a", "b"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector(json!([
            series("nvidia_gpu_duty_cycle", pod_a.clone(), "80"),
            series("nvidia_gpu_memory_used_bytes", pod_a.clone(), "2147483648"),
            series("nvidia_gpu_memory_total_bytes", pod_a, "17071734784"),
            series("nvidia_gpu_duty_cycle", pod_b, "12.5"),
            // regex leakage: "c" is not one of the requested pods
            series("nvidia_gpu_duty_cycle", pod_c, "99")
        ]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let job = client.pod_metrics(&["a", "b"]).await.unwrap();

    assert_eq!(job.instance_names().collect::<Vec<_>>(), vec!["a", "b"]);

    let a = &job.instance_metrics("a").unwrap()["0"];
    assert_eq!(a.duty_cycle, 80.0);
    assert_eq!(a.memory_used_bytes, 2.0 * GIB);
    // 15.9 GiB reported, floored to 15 GiB
    assert_eq!(a.memory_total_bytes, 15.0 * GIB);

    let b = &job.instance_metrics("b").unwrap()["1"];
    assert_eq!(b.duty_cycle, 12.5);
    assert_eq!(b.memory_total_bytes, 0.0);
}

#[tokio::test]
async fn test_pod_metrics_empty_request_skips_query() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector(json!([]))))
        .expect(0)
        .mount(&mock_server)
        .await;

    let names: [&str; 0] = [];
    let job = client.pod_metrics(&names).await.unwrap();
    assert!(job.is_empty());
}

#[tokio::test]
async fn test_all_node_metrics_success() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).await;

    let exclusive = json!({
        "node_name": "gpu-node-1", "minor_number": "0", "uuid": "GPU-aaaa",
        "namespace_name": "default", "pod_name": "trainer-0", "allocate_mode": "exclusive"
    });

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", expression(QueryScope::Node, &[".*"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector(json!([
            series("nvidia_gpu_duty_cycle", exclusive.clone(), "64"),
            series("nvidia_gpu_memory_used_bytes", exclusive.clone(), "4294967296"),
            series("nvidia_gpu_memory_total_bytes", exclusive, "16106127360")
        ]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let nodes = client.all_node_metrics().await.unwrap();

    let device = &nodes["gpu-node-1"]["0"];
    assert_eq!(device.device_uuid, "GPU-aaaa");
    assert_eq!(device.duty_cycle, 64.0);
    assert_eq!(device.memory_used_bytes, 4.0 * GIB);
    assert_eq!(device.memory_total_bytes, 15.0 * GIB);
    // one entry per contributing sample
    assert_eq!(
        device.attributed_instances,
        vec!["default/trainer-0", "default/trainer-0", "default/trainer-0"]
    );
    assert!(device.is_used_by_any(&["default/trainer-0"]));
}

#[tokio::test]
async fn test_non_vector_result_fails() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"resultType": "matrix", "result": []}
        })))
        .mount(&mock_server)
        .await;

    let result = client.node_metrics(&["n1"]).await;
    assert!(matches!(
        result,
        Err(TelemetryError::UnsupportedResultType(ref t)) if t == "matrix"
    ));
}

#[tokio::test]
async fn test_error_status_fails() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "errorType": "bad_data",
            "error": "parse error at char 3"
        })))
        .mount(&mock_server)
        .await;

    match client.pod_metrics(&["a"]).await {
        Err(TelemetryError::QueryRejected { status, message }) => {
            assert_eq!(status, "error");
            assert!(message.contains("bad_data"));
        }
        other => panic!("expected QueryRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_fails() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    assert!(matches!(
        client.all_node_metrics().await,
        Err(TelemetryError::Transport(_))
    ));
}

#[tokio::test]
async fn test_malformed_body_fails() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&mock_server)
        .await;

    assert!(matches!(
        client.pod_metrics(&["a"]).await,
        Err(TelemetryError::Decode(_))
    ));
}

#[tokio::test]
async fn test_unparseable_values_are_dropped() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).await;

    let labels = json!({"pod_name": "a", "minor_number": "0"});
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector(json!([
            series("nvidia_gpu_duty_cycle", labels.clone(), "NaN-ish"),
            series("nvidia_gpu_memory_used_bytes", labels, "1024")
        ]))))
        .mount(&mock_server)
        .await;

    let job = client.pod_metrics(&["a"]).await.unwrap();
    let a = &job.instance_metrics("a").unwrap()["0"];
    assert_eq!(a.duty_cycle, 0.0);
    assert_eq!(a.memory_used_bytes, 1024.0);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let mock_server = MockServer::start().await;
    let client = GpuTelemetryClient::builder()
        .prometheus_address(mock_server.uri())
        .query_timeout(Duration::from_millis(100))
        .build()
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(vector(json!([])))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    assert!(matches!(
        client.pod_metrics(&["a"]).await,
        Err(TelemetryError::Transport(_))
    ));
}

#[tokio::test]
async fn test_direct_address_with_path_prefix() {
    let mock_server = MockServer::start().await;
    let client = GpuTelemetryClient::builder()
        .prometheus_address(format!("{}/prometheus/", mock_server.uri()))
        .build()
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/prometheus/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector(json!([]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(client.all_node_metrics().await.unwrap().is_empty());
}
