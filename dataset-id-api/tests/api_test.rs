use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use dataset_id_api::config::ServiceConfigBuilder;
use dataset_id_api::routes::create_router;
use dataset_id_api::{AppState, ServiceConfig, StatusMode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG_PATH: &str = "/api/core/dataset/pageList";

fn router_with(
    server: &MockServer,
    configure: impl FnOnce(ServiceConfigBuilder) -> ServiceConfigBuilder,
) -> Router {
    let builder = ServiceConfig::builder().upstream_url(server.uri());
    let config = configure(builder).build().unwrap();
    create_router(Arc::new(AppState::new(config).unwrap()))
}

fn envelope(ids: &[&str]) -> Value {
    let items: Vec<Value> = ids.iter().map(|id| json!({"_id": id, "name": id})).collect();
    json!({"code": 200, "data": {"items": items}})
}

async fn mount_root(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_children(server: &MockServer, parent: &str, ids: &[&str]) {
    mount_child_response(
        server,
        parent,
        ResponseTemplate::new(200).set_body_json(envelope(ids)),
    )
    .await;
}

async fn mount_child_response(server: &MockServer, parent: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(CATALOG_PATH))
        .and(body_string(format!("parentId={parent}")))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_three_level_aggregation_skips_failed_branches() {
    let server = MockServer::start().await;
    mount_root(&server, envelope(&["A", "B"])).await;
    mount_children(&server, "A", &["C"]).await;
    mount_child_response(&server, "B", ResponseTemplate::new(502)).await;
    mount_children(&server, "C", &["X", "Y"]).await;

    let (status, body) = get(router_with(&server, |b| b), "/api/dataset-ids").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "code": 200,
            "msg": "successfully retrieved 2 records",
            "data": {
                "items": [{"datasetId": "X"}, {"datasetId": "Y"}],
                "count": 2
            }
        })
    );
}

#[tokio::test]
async fn test_unreachable_upstream_reports_500_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = get(router_with(&server, |b| b), "/api/dataset-ids").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 500);
    assert_eq!(body["msg"], "cannot reach data source");
    assert_eq!(body["data"], json!({"items": [], "count": 0}));
}

#[tokio::test]
async fn test_invalid_json_root_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let (_, body) = get(router_with(&server, |b| b), "/api/dataset-ids").await;
    assert_eq!(body["code"], 500);
}

#[tokio::test]
async fn test_root_error_code_reports_no_level_one_ids() {
    let server = MockServer::start().await;
    mount_root(&server, json!({"code": 401, "msg": "token expired"})).await;

    let (_, body) = get(router_with(&server, |b| b), "/api/dataset-ids").await;
    assert_eq!(body["code"], 404);
    assert_eq!(body["msg"], "no valid level-1 ids");
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_failed_level_two_reports_404() {
    let server = MockServer::start().await;
    mount_root(&server, envelope(&["A"])).await;
    mount_child_response(
        &server,
        "A",
        ResponseTemplate::new(200).set_body_string("not json"),
    )
    .await;

    let (status, body) = get(router_with(&server, |b| b), "/api/dataset-ids").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 404);
    assert_eq!(body["msg"], "no valid level-2 data");
    assert_eq!(body["data"]["items"], json!([]));
}

#[tokio::test]
async fn test_empty_level_three_is_success_with_zero_count() {
    let server = MockServer::start().await;
    mount_root(&server, envelope(&["A"])).await;
    mount_children(&server, "A", &["C"]).await;
    mount_children(&server, "C", &[]).await;

    let (_, body) = get(router_with(&server, |b| b), "/api/dataset-ids").await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["msg"], "successfully retrieved 0 records");
    assert_eq!(body["data"], json!({"items": [], "count": 0}));
}

#[tokio::test]
async fn test_upstream_timeout_skips_branch() {
    let server = MockServer::start().await;
    mount_root(&server, envelope(&["A", "B"])).await;
    mount_child_response(
        &server,
        "A",
        ResponseTemplate::new(200)
            .set_body_json(envelope(&["slow"]))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    mount_children(&server, "B", &["D"]).await;
    mount_children(&server, "D", &["Z"]).await;

    let app = router_with(&server, |b| b.timeout_seconds(1));
    let (_, body) = get(app, "/api/dataset-ids").await;

    assert_eq!(body["data"]["items"], json!([{"datasetId": "Z"}]));
}

#[tokio::test]
async fn test_session_cookie_and_form_content_type_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .and(header("Cookie", "isoftstone_token=tok-123"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&["A"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CATALOG_PATH))
        .and(header("Cookie", "isoftstone_token=tok-123"))
        .and(body_string("parentId=A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&["C"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_children(&server, "C", &["X"]).await;

    let (_, body) = get(router_with(&server, |b| b.token("tok-123")), "/api/dataset-ids").await;
    assert_eq!(body["code"], 200);
}

#[tokio::test]
async fn test_rotated_token_file_applies_to_next_request() {
    let server = MockServer::start().await;
    let token_file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(token_file.path(), "first\n").unwrap();

    for token in ["first", "second"] {
        Mock::given(method("GET"))
            .and(path(CATALOG_PATH))
            .and(header("Cookie", format!("isoftstone_token={token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&[token])))
            .expect(1)
            .mount(&server)
            .await;
    }

    let app = router_with(&server, |b| b.token("inline-ignored").token_file(token_file.path()));

    let (_, body) = get(app.clone(), "/api/dataset-ids").await;
    assert_eq!(body["code"], 404);
    assert_eq!(body["msg"], "no valid level-2 data");

    std::fs::write(token_file.path(), "second\n").unwrap();
    let (_, body) = get(app, "/api/dataset-ids").await;
    assert_eq!(body["msg"], "no valid level-2 data");
}

#[tokio::test]
async fn test_missing_token_file_reports_internal_error() {
    let server = MockServer::start().await;
    let app = router_with(&server, |b| b.token_file("/nonexistent/dataset-api/token"));

    let (status, body) = get(app, "/api/dataset-ids").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 500);
    assert!(
        body["msg"]
            .as_str()
            .unwrap()
            .starts_with("internal server error:")
    );
}

#[tokio::test]
async fn test_rest_status_mode_mirrors_domain_code() {
    let server = MockServer::start().await;
    mount_root(&server, envelope(&[])).await;

    let app = router_with(&server, |b| b.status_mode(StatusMode::Rest));
    let (status, body) = get(app, "/api/dataset-ids").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_fan_out_preserves_traversal_order() {
    let server = MockServer::start().await;
    mount_root(&server, envelope(&["A", "B", "C"])).await;
    mount_child_response(
        &server,
        "A",
        ResponseTemplate::new(200)
            .set_body_json(envelope(&["a1"]))
            .set_delay(Duration::from_millis(200)),
    )
    .await;
    mount_children(&server, "B", &["b1"]).await;
    mount_children(&server, "C", &["c1"]).await;
    mount_children(&server, "a1", &["x1", "x2"]).await;
    mount_children(&server, "b1", &["x3"]).await;
    mount_children(&server, "c1", &["x4"]).await;

    let (_, body) = get(router_with(&server, |b| b.fan_out(3)), "/api/dataset-ids").await;

    assert_eq!(
        body["data"]["items"],
        json!([
            {"datasetId": "x1"},
            {"datasetId": "x2"},
            {"datasetId": "x3"},
            {"datasetId": "x4"}
        ])
    );
    assert_eq!(body["data"]["count"], 4);
}

#[tokio::test]
async fn test_health_never_calls_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = get(router_with(&server, |b| b), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "service": "dataset-id-api"}));
}

#[tokio::test]
async fn test_root_banner_lists_endpoints() {
    let server = MockServer::start().await;
    let (status, body) = get(router_with(&server, |b| b), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["dataset_ids"], "/api/dataset-ids");
    assert_eq!(body["endpoints"]["health"], "/health");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
