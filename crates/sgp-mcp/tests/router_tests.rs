//! HTTP router tests.
//!
//! Drive the axum router in-process with `tower::ServiceExt::oneshot` against a
//! mocked SGP API.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sgp_mcp::config::Config;
use sgp_mcp::server::SgpServer;

fn server_for(mock_server: &MockServer) -> SgpServer {
    SgpServer::new(Config::for_testing(&mock_server.uri())).unwrap()
}

fn post_tool(name: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/tools/{name}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let mock_server = MockServer::start().await;
    let server = server_for(&mock_server);

    let response = server
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tools"], 8);
}

#[tokio::test]
async fn test_list_tools() {
    let mock_server = MockServer::start().await;
    let server = server_for(&mock_server);

    let response = server
        .router()
        .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let names: Vec<&str> = body.as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"list_onus"));
    assert!(names.contains(&"open_ticket"));
    assert!(body[0]["inputSchema"]["properties"]["authMethod"].is_object());
}

#[tokio::test]
async fn test_unknown_tool_is_404() {
    let mock_server = MockServer::start().await;
    let server = server_for(&mock_server);

    let response = server.router().oneshot(post_tool("nope", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_success_is_200_with_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ftth/onu/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&mock_server)
        .await;

    let server = server_for(&mock_server);
    let response = server.router().oneshot(post_tool("get_onu_details", json!({"onuId": 7}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["id"], 7);
}

#[tokio::test]
async fn test_upstream_error_is_502() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ura/verificaacesso/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let server = server_for(&mock_server);
    let response = server.router().oneshot(post_tool("check_access", json!({"contrato": 1}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["message"], "HTTP 503: maintenance");
}

#[tokio::test]
async fn test_invalid_input_is_400() {
    let mock_server = MockServer::start().await;
    let server = server_for(&mock_server);

    let response = server.router().oneshot(post_tool("check_access", json!({"contrato": 0}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bad_json = Request::builder()
        .method("POST")
        .uri("/tools/check_access")
        .body(Body::from("{not json"))
        .unwrap();
    let response = server.router().oneshot(bad_json).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_credentials_is_400() {
    let mock_server = MockServer::start().await;
    let server = server_for(&mock_server);

    let response = server
        .router()
        .oneshot(post_tool("check_access", json!({"contrato": 1, "authMethod": "cpf_cnpj"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("cpfcnpj"));
}

#[tokio::test]
async fn test_rate_limited_is_429_with_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let mut config = Config::for_testing(&mock_server.uri());
    config.rate_limits.token = 1;
    let server = SgpServer::new(config).unwrap();

    let first = server.router().oneshot(post_tool("check_access", json!({"contrato": 1}))).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = server.router().oneshot(post_tool("check_access", json!({"contrato": 1}))).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = second.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));
}

#[tokio::test]
async fn test_tenant_headers_select_separate_client() {
    let default_server = MockServer::start().await;
    let tenant_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ftth/onu/1"))
        .and(query_param("token", "tenant-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tenant": "b"})))
        .expect(1)
        .mount(&tenant_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&default_server)
        .await;

    let server = server_for(&default_server);

    let request = Request::builder()
        .method("POST")
        .uri("/tools/get_onu_details")
        .header("x-sgp-url", tenant_server.uri())
        .header("x-sgp-token", "tenant-token")
        .body(Body::from(json!({"onuId": 1}).to_string()))
        .unwrap();

    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["tenant"], "b");
    assert_eq!(server.tenants().len(), 2);
}

#[tokio::test]
async fn test_invalid_tenant_url_is_400() {
    let mock_server = MockServer::start().await;
    let server = server_for(&mock_server);

    let request = Request::builder()
        .method("POST")
        .uri("/tools/check_access")
        .header("x-sgp-url", "not a url")
        .body(Body::from(json!({"contrato": 1}).to_string()))
        .unwrap();

    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.tenants().len(), 1);
}
