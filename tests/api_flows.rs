use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use describebot::api::router;
use describebot::tests::util::{ai_config_for, chat_completion_body, test_service};
use describebot::{DescriptionService, History, ServiceSettings};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn openai_replying(status: u16, content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(status).set_body_raw(chat_completion_body(content), "application/json"),
        )
        .mount(&server)
        .await;
    server
}

fn chat_url(server: &MockServer) -> String {
    format!("{}/v1/chat/completions", server.uri())
}

fn describe_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/describe")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn form_request(title: &str) -> Request<Body> {
    let boundary = "XBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"image_url\"\r\n\r\n\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"image_file\"; filename=\"foto.png\"\r\nContent-Type: image/png\r\n\r\npng-bytes\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n\
         --{b}--\r\n",
        b = boundary
    );
    Request::builder()
        .method("POST")
        .uri("/describe")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn describe_then_list_and_download() {
    let server = openai_replying(200, "Danzantes con máscaras.").await;
    let dir = tempdir().unwrap();
    let app = router(test_service(dir.path(), ai_config_for(&chat_url(&server))));

    let response = app
        .clone()
        .oneshot(describe_request(json!({
            "image_url": "https://example.com/a.jpg",
            "title": "Qhapaq Qolla"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key("x-request-id"));
    let created: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(created["descripcion"], "Qhapaq Qolla");
    assert_eq!(created["generated_description"], "Danzantes con máscaras.");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/history").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);

    let response = app
        .oneshot(Request::builder().uri("/api/history.csv").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"historial.csv\""
    );
    let csv = body_text(response).await;
    assert!(csv.starts_with("imagen;descripcion;generated_description"));
    assert!(csv.contains("Qhapaq Qolla"));
}

#[tokio::test]
async fn empty_title_is_bad_request() {
    let server = openai_replying(200, "unused").await;
    let dir = tempdir().unwrap();
    let app = router(test_service(dir.path(), ai_config_for(&chat_url(&server))));

    let response = app
        .oneshot(describe_request(json!({
            "image_url": "https://example.com/a.jpg",
            "title": "  "
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let server = openai_replying(500, "boom").await;
    let dir = tempdir().unwrap();
    let service = test_service(dir.path(), ai_config_for(&chat_url(&server)));
    let app = router(service.clone());

    let response = app
        .oneshot(describe_request(json!({
            "image_url": "https://example.com/a.jpg",
            "title": "Saqra"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("500"));
    assert!(service.records().await.is_empty());
}

#[tokio::test]
async fn index_renders_form() {
    let server = openai_replying(200, "unused").await;
    let dir = tempdir().unwrap();
    let app = router(test_service(dir.path(), ai_config_for(&chat_url(&server))));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("Generar Descripción"));
}

#[tokio::test]
async fn form_upload_generates_description() {
    let server = openai_replying(200, "Una comparsa.").await;
    let dir = tempdir().unwrap();
    let service = test_service(dir.path(), ai_config_for(&chat_url(&server)));
    let app = router(service.clone());

    let response = app.oneshot(form_request("Comparsa")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Una comparsa."));

    let records = service.records().await;
    assert_eq!(records.len(), 1);
    assert!(records[0].image.contains("imagen_cargada_"));
    assert!(records[0].image.ends_with("_foto.png"));
}

#[tokio::test]
async fn form_without_title_stores_no_upload() {
    let server = openai_replying(200, "unused").await;
    let dir = tempdir().unwrap();
    let app = router(test_service(dir.path(), ai_config_for(&chat_url(&server))));

    let response = app.oneshot(form_request("  ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Ingrese un título"));
    assert!(!dir.path().join("subidas").exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn local_storage_failure_is_internal_error() {
    let server = openai_replying(200, "Danzantes.").await;
    let dir = tempdir().unwrap();
    // The history path is a directory, so appending fails after the model replied.
    let service = DescriptionService::new(
        History::empty(dir.path()),
        ai_config_for(&chat_url(&server)),
        ServiceSettings {
            upload_dir: dir.path().join("subidas"),
            record_timestamp: false,
            ..ServiceSettings::default()
        },
    );
    let app = router(service.clone());

    let response = app
        .oneshot(describe_request(json!({
            "image_url": "https://example.com/a.jpg",
            "title": "Saqra"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(service.records().await.is_empty());
}

#[tokio::test]
async fn web_bind_failure_stops_bot() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();
    let dir = tempdir().unwrap();
    let service = test_service(dir.path(), ai_config_for("http://127.0.0.1:9/unused"));

    let err = describebot::run_alongside(std::future::pending(), addr, service)
        .await
        .unwrap_err();
    let text = format!("{err:#}");
    assert!(text.contains("web server stopped"));
    assert!(text.contains("failed to bind"));
}
