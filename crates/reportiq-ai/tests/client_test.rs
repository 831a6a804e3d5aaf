//! Integration tests for the HTTP analysis client against a mock upstream.

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reportiq_ai::{AnalysisBackend, AnalysisClient, UploadFile};
use reportiq_core::Error;

#[tokio::test]
async fn summary_returns_upstream_body_verbatim() {
    let server = MockServer::start().await;
    let body = json!({ "summary": "Revenue grew 12%.", "basic_summary": { "total": 1200 } });
    Mock::given(method("GET"))
        .and(path("/analyze/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), None);
    let result = client.get_summary().await.unwrap();
    assert_eq!(result, body);
}

#[tokio::test]
async fn upstream_error_status_and_message_are_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analyze/kpi"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Report not analyzable",
            "details": "no tabular data found"
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), None);
    let err = client.get_kpi().await.unwrap_err();
    match err {
        Error::Upstream {
            status,
            message,
            details,
        } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Report not analyzable");
            assert_eq!(details.as_deref(), Some("no tabular data found"));
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn non_json_error_body_lands_in_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analyze/insights"))
        .respond_with(ResponseTemplate::new(500).set_body_string("segfault in model runner"))
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), None);
    let err = client.get_insights().await.unwrap_err();
    match err {
        Error::Upstream {
            status, details, ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(details.as_deref(), Some("segfault in model runner"));
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_upstream_is_unavailable() {
    // Port 1 refuses connections immediately.
    let client = AnalysisClient::with_config("http://127.0.0.1:1".to_string(), None);
    let err = client.get_summary().await.unwrap_err();
    assert!(matches!(err, Error::Unavailable(_)), "got {:?}", err);
    assert_eq!(err.status_code(), 503);
}

#[tokio::test]
async fn api_key_is_sent_as_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("authorization", "Bearer secret-key"))
        .and(body_partial_json(json!({ "query": "total revenue?", "report_id": "r1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "42" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), Some("secret-key".to_string()));
    let result = client.query("total revenue?", Some("r1")).await.unwrap();
    assert_eq!(result["answer"], "42");
}

#[tokio::test]
async fn upload_posts_multipart_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reportId": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), None);
    let result = client
        .upload_report(UploadFile {
            filename: "q3.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.4 body".to_vec(),
            uploaded_at: "2026-08-26T10:00:00Z".to_string(),
            uploaded_by: None,
        })
        .await
        .unwrap();
    assert_eq!(result["reportId"], "fresh");
}

#[tokio::test]
async fn upload_forwards_receipt_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze/upload"))
        .and(body_string_contains("originalName"))
        .and(body_string_contains("q3.pdf"))
        .and(body_string_contains("mimetype"))
        .and(body_string_contains("uploadedAt"))
        .and(body_string_contains("2026-08-26T10:00:00Z"))
        .and(body_string_contains("uploadedBy"))
        .and(body_string_contains("203.0.113.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reportId": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), None);
    client
        .upload_report(UploadFile {
            filename: "q3.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.4 body".to_vec(),
            uploaded_at: "2026-08-26T10:00:00Z".to_string(),
            uploaded_by: Some("203.0.113.9".to_string()),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn chat_sends_message_and_context_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze/chat"))
        .and(body_partial_json(json!({
            "message": "How did Q2 go?",
            "include_data_context": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "up 3%",
            "data_context_included": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), None);
    let result = client.chat("How did Q2 go?", true).await.unwrap();
    assert_eq!(result["response"], "up 3%");
}

#[tokio::test]
async fn health_probe_never_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), None);
    let doc = client.check_health().await;
    assert_eq!(doc["status"], "unhealthy");
    assert_eq!(doc["statusCode"], 500);

    let dead = AnalysisClient::with_config("http://127.0.0.1:1".to_string(), None);
    let doc = dead.check_health().await;
    assert_eq!(doc["status"], "unreachable");
}

#[tokio::test]
async fn status_returns_raw_document() {
    let server = MockServer::start().await;
    let doc = json!({
        "ai_ready": false,
        "embedding_status": { "status": "processing", "progress": 40 }
    });
    Mock::given(method("GET"))
        .and(path("/analyze/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&doc))
        .mount(&server)
        .await;

    let client = AnalysisClient::with_config(server.uri(), None);
    let result = client.get_status().await.unwrap();
    assert_eq!(result, doc);
}
