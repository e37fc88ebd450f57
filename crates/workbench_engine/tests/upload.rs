use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use workbench_engine::{ArtifactClient, ClientSettings, FailureKind, ReqwestArtifactClient};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestArtifactClient {
    ReqwestArtifactClient::new(ClientSettings {
        api_base: server.uri(),
        ..ClientSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn upload_sends_multipart_file_and_reads_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload_pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "srv-9", "pages": 14})),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let file = temp.path().join("facility.pdf");
    fs::write(&file, b"%PDF-1.4 test").unwrap();

    let receipt = client_for(&server).upload_pdf(&file).await.expect("upload ok");
    assert_eq!(receipt.id.as_deref(), Some("srv-9"));
    assert_eq!(receipt.pages, Some(14));
    assert_eq!(receipt.tag_key, "662d150c1c021efdffc61004e797114b");

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"facility.pdf\""));
}

#[tokio::test]
async fn unusable_page_count_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload_pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"pages": "many"})))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let file = temp.path().join("scan.pdf");
    fs::write(&file, b"x").unwrap();

    let receipt = client_for(&server).upload_pdf(&file).await.expect("upload ok");
    assert_eq!(receipt.id, None);
    assert_eq!(receipt.pages, None);
}

#[tokio::test]
async fn missing_file_is_an_io_failure() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    let err = client_for(&server)
        .upload_pdf(&temp.path().join("absent.pdf"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Io);
}

#[tokio::test]
async fn rejected_upload_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload_pdf"))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let file = temp.path().join("big.pdf");
    fs::write(&file, b"x").unwrap();

    let err = client_for(&server).upload_pdf(&file).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(413));
}

#[tokio::test]
async fn tags_are_posted_under_content_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tags"))
        .and(body_json(serde_json::json!({
            "tag_key": "662d150c1c021efdffc61004e797114b",
            "tags": ["loan", "2024"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .save_tags("662d150c1c021efdffc61004e797114b", &["loan".to_string(), "2024".to_string()])
        .await
        .expect("tags saved");
}

#[tokio::test]
async fn rejected_tag_update_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server).save_tags("k", &[]).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}
