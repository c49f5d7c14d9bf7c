use doc_transcribe::services::transcription::{
    GeminiTranscriber, TRANSCRIPTION_INSTRUCTION, TranscriptionClient, TranscriptionError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";
const MODEL: &str = "gemini-test";

fn transcriber(server: &MockServer) -> GeminiTranscriber {
    GeminiTranscriber::new(
        API_KEY.to_string(),
        Some(format!("{}/", server.uri())),
        Some(MODEL.to_string()),
    )
}

async fn mount_upload(server: &MockServer, state: &str) {
    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(header("x-goog-api-key", API_KEY))
        .and(header("x-goog-upload-command", "start"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-goog-upload-url", format!("{}/upload-session/1", server.uri())),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .and(header("x-goog-upload-offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {
                "name": "files/abc123",
                "uri": format!("{}/v1beta/files/abc123", server.uri()),
                "mimeType": "application/pdf",
                "state": state
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_delete(server: &MockServer) {
    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(server)
        .await;
}

fn generate_path() -> String {
    format!("/v1beta/models/{}:generateContent", MODEL)
}

#[tokio::test]
async fn test_transcribe_uploads_generates_and_cleans_up() {
    let server = MockServer::start().await;
    mount_upload(&server, "ACTIVE").await;
    mount_delete(&server).await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .and(header("x-goog-api-key", API_KEY))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "fileData": { "mimeType": "application/pdf" } },
                    { "text": TRANSCRIPTION_INSTRUCTION }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Page 1\n" }, { "text": "Page 2" }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = transcriber(&server)
        .transcribe("report.pdf", b"%PDF-1.7", TRANSCRIPTION_INSTRUCTION)
        .await
        .unwrap();

    assert_eq!(text, "Page 1\nPage 2");
}

#[tokio::test]
async fn test_empty_candidates_is_empty_response() {
    let server = MockServer::start().await;
    mount_upload(&server, "ACTIVE").await;
    mount_delete(&server).await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = transcriber(&server)
        .transcribe("report.pdf", b"%PDF-1.7", TRANSCRIPTION_INSTRUCTION)
        .await
        .unwrap_err();

    assert!(matches!(err, TranscriptionError::EmptyResponse));
}

#[tokio::test]
async fn test_generation_error_still_deletes_remote_file() {
    let server = MockServer::start().await;
    mount_upload(&server, "ACTIVE").await;
    mount_delete(&server).await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let err = transcriber(&server)
        .transcribe("report.pdf", b"%PDF-1.7", TRANSCRIPTION_INSTRUCTION)
        .await
        .unwrap_err();

    match err {
        TranscriptionError::Generation(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("backend exploded"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_upload_is_upload_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let err = transcriber(&server)
        .transcribe("report.pdf", b"%PDF-1.7", TRANSCRIPTION_INSTRUCTION)
        .await
        .unwrap_err();

    assert!(matches!(err, TranscriptionError::Upload(ref m) if m.contains("403")));
}

#[tokio::test]
async fn test_waits_for_processing_file() {
    let server = MockServer::start().await;
    mount_upload(&server, "PROCESSING").await;
    mount_delete(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "files/abc123",
            "uri": format!("{}/v1beta/files/abc123", server.uri()),
            "mimeType": "application/pdf",
            "state": "ACTIVE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ready" }] } }]
        })))
        .mount(&server)
        .await;

    let text = transcriber(&server)
        .transcribe("report.pdf", b"%PDF-1.7", TRANSCRIPTION_INSTRUCTION)
        .await
        .unwrap();

    assert_eq!(text, "ready");
}

#[tokio::test]
async fn test_failed_file_state_still_deletes_remote_file() {
    let server = MockServer::start().await;
    mount_upload(&server, "FAILED").await;
    mount_delete(&server).await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = transcriber(&server)
        .transcribe("report.pdf", b"%PDF-1.7", TRANSCRIPTION_INSTRUCTION)
        .await
        .unwrap_err();

    assert!(matches!(err, TranscriptionError::Upload(ref m) if m.contains("files/abc123")));
}
