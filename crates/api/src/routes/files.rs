//! Per-user file routes.
//!
//! Upload, search, download and delete under `/api/files`. Every JSON body
//! uses the [`ApiResponse`] envelope.

use std::io;

use axum::{
    Router,
    body::Body,
    extract::{Multipart, Query, State, multipart::MultipartRejection},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use futures::TryStreamExt;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::AppState;
use crate::response::{ApiResponse, error_response};
use docvault_core::files::{FileError, UploadRequest};
use docvault_core::keys::{self, StorageKey};
use docvault_shared::{AppError, EmptySearchPolicy};

/// Multipart part carrying the file content.
const FILE_FIELD: &str = "file";
/// Multipart part that may carry the user name instead of the query string.
const USER_NAME_FIELD: &str = "userName";

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        .route("/search", get(search_files))
        .route("/download", get(download_file))
        .route("/delete", delete(delete_file))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for upload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    /// Owner of the namespace.
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Query parameters for search.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Owner of the namespace.
    #[serde(default)]
    pub user_name: String,
    /// Substring to look for in the keys.
    #[serde(default)]
    pub search_term: Option<String>,
}

/// Query parameters addressing a single file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileParams {
    /// Owner of the namespace.
    #[serde(default)]
    pub user_name: String,
    /// File name inside the namespace.
    #[serde(default)]
    pub file_name: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a failed file operation and render it.
fn file_error_response(err: FileError) -> Response {
    if err.is_client_error() {
        warn!(error = %err, "File request rejected");
    } else {
        error!(error = %err, "File operation failed");
    }
    error_response(&AppError::from(err))
}

fn bad_request(msg: impl Into<String>) -> Response {
    file_error_response(FileError::invalid_input(msg))
}

/// Build `attachment; filename="..."`, escaping quotes and backslashes.
fn content_disposition(file_name: &str) -> HeaderValue {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Declared length of a multipart part, if the client sent one.
fn part_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/api/files/upload?userName=`
/// Upload a file for a user. Multipart, content in the `file` part.
async fn upload_file(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let mut user_name = params.user_name;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("malformed multipart body: {e}")),
        };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(USER_NAME_FIELD) => match field.text().await {
                Ok(text) => user_name = Some(text),
                Err(e) => return bad_request(format!("unreadable userName part: {e}")),
            },
            Some(FILE_FIELD) => {
                let Some(user_name) = user_name.take() else {
                    return bad_request("userName is required before the file part");
                };
                let Some(file_name) = field.file_name().map(str::to_owned) else {
                    return bad_request("file part must include a filename");
                };
                let content_type = field.content_type().map(str::to_owned);
                let size = part_length(field.headers());

                let mut request = UploadRequest::new(
                    user_name.clone(),
                    file_name,
                    field.map_err(io::Error::other),
                );
                request.content_type = content_type;
                request.size = size;

                return match state.files.upload_file(request).await {
                    Ok(key) => {
                        info!(user_name = %user_name, key = %key, "File uploaded");
                        ApiResponse::success(
                            StatusCode::CREATED,
                            "File uploaded successfully",
                            key.into_string(),
                        )
                        .into_response()
                    }
                    Err(e) => file_error_response(e),
                };
            }
            _ => {}
        }
    }

    bad_request("multipart body has no file part")
}

/// GET `/api/files/search?userName=&searchTerm=`
/// List a user's keys containing the search term.
async fn search_files(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(search_term) = params.search_term else {
        return bad_request("searchTerm is required");
    };

    match state.files.search_files(&params.user_name, &search_term).await {
        Ok(matches) if matches.is_empty() && state.empty_search == EmptySearchPolicy::NotFound => {
            error_response(&AppError::NotFound(
                "No files found matching the search term.".to_string(),
            ))
        }
        Ok(matches) => {
            info!(
                user_name = %params.user_name,
                search_term = %search_term,
                count = matches.len(),
                "Files searched"
            );
            let keys: Vec<String> = matches.into_iter().map(StorageKey::into_string).collect();
            ApiResponse::success(StatusCode::OK, "Files retrieved successfully", keys)
                .into_response()
        }
        Err(e) => file_error_response(e),
    }
}

/// GET `/api/files/download?userName=&fileName=`
/// Stream a file back as an attachment.
async fn download_file(
    State(state): State<AppState>,
    Query(params): Query<FileParams>,
) -> Response {
    let key = match keys::resolve_key(&params.user_name, &params.file_name) {
        Ok(key) => key,
        Err(e) => return file_error_response(e.into()),
    };

    let file = match state.files.download_file(key.as_str()).await {
        Ok(file) => file,
        Err(e) => return file_error_response(e),
    };

    info!(key = %file.key, size = file.size, "File download started");

    let content_type = file
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(file.size));
    headers.insert(CONTENT_DISPOSITION, content_disposition(file.key.file_name()));

    (StatusCode::OK, headers, Body::from_stream(file.content)).into_response()
}

/// DELETE `/api/files/delete?userName=&fileName=`
/// Delete a file. Deleting a missing file succeeds.
async fn delete_file(
    State(state): State<AppState>,
    Query(params): Query<FileParams>,
) -> Response {
    match state
        .files
        .delete_file(&params.user_name, &params.file_name)
        .await
    {
        Ok(()) => {
            info!(
                user_name = %params.user_name,
                file_name = %params.file_name,
                "File deleted"
            );
            ApiResponse::<()>::empty(StatusCode::OK, "File deleted successfully").into_response()
        }
        Err(e) => file_error_response(e),
    }
}


/// HTTP round trips against an in-memory object store.
#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::http::Request;
    use docvault_core::files::FileService;
    use docvault_core::storage::{StorageConfig, StorageProvider, StorageService};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::create_router;

    const BOUNDARY: &str = "docvault-test-boundary";

    fn test_state(empty_search: EmptySearchPolicy, max_file_size: u64) -> AppState {
        let config = StorageConfig::new(StorageProvider::Memory).with_max_file_size(max_file_size);
        let store = StorageService::from_config(config).expect("should create store");
        AppState::new(Arc::new(FileService::new(Arc::new(store))), empty_search)
    }

    fn default_state() -> AppState {
        test_state(EmptySearchPolicy::NotFound, 1024)
    }

    fn multipart_body(user_part: Option<&str>, file_name: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(user) = user_part {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"userName\"\r\n\r\n{user}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        create_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    async fn upload(state: &AppState, user: &str, file_name: &str, content: &[u8]) -> Response {
        send(
            state,
            upload_request(
                &format!("/api/files/upload?userName={user}"),
                multipart_body(None, file_name, content),
            ),
        )
        .await
    }

    #[tokio::test]
    async fn test_upload_returns_created_with_key() {
        let state = default_state();

        let response = upload(&state, "alice", "report.pdf", b"hello").await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["status"], 201);
        assert_eq!(body["message"], "File uploaded successfully");
        assert_eq!(body["data"], "alice/report.pdf");
    }

    #[tokio::test]
    async fn test_upload_accepts_user_name_form_field() {
        let state = default_state();

        let response = send(
            &state,
            upload_request(
                "/api/files/upload",
                multipart_body(Some("carol"), "notes.pdf", b"n"),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["data"], "carol/notes.pdf");
    }

    #[tokio::test]
    async fn test_download_streams_uploaded_content() {
        let state = default_state();
        upload(&state, "alice", "report.pdf", b"hello").await;

        let response = send(
            &state,
            get_request("/api/files/download?userName=alice&fileName=report.pdf"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"report.pdf\""
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_search_lists_matching_keys() {
        let state = default_state();
        upload(&state, "alice", "report.pdf", b"hello").await;
        upload(&state, "alice", "photo.png", b"img").await;

        let response = send(
            &state,
            get_request("/api/files/search?userName=alice&searchTerm=report"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"], serde_json::json!(["alice/report.pdf"]));
    }

    #[tokio::test]
    async fn test_search_without_matches_is_not_found_by_default() {
        let state = default_state();
        upload(&state, "alice", "report.pdf", b"hello").await;

        let response = send(
            &state,
            get_request("/api/files/search?userName=bob&searchTerm=report"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json_body(response).await;
        assert_eq!(body["error"], "NOT_FOUND");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_search_without_matches_can_return_empty_list() {
        let state = test_state(EmptySearchPolicy::EmptyList, 1024);

        let response = send(
            &state,
            get_request("/api/files/search?userName=bob&searchTerm=report"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_search_requires_term() {
        let response = send(&default_state(), get_request("/api/files/search?userName=bob")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_missing_returns_404() {
        let response = send(
            &default_state(),
            get_request("/api/files/download?userName=alice&fileName=missing.pdf"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["status"], 404);
    }

    #[tokio::test]
    async fn test_delete_then_download_returns_404() {
        let state = default_state();
        upload(&state, "alice", "report.pdf", b"hello").await;

        let response = send(
            &state,
            Request::builder()
                .method("DELETE")
                .uri("/api/files/delete?userName=alice&fileName=report.pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["message"],
            "File deleted successfully"
        );

        let response = send(
            &state,
            get_request("/api/files/download?userName=alice&fileName=report.pdf"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_missing_file_succeeds() {
        let response = send(
            &default_state(),
            Request::builder()
                .method("DELETE")
                .uri("/api/files/delete?userName=alice&fileName=ghost.pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_second_upload_overwrites() {
        let state = default_state();
        upload(&state, "alice", "report.pdf", b"first").await;
        upload(&state, "alice", "report.pdf", b"second").await;

        let response = send(
            &state,
            get_request("/api/files/download?userName=alice&fileName=report.pdf"),
        )
        .await;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"second");
    }

    #[tokio::test]
    async fn test_upload_without_user_name_is_bad_request() {
        let response = send(
            &default_state(),
            upload_request("/api/files/upload", multipart_body(None, "a.pdf", b"x")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_rejects_nested_file_name() {
        let response = upload(&default_state(), "alice", "docs/a.pdf", b"x").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_padded_user_name_is_rejected_everywhere() {
        let state = default_state();
        assert_eq!(
            upload(&state, "alice", "report.pdf", b"secret").await.status(),
            StatusCode::CREATED
        );

        for uri in [
            "/api/files/search?userName=%20alice&searchTerm=report",
            "/api/files/download?userName=%20alice&fileName=report.pdf",
            "/api/files/download?userName=alice&fileName=report.pdf%20",
        ] {
            let response = send(&state, get_request(uri)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }

        let response = upload(&state, "%20alice", "report.pdf", b"overwritten").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_payload_too_large() {
        let state = test_state(EmptySearchPolicy::NotFound, 4);

        let response = upload(&state, "alice", "big.bin", b"0123456789").await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = send(
            &state,
            get_request("/api/files/download?userName=alice&fileName=big.bin"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_requires_multipart() {
        let response = send(
            &default_state(),
            Request::builder()
                .method("POST")
                .uri("/api/files/upload?userName=alice")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
