//! End-to-end exercise of the upload routes against a real filesystem
//! root, driving the router directly.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::util::ServiceExt;

use landrop_server::{AppState, ServerOptions, router};
use landrop_transfer::{TEMP_DIR_NAME, checksum_bytes};

const MIB: usize = 1024 * 1024;
const BOUNDARY: &str = "landrop-test-boundary";

fn app(root: &TempDir, chunk_size: u64) -> Router {
    let mut options = ServerOptions::new(root.path());
    options.chunk_size = chunk_size;
    let state = AppState::new(options).unwrap();
    router(Arc::new(state))
}

fn multipart_body(text_fields: &[(&str, String)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_upload(
    app: &Router,
    text_fields: &[(&str, String)],
    file: Option<(&str, &[u8])>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(text_fields, file)))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn send_chunk(
    app: &Router,
    file_name: &str,
    dest: &str,
    index: u32,
    total: u32,
    offset: u64,
    upload_id: Option<&str>,
    data: &[u8],
) -> (StatusCode, serde_json::Value) {
    let mut fields = vec![
        ("path", dest.to_string()),
        ("chunkIndex", index.to_string()),
        ("totalChunks", total.to_string()),
        ("fileName", file_name.to_string()),
        ("offset", offset.to_string()),
        ("checksum", checksum_bytes(data)),
    ];
    if let Some(id) = upload_id {
        fields.push(("uploadId", id.to_string()));
    }
    post_upload(app, &fields, Some((file_name, data))).await
}

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31) % 251) as u8).collect()
}

#[tokio::test]
async fn whole_file_upload_creates_record_and_file() {
    let root = TempDir::new().unwrap();
    let app = app(&root, 5 * MIB as u64);
    let data = patterned(3 * MIB);

    let (status, json) = post_upload(
        &app,
        &[("path", "docs".into())],
        Some(("report.bin", &data)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["uploadPath"], "docs");
    let record = &json["files"][0];
    assert_eq!(record["name"], "report.bin");
    assert_eq!(record["size"], 3 * MIB as u64);
    assert_eq!(record["relativePath"], "docs/report.bin");
    // Whole-file responses carry no chunk bookkeeping.
    assert!(json.get("completed").is_none());

    assert_eq!(
        std::fs::read(root.path().join("docs/report.bin")).unwrap(),
        data
    );
}

#[tokio::test]
async fn twelve_mib_in_three_chunks_reassembles_exactly() {
    let root = TempDir::new().unwrap();
    let app = app(&root, 5 * MIB as u64);
    let data = patterned(12 * MIB);

    // 12 MiB at a 5 MiB threshold: chunks of 5, 5 and 2 MiB.
    let (status, json) = send_chunk(
        &app, "video.bin", "", 0, 3, 0, None, &data[..5 * MIB],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["completed"], false);
    assert_eq!(json["chunkIndex"], 0);
    assert_eq!(json["totalChunks"], 3);
    let upload_id = json["uploadId"].as_str().unwrap().to_string();

    let (status, json) = send_chunk(
        &app,
        "video.bin",
        "",
        1,
        3,
        5 * MIB as u64,
        Some(&upload_id),
        &data[5 * MIB..10 * MIB],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["completed"], false);

    let (status, json) = send_chunk(
        &app,
        "video.bin",
        "",
        2,
        3,
        10 * MIB as u64,
        Some(&upload_id),
        &data[10 * MIB..],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["completed"], true);
    let record = &json["files"][0];
    assert_eq!(record["size"], 12 * MIB as u64);
    assert_eq!(record["name"], "video.bin");

    assert_eq!(std::fs::read(root.path().join("video.bin")).unwrap(), data);

    // The temp accumulator is gone after promotion.
    let leftovers: Vec<_> = std::fs::read_dir(root.path().join(TEMP_DIR_NAME))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn duplicated_chunk_delivery_is_idempotent() {
    let root = TempDir::new().unwrap();
    let app = app(&root, MIB as u64);
    let data = patterned(2 * MIB + 123);

    let (_, json) = send_chunk(&app, "dup.bin", "", 0, 3, 0, None, &data[..MIB]).await;
    let upload_id = json["uploadId"].as_str().unwrap().to_string();

    // A lost response makes the client resend chunk 1 verbatim.
    for _ in 0..2 {
        let (status, _) = send_chunk(
            &app,
            "dup.bin",
            "",
            1,
            3,
            MIB as u64,
            Some(&upload_id),
            &data[MIB..2 * MIB],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = send_chunk(
        &app,
        "dup.bin",
        "",
        2,
        3,
        2 * MIB as u64,
        Some(&upload_id),
        &data[2 * MIB..],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["completed"], true);

    assert_eq!(std::fs::read(root.path().join("dup.bin")).unwrap(), data);
}

#[tokio::test]
async fn completing_over_an_existing_name_suffixes_instead_of_overwriting() {
    let root = TempDir::new().unwrap();
    let app = app(&root, 5 * MIB as u64);

    for expected in ["x.txt", "x_1.txt", "x_2.txt"] {
        let (status, json) =
            post_upload(&app, &[("path", "".into())], Some(("x.txt", b"payload"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["files"][0]["name"], expected);
        assert_eq!(json["files"][0]["originalName"], "x.txt");
    }

    assert!(root.path().join("x.txt").exists());
    assert!(root.path().join("x_1.txt").exists());
    assert!(root.path().join("x_2.txt").exists());
}

#[tokio::test]
async fn out_of_range_chunk_index_is_rejected() {
    let root = TempDir::new().unwrap();
    let app = app(&root, 5 * MIB as u64);

    let (status, json) = send_chunk(&app, "bad.bin", "", 3, 3, 1, Some("aaaa"), b"data").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("chunkIndex"));
}

#[tokio::test]
async fn partial_chunk_fields_are_rejected() {
    let root = TempDir::new().unwrap();
    let app = app(&root, 5 * MIB as u64);

    // chunkIndex without totalChunks/fileName.
    let (status, json) = post_upload(
        &app,
        &[("path", "".into()), ("chunkIndex", "0".into())],
        Some(("odd.bin", b"data")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("together"));
}

#[tokio::test]
async fn traversal_destination_is_rejected() {
    let root = TempDir::new().unwrap();
    let app = app(&root, 5 * MIB as u64);

    let (status, json) = post_upload(
        &app,
        &[("path", "../escape".into())],
        Some(("evil.bin", b"data")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("invalid path"));
}

#[tokio::test]
async fn chunk_for_unknown_session_is_rejected() {
    let root = TempDir::new().unwrap();
    let app = app(&root, MIB as u64);

    let (status, json) = send_chunk(
        &app,
        "ghost.bin",
        "",
        1,
        3,
        MIB as u64,
        Some("deadbeefdeadbeef"),
        b"data",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("session"));
}

#[tokio::test]
async fn later_chunk_without_upload_id_is_rejected() {
    let root = TempDir::new().unwrap();
    let app = app(&root, MIB as u64);

    let (status, json) =
        send_chunk(&app, "no-id.bin", "", 1, 3, MIB as u64, None, b"data").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("uploadId"));
}

#[tokio::test]
async fn corrupted_chunk_checksum_is_rejected() {
    let root = TempDir::new().unwrap();
    let app = app(&root, MIB as u64);

    let fields = [
        ("path", String::new()),
        ("chunkIndex", "0".into()),
        ("totalChunks", "2".into()),
        ("fileName", "sum.bin".into()),
        ("offset", "0".into()),
        ("checksum", "0".repeat(64)),
    ];
    let (status, json) = post_upload(&app, &fields, Some(("sum.bin", b"not-matching"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("checksum"));
}

#[tokio::test]
async fn list_download_delete_flow() {
    let root = TempDir::new().unwrap();
    let app = app(&root, 5 * MIB as u64);
    let data = patterned(4096);

    post_upload(&app, &[("path", "inbox".into())], Some(("keep.bin", &data))).await;

    let (status, json) = get_json(&app, "/api/files?path=inbox").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "inbox");
    assert_eq!(json["files"][0]["name"], "keep.bin");
    assert_eq!(json["files"][0]["relativePath"], "inbox/keep.bin");

    let request = Request::builder()
        .uri("/api/download?path=inbox/keep.bin")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"keep.bin\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), data.as_slice());

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/files?path=inbox/keep.bin")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, json) = get_json(&app, "/api/files?path=inbox").await;
    assert!(json["files"].as_array().unwrap().is_empty());

    let request = Request::builder()
        .uri("/api/download?path=inbox/keep.bin")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_reports_usage_and_limits() {
    let root = TempDir::new().unwrap();
    let app = app(&root, 5 * MIB as u64);

    post_upload(&app, &[("path", "".into())], Some(("a.bin", &[0u8; 2048]))).await;

    let (status, json) = get_json(&app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["usedBytes"], 2048);
    assert_eq!(json["usedFormatted"], "2 KB");
    assert_eq!(json["chunkSize"], 5 * MIB as u64);
}
