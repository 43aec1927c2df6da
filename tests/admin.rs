mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{get, spawn};
use http_body_util::BodyExt as _;
use tower::ServiceExt as _;

#[tokio::test]
async fn healthz_answers_ok() {
    let app = spawn().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn fix_db_is_idempotent() {
    let app = spawn().await;

    let (status, first) = get(&app.router, "/fix-db").await;
    assert_eq!(status, StatusCode::OK);
    for entry in first.as_array().unwrap() {
        assert_ne!(entry["outcome"], "failed", "first run: {entry}");
    }

    let (status, second) = get(&app.router, "/fix-db").await;
    assert_eq!(status, StatusCode::OK);
    for entry in second.as_array().unwrap() {
        assert_eq!(entry["outcome"], "already_applied", "second run: {entry}");
    }
}

#[tokio::test]
async fn diagnose_reports_tables_and_connectivity() {
    let app = spawn().await;

    let (status, body) = get(&app.router, "/diagnose").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connectivity"], "ok");
    assert_eq!(body["database_url_set"], false);
    assert_eq!(body["tables"]["inquiries"], 0);
}

#[tokio::test]
async fn upload_sanitizes_the_filename_and_serves_the_file() {
    let app = spawn().await;

    let boundary = "serendib-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"../beach photo.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         fake-jpeg-bytes\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["url"], "/media/beach-photo.jpg");

    let stored = std::fs::read(app.upload_dir.join("beach-photo.jpg")).unwrap();
    assert_eq!(stored, b"fake-jpeg-bytes");

    // And the static file route serves it back.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/media/beach-photo.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_without_a_file_field_is_rejected() {
    let app = spawn().await;

    let boundary = "serendib-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"other\"\r\n\r\n\
         hello\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reload_content_swaps_in_edits_made_on_disk() {
    let app = spawn().await;

    // Edit site.json behind the running server's back.
    let site_path = app.content_dir.join("site.json");
    let raw = std::fs::read_to_string(&site_path).unwrap();
    let mut document: serde_json::Value = serde_json::from_str(&raw).unwrap();
    document["site"]["name"] = serde_json::json!("Serendib Travel (2026)");
    std::fs::write(&site_path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();

    // The snapshot is immutable until the reload boundary is crossed.
    let (_, before) = get(&app.router, "/site-config").await;
    assert_eq!(before["name"], "Serendib Travel");

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/reload-content")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, after) = get(&app.router, "/site-config").await;
    assert_eq!(after["name"], "Serendib Travel (2026)");
}
