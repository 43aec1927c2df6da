#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt as _;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt as _;

use serendib::content::ContentStore;
use serendib::http::{AppState, router};
use serendib::{currency, db};

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub upload_dir: std::path::PathBuf,
    pub content_dir: std::path::PathBuf,
    work_dir: TempDir,
}

pub async fn spawn() -> TestApp {
    spawn_with_feeds("http://127.0.0.1:1", "http://127.0.0.1:1").await
}

pub async fn spawn_with_feeds(currency_feed: &str, weather_feed: &str) -> TestApp {
    let work_dir = tempfile::tempdir().expect("create temp dir");
    let content_dir = work_dir.path().join("content");
    write_content(&content_dir);

    let database = work_dir.path().join("serendib.db");
    let pool = db::connect(&database, 2).await.expect("open database");
    db::init_schema(&pool).await.expect("init schema");

    let upload_dir = work_dir.path().join("uploads");
    let state = AppState {
        pool: pool.clone(),
        content: Arc::new(ContentStore::open(&content_dir).expect("load content")),
        http: currency::http_client().expect("build http client"),
        currency_feed: currency_feed.to_string(),
        weather_feed: weather_feed.to_string(),
        upload_dir: upload_dir.clone(),
        database_url_set: false,
    };

    TestApp {
        router: router(state),
        pool,
        upload_dir,
        content_dir,
        work_dir,
    }
}

fn write_content(dir: &std::path::Path) {
    std::fs::create_dir_all(dir.join("posts")).expect("create content dir");

    let document = serde_json::json!({
        "site": { "name": "Serendib Travel", "tagline": "The island, end to end" },
        "fleet": [
            {
                "id": "veh-prius",
                "name": "Toyota Prius",
                "vehicle_type": "Sedan",
                "passengers": 3,
                "price_per_day": 65.0,
                "image": "/media/fleet/prius.jpg"
            }
        ],
        "destination_categories": { "beach": "Beaches & Coast", "hills": "Hill Country" },
        "destinations": [
            {
                "id": "dst-mirissa",
                "slug": "mirissa",
                "name": "Mirissa",
                "description": "South-coast beach town",
                "image": "/media/destinations/mirissa.jpg",
                "categories": ["beach", "offbeat"],
                "latitude": 5.9485,
                "longitude": 80.4718
            },
            {
                "id": "dst-ella",
                "slug": "ella",
                "name": "Ella",
                "description": "Hill-country village",
                "image": "/media/destinations/ella.jpg",
                "categories": ["hills"],
                "latitude": 6.8667,
                "longitude": 81.0466
            }
        ],
        "tours": [
            {
                "id": "tour-classic",
                "slug": "classic-island-loop",
                "title": "Classic Island Loop",
                "duration_days": 7,
                "price": 980.0,
                "rating": 4.8,
                "highlights": ["Sigiriya at sunrise"],
                "itinerary": [
                    { "day": 1, "title": "Colombo to Sigiriya", "details": "Pickup and drive north." }
                ]
            }
        ],
        "faq": [
            {
                "category": "Booking",
                "items": [
                    { "question": "How far in advance?", "answer": "Two to three months in season." }
                ]
            }
        ],
        "posts": [
            {
                "slug": "mirissa-whale-season",
                "title": "When to see blue whales in Mirissa",
                "excerpt": "The season and the boats.",
                "date": "2026-01-12",
                "category": "wildlife"
            }
        ]
    });

    std::fs::write(
        dir.join("site.json"),
        serde_json::to_vec_pretty(&document).expect("serialize site.json"),
    )
    .expect("write site.json");
    std::fs::write(
        dir.join("posts").join("whale-season.md"),
        "# Whale season\n\nBlue whales pass close to shore.\n",
    )
    .expect("write post body");
}

pub async fn get(router: &Router, path: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");
    read_json(response).await
}

pub async fn send_json(
    router: &Router,
    method: &str,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("build request"),
        )
        .await
        .expect("send request");
    read_json(response).await
}

pub async fn delete(router: &Router, path: &str) -> StatusCode {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(path)
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");
    response.status()
}

async fn read_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, value)
}
