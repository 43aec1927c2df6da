mod common;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use axum::http::StatusCode;
use common::{get, spawn_with_feeds};

enum FeedMode {
    CurrencyOk,
    WeatherRainy,
    ServerError,
}

fn spawn_feed_server(mode: FeedMode) -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let addr = server.server_addr();
    let base_url = format!("http://{addr}");

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let (status, body) = match mode {
                FeedMode::CurrencyOk => (
                    200,
                    r#"{"rates":{"USD":1.0,"EUR":0.92,"GBP":0.79,"AUD":1.53,"SGD":1.34}}"#
                        .to_string(),
                ),
                FeedMode::WeatherRainy => (
                    200,
                    r#"{"current_weather":{"temperature":27.4,"weathercode":61}}"#.to_string(),
                ),
                FeedMode::ServerError => (500, r#"{"error":"boom"}"#.to_string()),
            };

            let mut resp = tiny_http::Response::from_string(body).with_status_code(status);
            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                    .expect("content-type header");
            resp.add_header(header);
            let _ = request.respond(resp);
        }
    });

    (base_url, shutdown_tx, handle)
}

#[tokio::test]
async fn currency_derives_whole_lkr_rates_from_the_feed() {
    let (feed_url, shutdown_tx, handle) = spawn_feed_server(FeedMode::CurrencyOk);
    let app = spawn_with_feeds(&feed_url, "http://127.0.0.1:1").await;

    let (status, body) = get(&app.router, "/currency").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "live");
    assert_eq!(body["rates"]["USD"], 320);
    assert_eq!(body["rates"]["EUR"], 348);

    let _ = shutdown_tx.send(());
    let _ = handle.join();
}

#[tokio::test]
async fn currency_feed_error_serves_the_static_table() {
    let (feed_url, shutdown_tx, handle) = spawn_feed_server(FeedMode::ServerError);
    let app = spawn_with_feeds(&feed_url, "http://127.0.0.1:1").await;

    let (status, body) = get(&app.router, "/currency").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["rates"]["USD"], 320);
    assert_eq!(body["rates"]["EUR"], 348);

    let _ = shutdown_tx.send(());
    let _ = handle.join();
}

#[tokio::test]
async fn weather_maps_the_feed_code_to_a_condition() {
    let (feed_url, shutdown_tx, handle) = spawn_feed_server(FeedMode::WeatherRainy);
    let app = spawn_with_feeds("http://127.0.0.1:1", &feed_url).await;

    let (status, body) = get(&app.router, "/weather?destination=mirissa").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "live");
    assert_eq!(body["condition"], "rainy");
    assert_eq!(body["temperature_c"], 27.4);

    let _ = shutdown_tx.send(());
    let _ = handle.join();
}

#[tokio::test]
async fn weather_feed_failure_serves_the_fallback_condition() {
    let app = spawn_with_feeds("http://127.0.0.1:1", "http://127.0.0.1:1").await;

    let (status, body) = get(&app.router, "/weather?destination=ella").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["condition"], "cloudy");
}

#[tokio::test]
async fn weather_validates_the_destination_parameter() {
    let app = spawn_with_feeds("http://127.0.0.1:1", "http://127.0.0.1:1").await;

    let (status, body) = get(&app.router, "/weather").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "destination is required");

    let (status, _) = get(&app.router, "/weather?destination=atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
