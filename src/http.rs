use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::{ContentStore, Destination, Vehicle, render_markdown};
use crate::db::{self, StoreError};
use crate::gallery::NewGalleryImage;
use crate::inquiry::NewInquiry;
use crate::memories::NewMemory;
use crate::reviews::{NewReview, ReviewPatch};
use crate::{currency, gallery, inquiry, memories, resolve, reviews, upload, weather};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub content: Arc<ContentStore>,
    pub http: reqwest::Client,
    pub currency_feed: String,
    pub weather_feed: String,
    pub upload_dir: PathBuf,
    pub database_url_set: bool,
}

/// JSON error body with the matching status code. Store and IO details are
/// logged server-side; callers get a short generic message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "not found".to_string(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::not_found(),
            other => {
                tracing::error!(error = %other, "store error");
                ApiError::internal()
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    let media = ServeDir::new(state.upload_dir.clone());

    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/pages/home", get(page_home))
        .route("/destinations", get(destinations_list).post(destinations_overwrite))
        .route("/destinations/:slug", get(destination_by_slug))
        .route("/tours", get(tours_list))
        .route("/tours/:slug", get(tour_by_slug))
        .route("/blog", get(blog_list))
        .route("/blog/:slug", get(blog_by_slug))
        .route("/faq", get(faq_list))
        .route("/site-config", get(site_config))
        .route("/fleet", get(fleet_list).post(fleet_create))
        .route("/reviews", get(reviews_list).post(reviews_create))
        .route("/reviews/:id", axum::routing::put(reviews_update).delete(reviews_delete))
        .route("/gallery", get(gallery_list).post(gallery_create))
        .route("/gallery/:id", axum::routing::delete(gallery_delete))
        .route("/tourist-memories", get(memories_list).post(memories_create))
        .route("/tourist-memories/:id", axum::routing::delete(memories_delete))
        .route("/inquiry", get(inquiry_list).post(inquiry_create))
        .route("/currency", get(currency_rates))
        .route("/weather", get(weather_report))
        .route("/content", get(content_dump))
        .route("/upload", post(upload_media))
        .route("/fix-db", get(fix_db))
        .route("/diagnose", get(diagnose))
        .route("/admin/reload-content", post(reload_content))
        .nest_service("/media", media)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn page_home(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.content.snapshot();

    let fleet = resolve::fleet(&state.pool, &snapshot).await;
    let destinations = resolve::destinations(&state.pool, &snapshot).await;
    let tours = resolve::tours(&state.pool, &snapshot).await;
    let posts = resolve::posts(&state.pool, &snapshot).await;
    let site = resolve::site_config(&state.pool, &snapshot).await;
    let featured_reviews = reviews::list(&state.pool, true).await?;

    Ok(Json(serde_json::json!({
        "site": site.value(),
        "fleet": fleet.value(),
        "destinations": destinations.value(),
        "tours": tours.value(),
        "posts": posts.value(),
        "featured_reviews": featured_reviews,
    })))
}

async fn destinations_list(State(state): State<AppState>) -> Json<Vec<resolve::DestinationView>> {
    let snapshot = state.content.snapshot();
    Json(resolve::destinations(&state.pool, &snapshot).await.into_value())
}

async fn destination_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<resolve::DestinationView>, ApiError> {
    let snapshot = state.content.snapshot();
    let destinations = resolve::destinations(&state.pool, &snapshot).await.into_value();
    destinations
        .into_iter()
        .find(|d| d.slug == slug)
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// Admin full-document overwrite of the static destinations section.
async fn destinations_overwrite(
    State(state): State<AppState>,
    Json(destinations): Json<Vec<Destination>>,
) -> Result<StatusCode, ApiError> {
    if destinations.is_empty() {
        return Err(ApiError::bad_request("destinations must not be empty"));
    }
    state
        .content
        .overwrite_destinations(destinations)
        .map_err(|err| {
            tracing::error!(error = %format!("{err:#}"), "overwrite destinations");
            ApiError::internal()
        })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn tours_list(State(state): State<AppState>) -> Json<Vec<crate::content::Tour>> {
    let snapshot = state.content.snapshot();
    Json(resolve::tours(&state.pool, &snapshot).await.into_value())
}

async fn tour_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<crate::content::Tour>, ApiError> {
    let snapshot = state.content.snapshot();
    resolve::tours(&state.pool, &snapshot)
        .await
        .into_value()
        .into_iter()
        .find(|t| t.slug == slug)
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

async fn blog_list(State(state): State<AppState>) -> Json<Vec<crate::content::PostMeta>> {
    let snapshot = state.content.snapshot();
    Json(resolve::posts(&state.pool, &snapshot).await.into_value())
}

async fn blog_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.content.snapshot();
    let meta = resolve::posts(&state.pool, &snapshot)
        .await
        .into_value()
        .into_iter()
        .find(|p| p.slug == slug)
        .ok_or_else(ApiError::not_found)?;

    let body = snapshot.post_body(&slug).ok_or_else(ApiError::not_found)?;

    Ok(Json(serde_json::json!({
        "meta": meta,
        "body_html": render_markdown(body),
    })))
}

async fn faq_list(State(state): State<AppState>) -> Json<Vec<crate::content::FaqCategory>> {
    let snapshot = state.content.snapshot();
    Json(resolve::faq(&state.pool, &snapshot).await.into_value())
}

async fn site_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.content.snapshot();
    Json(resolve::site_config(&state.pool, &snapshot).await.into_value())
}

async fn fleet_list(State(state): State<AppState>) -> Json<Vec<Vehicle>> {
    let snapshot = state.content.snapshot();
    Json(resolve::fleet(&state.pool, &snapshot).await.into_value())
}

#[derive(Debug, Deserialize)]
struct NewVehicle {
    name: Option<String>,
    vehicle_type: Option<String>,
    #[serde(default)]
    passengers: i64,
    #[serde(default)]
    price_per_day: f64,
    #[serde(default)]
    image: String,
}

async fn fleet_create(
    State(state): State<AppState>,
    Json(input): Json<NewVehicle>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    let name = input
        .name
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("name is required"))?;
    let vehicle_type = input
        .vehicle_type
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("vehicle_type is required"))?;

    let vehicle = Vehicle {
        id: format!("veh-{}", uuid::Uuid::new_v4()),
        name,
        vehicle_type,
        passengers: input.passengers,
        price_per_day: input.price_per_day,
        image: input.image,
    };

    sqlx::query(
        "INSERT INTO fleet (id, name, vehicle_type, passengers, price_per_day, image)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&vehicle.id)
    .bind(&vehicle.name)
    .bind(&vehicle.vehicle_type)
    .bind(vehicle.passengers)
    .bind(vehicle.price_per_day)
    .bind(&vehicle.image)
    .execute(&state.pool)
    .await
    .map_err(StoreError::from)?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

#[derive(Debug, Deserialize)]
struct ReviewsQuery {
    #[serde(default)]
    featured: bool,
}

async fn reviews_list(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<Vec<reviews::Review>>, ApiError> {
    Ok(Json(reviews::list(&state.pool, query.featured).await?))
}

async fn reviews_create(
    State(state): State<AppState>,
    Json(input): Json<NewReview>,
) -> Result<(StatusCode, Json<reviews::Review>), ApiError> {
    let rating = input
        .rating
        .ok_or_else(|| ApiError::bad_request("rating is required"))?;
    let text = input
        .text
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("text is required"))?;

    let review = reviews::create(&state.pool, rating, text, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn reviews_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ReviewPatch>,
) -> Result<Json<reviews::Review>, ApiError> {
    Ok(Json(reviews::update(&state.pool, &id, patch).await?))
}

async fn reviews_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    reviews::delete(&state.pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn gallery_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<gallery::GalleryImage>>, ApiError> {
    let snapshot = state.content.snapshot();
    Ok(Json(gallery::list(&state.pool, &snapshot).await?))
}

async fn gallery_create(
    State(state): State<AppState>,
    Json(input): Json<NewGalleryImage>,
) -> Result<(StatusCode, Json<gallery::GalleryImage>), ApiError> {
    if input.url.trim().is_empty() {
        return Err(ApiError::bad_request("url is required"));
    }
    let image = gallery::create(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn gallery_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    gallery::delete(&state.pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn memories_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<memories::Memory>>, ApiError> {
    Ok(Json(memories::list(&state.pool).await?))
}

async fn memories_create(
    State(state): State<AppState>,
    Json(input): Json<NewMemory>,
) -> Result<(StatusCode, Json<memories::Memory>), ApiError> {
    if input.photo_url.trim().is_empty() {
        return Err(ApiError::bad_request("photo_url is required"));
    }
    let memory = memories::create(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(memory)))
}

async fn memories_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    memories::delete(&state.pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn inquiry_create(
    State(state): State<AppState>,
    Json(input): Json<NewInquiry>,
) -> Result<(StatusCode, Json<inquiry::Inquiry>), ApiError> {
    let email = input
        .email
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("email is required"))?;

    let stored = inquiry::create(&state.pool, email, input).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn inquiry_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<inquiry::Inquiry>>, ApiError> {
    Ok(Json(inquiry::list(&state.pool).await?))
}

async fn currency_rates(State(state): State<AppState>) -> Json<currency::CurrencyRates> {
    Json(currency::rates(&state.http, &state.currency_feed).await)
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    destination: Option<String>,
}

async fn weather_report(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<weather::WeatherReport>, ApiError> {
    let destination = query
        .destination
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("destination is required"))?;

    weather::report(&state.http, &state.weather_feed, &destination)
        .await
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// Admin dump of every resolved domain, with source markers so degraded
/// domains are visible.
async fn content_dump(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.content.snapshot();

    let fleet = resolve::fleet(&state.pool, &snapshot).await;
    let destinations = resolve::destinations(&state.pool, &snapshot).await;
    let tours = resolve::tours(&state.pool, &snapshot).await;
    let posts = resolve::posts(&state.pool, &snapshot).await;
    let faq = resolve::faq(&state.pool, &snapshot).await;
    let site = resolve::site_config(&state.pool, &snapshot).await;

    Ok(Json(serde_json::json!({
        "site": site,
        "fleet": fleet,
        "destinations": destinations,
        "tours": tours,
        "posts": posts,
        "faq": faq,
    })))
}

async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ApiError::bad_request(format!("invalid multipart payload: {err}"))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("read upload: {err}")))?;

        let url = upload::save(&state.upload_dir, &filename, &bytes)
            .await
            .map_err(|err| {
                tracing::error!(error = %format!("{err:#}"), "write upload");
                ApiError::internal()
            })?;
        return Ok(Json(serde_json::json!({ "url": url })));
    }

    Err(ApiError::bad_request("multipart field 'file' is required"))
}

async fn fix_db(State(state): State<AppState>) -> Json<Vec<db::PatchEntry>> {
    Json(db::patch_schema(&state.pool).await)
}

async fn diagnose(State(state): State<AppState>) -> Json<db::DiagnoseReport> {
    Json(db::diagnose(&state.pool, state.database_url_set).await)
}

async fn reload_content(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.content.reload().map_err(|err| {
        tracing::error!(error = %format!("{err:#}"), "reload content");
        ApiError::internal()
    })?;
    Ok(StatusCode::NO_CONTENT)
}
