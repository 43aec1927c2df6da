use serde::{Serialize, Serializer, ser::SerializeStruct as _};
use sqlx::SqlitePool;
use sqlx::FromRow;

use crate::content::{Destination, FaqCategory, FaqItem, PostMeta, Snapshot, Tour, Vehicle};
use crate::db::decode_json_column;

/// Outcome of layering an override read over a static default. Callers can
/// tell degraded mode from a live read; page composers serve either one.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    Live(T),
    Fallback { value: T, reason: String },
}

impl<T> Resolved<T> {
    pub fn value(&self) -> &T {
        match self {
            Resolved::Live(value) => value,
            Resolved::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Resolved::Live(value) => value,
            Resolved::Fallback { value, .. } => value,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Resolved::Live(_))
    }

    pub fn source(&self) -> &'static str {
        match self {
            Resolved::Live(_) => "live",
            Resolved::Fallback { .. } => "static",
        }
    }
}

impl<T: Serialize> Serialize for Resolved<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("Resolved", 2)?;
        out.serialize_field("source", self.source())?;
        out.serialize_field("data", self.value())?;
        out.end()
    }
}

fn fallback<T>(domain: &str, value: T, reason: impl Into<String>) -> Resolved<T> {
    let reason = reason.into();
    tracing::warn!(domain, reason = %reason, "serving static default");
    Resolved::Fallback { value, reason }
}

/// A destination as pages see it: category ids swapped for display names.
/// Ids with no entry in the lookup pass through unresolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DestinationView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub categories: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
}

fn destination_view(dest: Destination, snapshot: &Snapshot) -> DestinationView {
    let categories = dest
        .categories
        .iter()
        .map(|id| snapshot.category_name(id).to_string())
        .collect();
    DestinationView {
        id: dest.id,
        slug: dest.slug,
        name: dest.name,
        description: dest.description,
        image: dest.image,
        categories,
        latitude: dest.latitude,
        longitude: dest.longitude,
    }
}

#[derive(Debug, FromRow)]
struct FleetRow {
    id: String,
    name: String,
    vehicle_type: String,
    passengers: i64,
    price_per_day: f64,
    image: String,
}

pub async fn fleet(pool: &SqlitePool, snapshot: &Snapshot) -> Resolved<Vec<Vehicle>> {
    let default = snapshot.document.fleet.clone();

    let rows = match sqlx::query_as::<_, FleetRow>(
        "SELECT id, name, vehicle_type, passengers, price_per_day, image FROM fleet",
    )
    .fetch_all(pool)
    .await
    {
        Ok(rows) => rows,
        Err(err) => return fallback("fleet", default, err.to_string()),
    };

    if rows.is_empty() {
        return fallback("fleet", default, "no override rows");
    }

    Resolved::Live(
        rows.into_iter()
            .map(|r| Vehicle {
                id: r.id,
                name: r.name,
                vehicle_type: r.vehicle_type,
                passengers: r.passengers,
                price_per_day: r.price_per_day,
                image: r.image,
            })
            .collect(),
    )
}

#[derive(Debug, FromRow)]
struct DestinationRow {
    id: String,
    slug: String,
    name: String,
    description: String,
    image: String,
    categories: String,
    latitude: f64,
    longitude: f64,
}

pub async fn destinations(pool: &SqlitePool, snapshot: &Snapshot) -> Resolved<Vec<DestinationView>> {
    let default = || {
        snapshot
            .document
            .destinations
            .iter()
            .cloned()
            .map(|d| destination_view(d, snapshot))
            .collect::<Vec<_>>()
    };

    let rows = match sqlx::query_as::<_, DestinationRow>(
        "SELECT id, slug, name, description, image, categories, latitude, longitude FROM destinations",
    )
    .fetch_all(pool)
    .await
    {
        Ok(rows) => rows,
        Err(err) => return fallback("destinations", default(), err.to_string()),
    };

    if rows.is_empty() {
        return fallback("destinations", default(), "no override rows");
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let categories: Vec<String> = match decode_json_column(&row.id, "categories", &row.categories)
        {
            Ok(categories) => categories,
            Err(err) => return fallback("destinations", default(), err.to_string()),
        };
        out.push(destination_view(
            Destination {
                id: row.id,
                slug: row.slug,
                name: row.name,
                description: row.description,
                image: row.image,
                categories,
                latitude: row.latitude,
                longitude: row.longitude,
            },
            snapshot,
        ));
    }

    Resolved::Live(out)
}

#[derive(Debug, FromRow)]
struct TourRow {
    id: String,
    slug: String,
    title: String,
    duration_days: i64,
    price: f64,
    rating: f64,
    highlights: String,
    itinerary: String,
}

pub async fn tours(pool: &SqlitePool, snapshot: &Snapshot) -> Resolved<Vec<Tour>> {
    let default = snapshot.document.tours.clone();

    let rows = match sqlx::query_as::<_, TourRow>(
        "SELECT id, slug, title, duration_days, price, rating, highlights, itinerary FROM tours",
    )
    .fetch_all(pool)
    .await
    {
        Ok(rows) => rows,
        Err(err) => return fallback("tours", default, err.to_string()),
    };

    if rows.is_empty() {
        return fallback("tours", default, "no override rows");
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let highlights = match decode_json_column(&row.id, "highlights", &row.highlights) {
            Ok(v) => v,
            Err(err) => return fallback("tours", default, err.to_string()),
        };
        let itinerary = match decode_json_column(&row.id, "itinerary", &row.itinerary) {
            Ok(v) => v,
            Err(err) => return fallback("tours", default, err.to_string()),
        };
        out.push(Tour {
            id: row.id,
            slug: row.slug,
            title: row.title,
            duration_days: row.duration_days.max(0) as u32,
            price: row.price,
            rating: row.rating,
            highlights,
            itinerary,
        });
    }

    Resolved::Live(out)
}

#[derive(Debug, FromRow)]
struct FaqRow {
    category: String,
    items: String,
}

pub async fn faq(pool: &SqlitePool, snapshot: &Snapshot) -> Resolved<Vec<FaqCategory>> {
    let default = snapshot.document.faq.clone();

    let rows = match sqlx::query_as::<_, FaqRow>("SELECT category, items FROM faq")
        .fetch_all(pool)
        .await
    {
        Ok(rows) => rows,
        Err(err) => return fallback("faq", default, err.to_string()),
    };

    if rows.is_empty() {
        return fallback("faq", default, "no override rows");
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let items: Vec<FaqItem> = match decode_json_column(&row.category, "items", &row.items) {
            Ok(items) => items,
            Err(err) => return fallback("faq", default, err.to_string()),
        };
        out.push(FaqCategory {
            category: row.category,
            items,
        });
    }

    Resolved::Live(out)
}

#[derive(Debug, FromRow)]
struct PostRow {
    slug: String,
    title: String,
    excerpt: String,
    date: String,
    category: String,
}

pub async fn posts(pool: &SqlitePool, snapshot: &Snapshot) -> Resolved<Vec<PostMeta>> {
    let default = snapshot.document.posts.clone();

    let rows = match sqlx::query_as::<_, PostRow>(
        "SELECT slug, title, excerpt, date, category FROM posts",
    )
    .fetch_all(pool)
    .await
    {
        Ok(rows) => rows,
        Err(err) => return fallback("posts", default, err.to_string()),
    };

    if rows.is_empty() {
        return fallback("posts", default, "no override rows");
    }

    Resolved::Live(
        rows.into_iter()
            .map(|r| PostMeta {
                slug: r.slug,
                title: r.title,
                excerpt: r.excerpt,
                date: r.date,
                category: r.category,
            })
            .collect(),
    )
}

pub const MAIN_CONFIG_KEY: &str = "main_config";

/// Site configuration is a key-value override store; one section key is read
/// by the public site today.
pub async fn site_config(pool: &SqlitePool, snapshot: &Snapshot) -> Resolved<serde_json::Value> {
    let default = snapshot.document.site.clone();

    let row: Option<(String,)> =
        match sqlx::query_as("SELECT value FROM site_config WHERE section_key = ?")
            .bind(MAIN_CONFIG_KEY)
            .fetch_optional(pool)
            .await
        {
            Ok(row) => row,
            Err(err) => return fallback("site_config", default, err.to_string()),
        };

    let Some((raw,)) = row else {
        return fallback("site_config", default, "no override row");
    };

    match decode_json_column(MAIN_CONFIG_KEY, "value", &raw) {
        Ok(value) => Resolved::Live(value),
        Err(err) => fallback("site_config", default, err.to_string()),
    }
}
