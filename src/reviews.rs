use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::FromRow;

use crate::db::{StoreError, decode_json_column};

/// Display shape every review row is normalized into. The photo list is
/// guaranteed non-empty whenever the legacy single-image column is set.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Review {
    pub id: String,
    pub rating: i64,
    pub text: String,
    pub author: String,
    pub photos: Vec<String>,
    pub categories: Vec<String>,
    pub is_featured: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NewReview {
    pub rating: Option<i64>,
    pub text: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReviewPatch {
    pub rating: Option<i64>,
    pub text: Option<String>,
    pub author: Option<String>,
    pub photos: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: String,
    rating: i64,
    text: String,
    author: String,
    image: Option<String>,
    photos: String,
    categories: String,
    is_featured: i64,
    created_at: String,
}

fn normalize(row: ReviewRow) -> Result<Review, StoreError> {
    let mut photos: Vec<String> = decode_json_column(&row.id, "photos", &row.photos)?;
    let categories: Vec<String> = decode_json_column(&row.id, "categories", &row.categories)?;

    // Rows written before the photos column existed carry a single image.
    if photos.is_empty()
        && let Some(image) = row.image.as_deref()
        && !image.trim().is_empty()
    {
        photos.push(image.to_string());
    }

    Ok(Review {
        id: row.id,
        rating: row.rating,
        text: row.text,
        author: row.author,
        photos,
        categories,
        is_featured: row.is_featured != 0,
        created_at: row.created_at,
    })
}

pub async fn list(pool: &SqlitePool, featured_only: bool) -> Result<Vec<Review>, StoreError> {
    let query = if featured_only {
        "SELECT id, rating, text, author, image, photos, categories, is_featured, created_at
         FROM reviews WHERE is_featured = 1 ORDER BY created_at DESC"
    } else {
        "SELECT id, rating, text, author, image, photos, categories, is_featured, created_at
         FROM reviews ORDER BY created_at DESC"
    };

    let rows = sqlx::query_as::<_, ReviewRow>(query).fetch_all(pool).await?;
    rows.into_iter().map(normalize).collect()
}

pub async fn create(
    pool: &SqlitePool,
    rating: i64,
    text: String,
    input: NewReview,
) -> Result<Review, StoreError> {
    let review = Review {
        id: format!("rev-{}", uuid::Uuid::new_v4()),
        rating,
        text,
        author: input.author,
        photos: input.photos,
        categories: input.categories,
        is_featured: input.is_featured,
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        "INSERT INTO reviews (id, rating, text, author, image, photos, categories, is_featured, created_at)
         VALUES (?, ?, ?, ?, NULL, ?, ?, ?, ?)",
    )
    .bind(&review.id)
    .bind(review.rating)
    .bind(&review.text)
    .bind(&review.author)
    .bind(serde_json::to_string(&review.photos).unwrap_or_else(|_| "[]".to_string()))
    .bind(serde_json::to_string(&review.categories).unwrap_or_else(|_| "[]".to_string()))
    .bind(review.is_featured as i64)
    .bind(&review.created_at)
    .execute(pool)
    .await?;

    Ok(review)
}

pub async fn update(pool: &SqlitePool, id: &str, patch: ReviewPatch) -> Result<Review, StoreError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, rating, text, author, image, photos, categories, is_featured, created_at
         FROM reviews WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound)?;

    let mut current = normalize(row)?;
    if let Some(rating) = patch.rating {
        current.rating = rating;
    }
    if let Some(text) = patch.text {
        current.text = text;
    }
    if let Some(author) = patch.author {
        current.author = author;
    }
    if let Some(photos) = patch.photos {
        current.photos = photos;
    }
    if let Some(categories) = patch.categories {
        current.categories = categories;
    }
    if let Some(is_featured) = patch.is_featured {
        current.is_featured = is_featured;
    }

    sqlx::query(
        "UPDATE reviews SET rating = ?, text = ?, author = ?, photos = ?, categories = ?, is_featured = ?
         WHERE id = ?",
    )
    .bind(current.rating)
    .bind(&current.text)
    .bind(&current.author)
    .bind(serde_json::to_string(&current.photos).unwrap_or_else(|_| "[]".to_string()))
    .bind(serde_json::to_string(&current.categories).unwrap_or_else(|_| "[]".to_string()))
    .bind(current.is_featured as i64)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(current)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<(), StoreError> {
    let done = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}
