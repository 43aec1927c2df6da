use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::FromRow;

use crate::content::Snapshot;
use crate::db::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct GalleryImage {
    pub id: String,
    pub url: String,
    pub title: String,
    pub category: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub featured: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGalleryImage {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[serde(default)]
    pub featured: bool,
}

/// The gallery is the uploaded rows plus the destination images, which the
/// site shows implicitly under an "attractions" category.
pub async fn list(pool: &SqlitePool, snapshot: &Snapshot) -> Result<Vec<GalleryImage>, StoreError> {
    let mut out = sqlx::query_as::<_, GalleryImage>(
        "SELECT id, url, title, category, width, height, featured FROM gallery_images ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    for dest in &snapshot.document.destinations {
        if dest.image.trim().is_empty() {
            continue;
        }
        out.push(GalleryImage {
            id: format!("dest-{}", dest.id),
            url: dest.image.clone(),
            title: dest.name.clone(),
            category: "attractions".to_string(),
            width: None,
            height: None,
            featured: false,
        });
    }

    Ok(out)
}

pub async fn create(pool: &SqlitePool, input: NewGalleryImage) -> Result<GalleryImage, StoreError> {
    let image = GalleryImage {
        id: format!("img-{}", uuid::Uuid::new_v4()),
        url: input.url,
        title: input.title,
        category: input.category,
        width: input.width,
        height: input.height,
        featured: input.featured,
    };

    sqlx::query(
        "INSERT INTO gallery_images (id, url, title, category, width, height, featured)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&image.id)
    .bind(&image.url)
    .bind(&image.title)
    .bind(&image.category)
    .bind(image.width)
    .bind(image.height)
    .bind(image.featured as i64)
    .execute(pool)
    .await?;

    Ok(image)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<(), StoreError> {
    let done = sqlx::query("DELETE FROM gallery_images WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}
