use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::FromRow;

use crate::db::StoreError;

/// Traveller-submitted photos shown on the community page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Memory {
    pub id: String,
    pub photo_url: String,
    pub caption: String,
    pub author: String,
    pub taken_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMemory {
    pub photo_url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub taken_at: String,
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Memory>, StoreError> {
    let rows = sqlx::query_as::<_, Memory>(
        "SELECT id, photo_url, caption, author, taken_at FROM tourist_memories ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, input: NewMemory) -> Result<Memory, StoreError> {
    let memory = Memory {
        id: format!("mem-{}", uuid::Uuid::new_v4()),
        photo_url: input.photo_url,
        caption: input.caption,
        author: input.author,
        taken_at: input.taken_at,
    };

    sqlx::query(
        "INSERT INTO tourist_memories (id, photo_url, caption, author, taken_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&memory.id)
    .bind(&memory.photo_url)
    .bind(&memory.caption)
    .bind(&memory.author)
    .bind(&memory.taken_at)
    .execute(pool)
    .await?;

    Ok(memory)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<(), StoreError> {
    let done = sqlx::query("DELETE FROM tourist_memories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}
