use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row as _, SqlitePool};
use thiserror::Error;

/// Store failures that handlers need to tell apart. Malformed JSON in a TEXT
/// column surfaces as `CorruptRecord` rather than a panic.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record {id}: {detail}")]
    CorruptRecord { id: String, detail: String },

    #[error("record not found")]
    NotFound,
}

pub async fn connect(database: &Path, pool_size: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(database)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(pool_size)
        .connect_with(options)
        .await
        .with_context(|| format!("open sqlite database: {}", database.display()))?;

    Ok(pool)
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS fleet (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        vehicle_type TEXT NOT NULL,
        passengers INTEGER NOT NULL,
        price_per_day REAL NOT NULL,
        image TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS destinations (
        id TEXT PRIMARY KEY,
        slug TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        image TEXT NOT NULL DEFAULT '',
        categories TEXT NOT NULL DEFAULT '[]',
        latitude REAL NOT NULL DEFAULT 0,
        longitude REAL NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS tours (
        id TEXT PRIMARY KEY,
        slug TEXT NOT NULL,
        title TEXT NOT NULL,
        duration_days INTEGER NOT NULL,
        price REAL NOT NULL,
        rating REAL NOT NULL DEFAULT 0,
        highlights TEXT NOT NULL DEFAULT '[]',
        itinerary TEXT NOT NULL DEFAULT '[]'
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        slug TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        excerpt TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS faq (
        category TEXT PRIMARY KEY,
        items TEXT NOT NULL DEFAULT '[]'
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        id TEXT PRIMARY KEY,
        rating INTEGER NOT NULL,
        text TEXT NOT NULL,
        author TEXT NOT NULL DEFAULT '',
        image TEXT,
        photos TEXT NOT NULL DEFAULT '[]',
        categories TEXT NOT NULL DEFAULT '[]',
        is_featured INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS gallery_images (
        id TEXT PRIMARY KEY,
        url TEXT NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        width INTEGER,
        height INTEGER,
        featured INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS tourist_memories (
        id TEXT PRIMARY KEY,
        photo_url TEXT NOT NULL,
        caption TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL DEFAULT '',
        taken_at TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS inquiries (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL,
        destinations TEXT NOT NULL DEFAULT '[]',
        vehicle_type TEXT NOT NULL,
        vehicle_count INTEGER NOT NULL,
        passengers INTEGER NOT NULL,
        contact TEXT NOT NULL DEFAULT '',
        addons TEXT NOT NULL DEFAULT '[]',
        status TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS site_config (
        section_key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
];

pub async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("create table: {}", first_line(statement)))?;
    }
    Ok(())
}

/// Columns added after the initial release. `patch_schema` replays these on
/// every run; SQLite has no ADD COLUMN IF NOT EXISTS, so "duplicate column
/// name" counts as already applied.
const PATCHES: &[&str] = &[
    "ALTER TABLE reviews ADD COLUMN author TEXT NOT NULL DEFAULT ''",
    "ALTER TABLE reviews ADD COLUMN is_featured INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE gallery_images ADD COLUMN featured INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE inquiries ADD COLUMN addons TEXT NOT NULL DEFAULT '[]'",
    "ALTER TABLE inquiries ADD COLUMN contact TEXT NOT NULL DEFAULT ''",
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatchOutcome {
    Applied,
    AlreadyApplied,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchEntry {
    pub statement: String,
    pub outcome: PatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Applies the post-release column additions, continuing past individual
/// failures and reporting a per-statement log.
pub async fn patch_schema(pool: &SqlitePool) -> Vec<PatchEntry> {
    let mut report = Vec::with_capacity(PATCHES.len());
    for &statement in PATCHES {
        let entry = match sqlx::query(statement).execute(pool).await {
            Ok(_) => PatchEntry {
                statement: statement.to_string(),
                outcome: PatchOutcome::Applied,
                detail: None,
            },
            Err(err) if is_duplicate_column(&err) => PatchEntry {
                statement: statement.to_string(),
                outcome: PatchOutcome::AlreadyApplied,
                detail: None,
            },
            Err(err) => {
                tracing::warn!(statement, error = %err, "schema patch statement failed");
                PatchEntry {
                    statement: statement.to_string(),
                    outcome: PatchOutcome::Failed,
                    detail: Some(err.to_string()),
                }
            }
        };
        tracing::info!(statement = %entry.statement, outcome = ?entry.outcome, "schema patch");
        report.push(entry);
    }
    report
}

fn is_duplicate_column(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.message().contains("duplicate column name"))
}

#[derive(Debug, Serialize)]
pub struct DiagnoseReport {
    pub database_url_set: bool,
    pub connectivity: String,
    pub tables: BTreeMap<String, i64>,
}

const TABLES: &[&str] = &[
    "fleet",
    "destinations",
    "tours",
    "posts",
    "faq",
    "reviews",
    "gallery_images",
    "tourist_memories",
    "inquiries",
    "site_config",
];

/// Health probe for the admin panel. Unlike the public endpoints this one
/// deliberately echoes driver error codes.
pub async fn diagnose(pool: &SqlitePool, database_url_set: bool) -> DiagnoseReport {
    let connectivity = match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => "ok".to_string(),
        Err(err) => describe_db_error(&err),
    };

    let mut tables = BTreeMap::new();
    for table in TABLES {
        let count = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(pool)
            .await
            .and_then(|row| row.try_get::<i64, _>("n"))
            .unwrap_or(-1);
        tables.insert((*table).to_string(), count);
    }

    DiagnoseReport {
        database_url_set,
        connectivity,
        tables,
    }
}

fn describe_db_error(err: &sqlx::Error) -> String {
    match err.as_database_error().and_then(|db| db.code()) {
        Some(code) => format!("error (code {code}): {err}"),
        None => format!("error: {err}"),
    }
}

fn first_line(statement: &str) -> &str {
    statement.lines().next().unwrap_or(statement).trim()
}

pub(crate) fn decode_json_column<T: serde::de::DeserializeOwned>(
    id: &str,
    column: &str,
    raw: &str,
) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::CorruptRecord {
        id: id.to_string(),
        detail: format!("column {column}: {err}"),
    })
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(":memory:")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("open in-memory sqlite");
    init_schema(&pool).await.expect("init schema");
    pool
}
