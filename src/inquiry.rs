use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::FromRow;

use crate::db::{StoreError, decode_json_column};

pub const DEFAULT_VEHICLE_TYPE: &str = "Sedan";
pub const DEFAULT_PASSENGERS: i64 = 2;
pub const VEHICLE_COUNT: i64 = 1;

/// Initial status of every persisted inquiry. There is no transition
/// endpoint; anything beyond "pending" happens out of band.
pub const STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Inquiry {
    pub id: String,
    pub email: String,
    pub destinations: Vec<String>,
    pub vehicle_type: String,
    pub vehicle_count: i64,
    pub passengers: i64,
    pub contact: String,
    pub addons: Vec<String>,
    pub status: String,
    pub created_at: String,
}

/// Lead-generation form payload. Only the email is mandatory; everything
/// else has a documented default.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NewInquiry {
    pub email: Option<String>,
    #[serde(default)]
    pub destinations: Vec<String>,
    pub vehicle_type: Option<String>,
    pub passengers: Option<i64>,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub addons: Vec<String>,
}

pub async fn create(
    pool: &SqlitePool,
    email: String,
    input: NewInquiry,
) -> Result<Inquiry, StoreError> {
    let inquiry = Inquiry {
        id: format!("inq-{}", uuid::Uuid::new_v4()),
        email,
        destinations: input.destinations,
        vehicle_type: input
            .vehicle_type
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VEHICLE_TYPE.to_string()),
        vehicle_count: VEHICLE_COUNT,
        passengers: input.passengers.unwrap_or(DEFAULT_PASSENGERS),
        contact: input.contact,
        addons: input.addons,
        status: STATUS_PENDING.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        "INSERT INTO inquiries (id, email, destinations, vehicle_type, vehicle_count, passengers, contact, addons, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&inquiry.id)
    .bind(&inquiry.email)
    .bind(serde_json::to_string(&inquiry.destinations).unwrap_or_else(|_| "[]".to_string()))
    .bind(&inquiry.vehicle_type)
    .bind(inquiry.vehicle_count)
    .bind(inquiry.passengers)
    .bind(&inquiry.contact)
    .bind(serde_json::to_string(&inquiry.addons).unwrap_or_else(|_| "[]".to_string()))
    .bind(&inquiry.status)
    .bind(&inquiry.created_at)
    .execute(pool)
    .await?;

    Ok(inquiry)
}

#[derive(Debug, FromRow)]
struct InquiryRow {
    id: String,
    email: String,
    destinations: String,
    vehicle_type: String,
    vehicle_count: i64,
    passengers: i64,
    contact: String,
    addons: String,
    status: String,
    created_at: String,
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Inquiry>, StoreError> {
    let rows = sqlx::query_as::<_, InquiryRow>(
        "SELECT id, email, destinations, vehicle_type, vehicle_count, passengers, contact, addons, status, created_at
         FROM inquiries ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let destinations = decode_json_column(&row.id, "destinations", &row.destinations)?;
            let addons = decode_json_column(&row.id, "addons", &row.addons)?;
            Ok(Inquiry {
                id: row.id,
                email: row.email,
                destinations,
                vehicle_type: row.vehicle_type,
                vehicle_count: row.vehicle_count,
                passengers: row.passengers,
                contact: row.contact,
                addons,
                status: row.status,
                created_at: row.created_at,
            })
        })
        .collect()
}
