//! Database Module
//!
//! Handles the embedded SurrealDB instance (RocksDB backend) and schema setup

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "queue";
const DATABASE: &str = "queue";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at the given path and apply the schema
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {}", e)))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {}", e)))?;

        define_schema(&db).await?;

        tracing::info!("Database ready at {}", db_path.display());

        Ok(Self { db })
    }
}

/// Apply table, field and index definitions
///
/// 计数器表 SCHEMAFULL: `value` 默认 0，保证 `UPSERT ... SET value += 1`
/// 首次调用返回 1。
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        "
        DEFINE TABLE IF NOT EXISTS service SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS service_code ON service FIELDS service_code UNIQUE;

        DEFINE TABLE IF NOT EXISTS appointment_settings SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS settings_service ON appointment_settings FIELDS service UNIQUE;

        DEFINE TABLE IF NOT EXISTS ticket SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS ticket_user_status ON ticket FIELDS user_id, status;
        DEFINE INDEX IF NOT EXISTS ticket_service_date ON ticket FIELDS service, appointment_date;

        DEFINE TABLE IF NOT EXISTS notification SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS notification_user ON notification FIELDS user_id;

        DEFINE TABLE IF NOT EXISTS counter SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS value ON counter TYPE int DEFAULT 0;
        ",
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {}", e)))?
    .check()
    .map_err(|e| AppError::database(format!("Schema definition rejected: {}", e)))?;

    Ok(())
}
