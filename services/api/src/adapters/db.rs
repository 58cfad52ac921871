//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `RecordStore` and `AccountStore` ports from the `core` crate. Records are kept
//! as JSONB documents in PostgreSQL and accessed with `sqlx`.

use async_trait::async_trait;
use cardio_core::domain::{
    CardioRecord, Document, MeasurementUpdate, NewCardioRecord, NewUserAccount, UserCredentials,
};
use cardio_core::ports::{AccountStore, PortError, PortResult, RecordStore};
use sqlx::{types::Json, FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CardioRow {
    object_id: Uuid,
    id: i64,
    document: Json<Document>,
}
impl CardioRow {
    fn to_domain(self) -> CardioRecord {
        CardioRecord {
            object_id: self.object_id.to_string(),
            id: self.id,
            document: self.document.0,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    object_id: Uuid,
    password_hash: String,
}
impl CredentialsRow {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.object_id.to_string(),
            hashed_password: self.password_hash,
        }
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl RecordStore for DbAdapter {
    async fn find_by_id(&self, id: i64) -> PortResult<CardioRecord> {
        debug!(id, "db: SELECT cardio record");
        let row = sqlx::query_as::<_, CardioRow>(
            "SELECT object_id, id, document FROM cardio_records WHERE id = $1 ORDER BY seq LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        row.map(CardioRow::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("User not found for ID {}", id)))
    }

    async fn insert(&self, record: NewCardioRecord) -> PortResult<String> {
        let object_id = Uuid::new_v4();
        debug!(id = record.id, %object_id, "db: INSERT cardio record");

        sqlx::query("INSERT INTO cardio_records (object_id, id, document) VALUES ($1, $2, $3)")
            .bind(object_id)
            .bind(record.id)
            .bind(Json(record.document))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(object_id.to_string())
    }

    async fn update_fields(&self, id: i64, update: MeasurementUpdate) -> PortResult<()> {
        debug!(id, height = update.height, weight = update.weight, "db: UPDATE cardio record");

        // Existence check and write happen in one statement.
        let result = sqlx::query(
            "UPDATE cardio_records \
             SET document = document || jsonb_build_object('height', $2::bigint, 'weight', $3::float8) \
             WHERE seq = (SELECT seq FROM cardio_records WHERE id = $1 ORDER BY seq LIMIT 1)",
        )
        .bind(id)
        .bind(update.height)
        .bind(update.weight)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        debug!(id, rows_affected = result.rows_affected(), "db: update result");
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User not found for ID {}", id)));
        }
        Ok(())
    }

    async fn health_check(&self) -> PortResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for DbAdapter {
    async fn create_account(&self, account: NewUserAccount) -> PortResult<String> {
        let object_id = Uuid::new_v4();
        debug!(username = %account.username, %object_id, "db: INSERT user account");

        sqlx::query(
            "INSERT INTO user_accounts (object_id, username, password_hash, first_name, last_name, email) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(object_id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(object_id.to_string())
    }

    async fn get_account_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        debug!(%username, "db: SELECT user account");
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT object_id, password_hash FROM user_accounts \
             WHERE username = $1 ORDER BY seq LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        row.map(CredentialsRow::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Account {} not found", username)))
    }
}
