//! crates/cardio_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the document store
//! or the asset host.

use async_trait::async_trait;

use crate::domain::{CardioRecord, MeasurementUpdate, NewCardioRecord, NewUserAccount, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Access to the cardio record collection, keyed by the caller-supplied `id`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> PortResult<CardioRecord>;

    /// Stores the record and returns its store-generated identifier.
    async fn insert(&self, record: NewCardioRecord) -> PortResult<String>;

    /// Merges new measurements into the record matching `id`.
    /// Returns `NotFound` and leaves the store untouched when nothing matches.
    async fn update_fields(&self, id: i64, update: MeasurementUpdate) -> PortResult<()>;

    async fn health_check(&self) -> PortResult<()>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persists a new account and returns its store-generated identifier.
    async fn create_account(&self, account: NewUserAccount) -> PortResult<String>;

    async fn get_account_by_username(&self, username: &str) -> PortResult<UserCredentials>;
}

/// Server-side mapping from session tokens to account identifiers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, token: &str, user_id: &str) -> PortResult<()>;

    /// Returns the account identifier bound to `token`, or `Unauthorized`.
    async fn validate_session(&self, token: &str) -> PortResult<String>;

    /// Removes the session; `Unauthorized` if it was not active.
    async fn delete_session(&self, token: &str) -> PortResult<()>;
}

/// Builds public delivery URLs for stored asset paths. Pure; no network access.
pub trait AssetUrlBuilder: Send + Sync {
    fn delivery_url(&self, path: &str) -> PortResult<String>;
}
