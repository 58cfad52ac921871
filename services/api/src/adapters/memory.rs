//! services/api/src/adapters/memory.rs
//!
//! Process-local implementation of the store ports, used by the test suite and
//! when `DATABASE_URL=memory://`.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use cardio_core::domain::{
    CardioRecord, MeasurementUpdate, NewCardioRecord, NewUserAccount, UserCredentials,
};
use cardio_core::ports::{AccountStore, PortError, PortResult, RecordStore};
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<CardioRecord>>>,
    accounts: Arc<Mutex<Vec<StoredAccount>>>,
}

#[derive(Clone, Debug)]
struct StoredAccount {
    object_id: String,
    account: NewUserAccount,
}

fn lock<T>(mutex: &Mutex<T>) -> PortResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| PortError::Unexpected("memory store lock poisoned".into()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cardio records.
    pub fn record_count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> PortResult<CardioRecord> {
        lock(&self.records)?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User not found for ID {}", id)))
    }

    async fn insert(&self, record: NewCardioRecord) -> PortResult<String> {
        let object_id = Uuid::new_v4().to_string();
        lock(&self.records)?.push(CardioRecord {
            object_id: object_id.clone(),
            id: record.id,
            document: record.document,
        });
        Ok(object_id)
    }

    async fn update_fields(&self, id: i64, update: MeasurementUpdate) -> PortResult<()> {
        let mut records = lock(&self.records)?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PortError::NotFound(format!("User not found for ID {}", id)))?;

        record
            .document
            .insert("height".to_string(), Value::from(update.height));
        record
            .document
            .insert("weight".to_string(), Value::from(update.weight));
        Ok(())
    }

    async fn health_check(&self) -> PortResult<()> {
        lock(&self.records).map(|_| ())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, account: NewUserAccount) -> PortResult<String> {
        let object_id = Uuid::new_v4().to_string();
        lock(&self.accounts)?.push(StoredAccount {
            object_id: object_id.clone(),
            account,
        });
        Ok(object_id)
    }

    async fn get_account_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        lock(&self.accounts)?
            .iter()
            .find(|stored| stored.account.username == username)
            .map(|stored| UserCredentials {
                user_id: stored.object_id.clone(),
                hashed_password: stored.account.password_hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("Account {} not found", username)))
    }
}
