//! services/api/src/adapters/sessions.rs
//!
//! In-memory `SessionStore`. Sessions live only as long as the process and are
//! not shared between instances.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cardio_core::domain::AuthSession;
use cardio_core::ports::{PortError, PortResult, SessionStore};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, AuthSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, token: &str, user_id: &str) -> PortResult<()> {
        let session = AuthSession {
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        self.sessions.write().await.insert(token.to_string(), session);
        debug!(user_id, "session created");
        Ok(())
    }

    async fn validate_session(&self, token: &str) -> PortResult<String> {
        self.sessions
            .read()
            .await
            .get(token)
            .map(|session| session.user_id.clone())
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_session(&self, token: &str) -> PortResult<()> {
        match self.sessions.write().await.remove(token) {
            Some(session) => {
                debug!(
                    user_id = %session.user_id,
                    lifetime_secs = (Utc::now() - session.created_at).num_seconds(),
                    "session removed"
                );
                Ok(())
            }
            None => Err(PortError::Unauthorized),
        }
    }
}
