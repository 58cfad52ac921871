//! services/api/src/services/auth.rs
//!
//! Registration, login and session tracking. A session moves from absent to
//! active on login and back to absent on logout; there is no expiry.

use std::sync::Arc;

use cardio_core::domain::NewUserAccount;
use cardio_core::ports::{AccountStore, PortError, PortResult, SessionStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::password::{hash_password, verify_password};

/// Account details supplied at registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// The result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user_id: String,
}

pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { accounts, sessions }
    }

    /// Hashes the password and stores the account. Usernames are not checked
    /// for collisions.
    pub async fn register(&self, registration: Registration) -> PortResult<String> {
        let password_hash = hash_password(&registration.password)?;
        let user_id = self
            .accounts
            .create_account(NewUserAccount {
                username: registration.username,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                email: registration.email,
            })
            .await?;
        info!(%user_id, "Account registered");
        Ok(user_id)
    }

    pub async fn login(&self, username: &str, password: &str) -> PortResult<LoginOutcome> {
        let credentials = match self.accounts.get_account_by_username(username).await {
            Ok(credentials) => credentials,
            Err(PortError::NotFound(_)) => {
                warn!(%username, "Login rejected: unknown username");
                return Err(PortError::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        if !verify_password(password, &credentials.hashed_password)? {
            warn!(%username, "Login rejected: wrong password");
            return Err(PortError::Unauthorized);
        }

        let token = Uuid::new_v4().to_string();
        self.sessions
            .create_session(&token, &credentials.user_id)
            .await?;
        info!(user_id = %credentials.user_id, "Login successful");

        Ok(LoginOutcome {
            token,
            user_id: credentials.user_id,
        })
    }

    pub async fn logout(&self, token: &str) -> PortResult<()> {
        self.sessions.delete_session(token).await?;
        debug!("Session ended");
        Ok(())
    }

    /// Returns the account identifier of the active session, or `Unauthorized`.
    pub async fn require_session(&self, token: &str) -> PortResult<String> {
        self.sessions.validate_session(token).await
    }
}
