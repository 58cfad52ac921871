//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use cardio_core::ports::{AccountStore, AssetUrlBuilder, RecordStore, SessionStore};

use crate::config::Config;
use crate::services::{AuthService, ImageResolver};
use crate::web::cookies::SessionCookies;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub auth: Arc<AuthService>,
    pub images: Arc<ImageResolver>,
    pub cookies: SessionCookies,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services on top of the given store adapters.
    pub fn new(
        config: Arc<Config>,
        records: Arc<dyn RecordStore>,
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
        urls: Arc<dyn AssetUrlBuilder>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(accounts, sessions)),
            images: Arc::new(ImageResolver::new(records.clone(), urls)),
            cookies: SessionCookies::new(&config.session_secret),
            records,
            config,
        }
    }
}
