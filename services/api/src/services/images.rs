//! services/api/src/services/images.rs
//!
//! Resolves a record's stored image path to a public delivery URL.

use std::sync::Arc;

use cardio_core::ports::{AssetUrlBuilder, PortError, PortResult, RecordStore};
use tracing::debug;

pub struct ImageResolver {
    records: Arc<dyn RecordStore>,
    urls: Arc<dyn AssetUrlBuilder>,
}

impl ImageResolver {
    pub fn new(records: Arc<dyn RecordStore>, urls: Arc<dyn AssetUrlBuilder>) -> Self {
        Self { records, urls }
    }

    /// `NotFound` when the record is absent or has no string `path` attribute.
    pub async fn resolve(&self, id: i64) -> PortResult<String> {
        let not_found = || PortError::NotFound(format!("Image not found for ID {}", id));

        let record = match self.records.find_by_id(id).await {
            Ok(record) => record,
            Err(PortError::NotFound(_)) => return Err(not_found()),
            Err(e) => return Err(e),
        };
        let path = record.image_path().ok_or_else(not_found)?;
        debug!(id, %path, "Resolving image path");

        self.urls.delivery_url(path)
    }
}
