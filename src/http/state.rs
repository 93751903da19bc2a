use crate::capture::CaptureConfig;
use crate::i18n::{Catalog, LocaleView};
use crate::session::DraftSession;
use crate::storage::LocalStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::error::ApiError;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Open wizards (draft_id → session)
    pub drafts: Arc<RwLock<HashMap<Uuid, Arc<Mutex<DraftSession>>>>>,

    pub store: Arc<LocalStore>,

    pub catalog: Arc<Catalog>,

    /// Settings for each draft's recorder
    pub capture: CaptureConfig,

    pub default_locale: String,
}

impl AppState {
    pub fn new(store: LocalStore, catalog: Catalog, capture: CaptureConfig, default_locale: String) -> Self {
        Self {
            drafts: Arc::new(RwLock::new(HashMap::new())),
            store: Arc::new(store),
            catalog: Arc::new(catalog),
            capture,
            default_locale,
        }
    }

    pub async fn draft(&self, id: Uuid) -> Result<Arc<Mutex<DraftSession>>, ApiError> {
        let drafts = self.drafts.read().await;
        drafts
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Draft {} not found", id)))
    }

    pub fn localizer<'a>(&'a self, locale: &'a Option<String>) -> LocaleView<'a> {
        self.catalog
            .localizer(locale.as_deref().unwrap_or(&self.default_locale))
    }
}
