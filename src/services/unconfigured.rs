use async_trait::async_trait;
use tokio::sync::broadcast;

use super::auth::AuthProvider;
use super::maps::Geocoder;
use super::rows::{Filter, Row, RowStore};
use super::storage::{ObjectStorage, UploadFile};
use crate::errors::ProviderError;
use crate::models::{Session, SessionEvent};

/// Stands in for every collaborator while credentials are missing, so the app
/// can still start and show the configuration screen.
pub struct Unconfigured {
    events: broadcast::Sender<SessionEvent>,
}

impl Unconfigured {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

impl Default for Unconfigured {
    fn default() -> Self {
        Self::new()
    }
}

fn not_configured() -> ProviderError {
    ProviderError::Rejected("backend is not configured".to_string())
}

#[async_trait]
impl AuthProvider for Unconfigured {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        Err(not_configured())
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<(), ProviderError> {
        Err(not_configured())
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<String, ProviderError> {
        Err(not_configured())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Err(not_configured())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl RowStore for Unconfigured {
    async fn get_row(&self, _table: &str, _filter: &Filter) -> Result<Row, ProviderError> {
        Err(not_configured())
    }

    async fn insert_row(&self, _table: &str, _data: Row) -> Result<Row, ProviderError> {
        Err(not_configured())
    }

    async fn update_row(
        &self,
        _table: &str,
        _filter: &Filter,
        _patch: Row,
    ) -> Result<(), ProviderError> {
        Err(not_configured())
    }

    async fn count_rows(&self, _table: &str, _filter: &Filter) -> Result<u64, ProviderError> {
        Err(not_configured())
    }
}

#[async_trait]
impl ObjectStorage for Unconfigured {
    async fn upload(&self, _path: &str, _file: &UploadFile) -> Result<String, ProviderError> {
        Err(not_configured())
    }
}

#[async_trait]
impl Geocoder for Unconfigured {
    async fn autocomplete(&self, _input: &str) -> Result<Vec<String>, ProviderError> {
        Err(not_configured())
    }

    async fn reverse_geocode(&self, _lat: f64, _lng: f64) -> Result<String, ProviderError> {
        Err(not_configured())
    }
}
