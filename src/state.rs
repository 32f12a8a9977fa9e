use std::sync::Arc;

use crate::config::AppConfig;
use crate::orchestrator::Orchestrator;
use crate::services::maps::Geocoder;

pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub geocoder: Box<dyn Geocoder>,
}
