use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

// GET /api/location/suggest
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let input = query.q.trim();
    if input.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let suggestions = state.geocoder.autocomplete(input).await?;
    Ok(Json(suggestions))
}

#[derive(Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

// GET /api/location/reverse
pub async fn reverse(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err(AppError::InvalidState("coordinates out of range".to_string()));
    }
    let address = state
        .geocoder
        .reverse_geocode(query.lat, query.lng)
        .await?;
    Ok(Json(serde_json::json!({ "address": address })))
}
