use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use base64::Engine;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::{AppError, ValidationError};
use crate::models::{ProfilePatch, Status, SubType};
use crate::orchestrator::{ProfileDraft, View};
use crate::services::storage::UploadFile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SetupRequest {
    pub sub_type: SubType,
}

// POST /api/setup
pub async fn complete_setup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SetupRequest>,
) -> Result<Json<View>, AppError> {
    state.orchestrator.complete_setup(payload.sub_type).await?;
    Ok(Json(state.orchestrator.view().await))
}

// POST /api/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<View>, AppError> {
    state.orchestrator.update_profile(patch).await?;
    Ok(Json(state.orchestrator.view().await))
}

/// An image picked in the profile form, base64-encoded by the browser.
#[derive(Deserialize)]
pub struct EncodedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

impl EncodedFile {
    fn decode(self) -> Result<UploadFile, ValidationError> {
        // data URLs carry a "data:image/png;base64," prefix
        let data = self
            .data
            .split_once(',')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.data);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| ValidationError::InvalidImage(format!("{}: {e}", self.file_name)))?;
        Ok(UploadFile {
            file_name: self.file_name,
            content_type: self.content_type,
            bytes,
        })
    }
}

#[derive(Deserialize)]
pub struct SaveProfileRequest {
    #[serde(default)]
    pub patch: ProfilePatch,
    #[serde(default)]
    pub terms_accepted: bool,
    pub avatar: Option<EncodedFile>,
    pub header: Option<EncodedFile>,
    pub id_card: Option<EncodedFile>,
    #[serde(default)]
    pub gallery: Vec<EncodedFile>,
}

impl SaveProfileRequest {
    fn into_draft(self) -> Result<ProfileDraft, ValidationError> {
        Ok(ProfileDraft {
            patch: self.patch,
            terms_accepted: self.terms_accepted,
            avatar: self.avatar.map(EncodedFile::decode).transpose()?,
            header: self.header.map(EncodedFile::decode).transpose()?,
            id_card: self.id_card.map(EncodedFile::decode).transpose()?,
            gallery: self
                .gallery
                .into_iter()
                .map(EncodedFile::decode)
                .collect::<Result<_, _>>()?,
        })
    }
}

// POST /api/profile/save
pub async fn save_profile(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SaveProfileRequest>,
) -> Result<Json<View>, AppError> {
    let draft = payload.into_draft()?;
    state.orchestrator.save_profile(draft).await?;
    Ok(Json(state.orchestrator.view().await))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: Status,
}

// POST /api/profile/status
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<View>, AppError> {
    state.orchestrator.set_status(payload.status).await?;
    Ok(Json(state.orchestrator.view().await))
}

#[derive(Deserialize)]
pub struct BookedDatesRequest {
    pub dates: BTreeSet<NaiveDate>,
}

// POST /api/profile/booked-dates
pub async fn set_booked_dates(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookedDatesRequest>,
) -> Result<Json<View>, AppError> {
    state.orchestrator.set_booked_dates(payload.dates).await?;
    Ok(Json(state.orchestrator.view().await))
}

// GET /api/share-link
pub async fn share_link(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let url = state.orchestrator.share_link().await?;
    Ok(Json(serde_json::json!({ "url": url })))
}
