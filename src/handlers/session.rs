use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Screen, SubType};
use crate::orchestrator::public::whatsapp_link;
use crate::orchestrator::{SignInForm, SignUpForm, View};
use crate::state::AppState;

// GET /api/screen
pub async fn get_screen(State(state): State<Arc<AppState>>) -> Json<View> {
    Json(state.orchestrator.view().await)
}

#[derive(Deserialize)]
pub struct PageUrl {
    pub url: String,
}

// POST /api/mount
pub async fn mount(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PageUrl>,
) -> Json<View> {
    state.orchestrator.mount(&payload.url).await;
    Json(state.orchestrator.view().await)
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub sub_type: SubType,
}

// POST /api/role
pub async fn select_role(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<View>, AppError> {
    state.orchestrator.select_role(payload.sub_type).await?;
    Ok(Json(state.orchestrator.view().await))
}

// POST /api/role/clear
pub async fn clear_role(State(state): State<Arc<AppState>>) -> Json<View> {
    state.orchestrator.clear_role().await;
    Json(state.orchestrator.view().await)
}

// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignInForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.orchestrator.sign_in(&form).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignUpForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = state.orchestrator.sign_up(&form).await?;
    Ok(Json(serde_json::json!({ "ok": true, "user_id": user_id })))
}

// POST /api/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> Result<Json<View>, AppError> {
    state.orchestrator.logout().await?;
    Ok(Json(state.orchestrator.view().await))
}

// POST /api/retry
pub async fn retry(State(state): State<Arc<AppState>>) -> Json<View> {
    state.orchestrator.retry().await;
    Json(state.orchestrator.view().await)
}

// POST /api/error/dismiss
pub async fn dismiss_error(State(state): State<Arc<AppState>>) -> Json<View> {
    state.orchestrator.dismiss_error().await;
    Json(state.orchestrator.view().await)
}

// POST /api/notice/dismiss
pub async fn dismiss_notice(State(state): State<Arc<AppState>>) -> Json<View> {
    state.orchestrator.dismiss_notice().await;
    Json(state.orchestrator.view().await)
}

#[derive(Serialize)]
pub struct ClosePublicResponse {
    pub url: String,
    #[serde(flatten)]
    pub view: View,
}

// POST /api/public/close
pub async fn close_public_view(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PageUrl>,
) -> Json<ClosePublicResponse> {
    let url = state.orchestrator.close_public_view(&payload.url).await;
    Json(ClosePublicResponse {
        url,
        view: state.orchestrator.view().await,
    })
}

// GET /api/public/contact
pub async fn public_contact(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Screen::PublicProfile { profile } = state.orchestrator.screen().await else {
        return Err(AppError::InvalidState("no public profile is open".to_string()));
    };
    let link = whatsapp_link(&profile.whatsapp).ok_or_else(|| {
        AppError::InvalidState("WhatsApp number is not available for this partner".to_string())
    })?;
    Ok(Json(serde_json::json!({ "whatsapp_url": link })))
}
