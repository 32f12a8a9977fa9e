pub mod events;
pub mod health;
pub mod location;
pub mod profile;
pub mod session;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::AppConfig;
use crate::state::AppState;

/// Cross-origin access for the front end served from `PUBLIC_BASE_URL` only.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    match config
        .cors_origin()
        .and_then(|origin| HeaderValue::from_str(&origin).ok())
    {
        Some(origin) => cors.allow_origin(AllowOrigin::list([origin])),
        None => {
            tracing::warn!(
                url = %config.public_base_url,
                "PUBLIC_BASE_URL has no origin, cross-origin requests disabled"
            );
            cors
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/screen", get(session::get_screen))
        .route("/api/events", get(events::events_stream))
        .route("/api/mount", post(session::mount))
        .route("/api/role", post(session::select_role))
        .route("/api/role/clear", post(session::clear_role))
        .route("/api/auth/sign-in", post(session::sign_in))
        .route("/api/auth/sign-up", post(session::sign_up))
        .route("/api/auth/logout", post(session::logout))
        .route("/api/retry", post(session::retry))
        .route("/api/error/dismiss", post(session::dismiss_error))
        .route("/api/notice/dismiss", post(session::dismiss_notice))
        .route("/api/public/close", post(session::close_public_view))
        .route("/api/public/contact", get(session::public_contact))
        .route("/api/setup", post(profile::complete_setup))
        .route("/api/profile", post(profile::update_profile))
        .route("/api/profile/save", post(profile::save_profile))
        .route("/api/profile/status", post(profile::set_status))
        .route("/api/profile/booked-dates", post(profile::set_booked_dates))
        .route("/api/share-link", get(profile::share_link))
        .route("/api/location/suggest", get(location::suggest))
        .route("/api/location/reverse", get(location::reverse))
        .with_state(state)
}
