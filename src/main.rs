use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use partner_hub::config::AppConfig;
use partner_hub::handlers;
use partner_hub::models::Credential;
use partner_hub::orchestrator::{Orchestrator, Settings};
use partner_hub::services::auth::supabase::SupabaseAuth;
use partner_hub::services::auth::AuthProvider;
use partner_hub::services::maps::google::GoogleGeocoder;
use partner_hub::services::maps::Geocoder;
use partner_hub::services::rows::supabase::SupabaseRows;
use partner_hub::services::rows::RowStore;
use partner_hub::services::storage::supabase::SupabaseStorage;
use partner_hub::services::storage::ObjectStorage;
use partner_hub::services::unconfigured::Unconfigured;
use partner_hub::state::AppState;

type Backend = (Arc<dyn AuthProvider>, Arc<dyn RowStore>, Arc<dyn ObjectStorage>);

fn build_backend(config: &AppConfig, missing: &[Credential]) -> anyhow::Result<Backend> {
    if missing.contains(&Credential::BackendUrl) || missing.contains(&Credential::BackendKey) {
        tracing::warn!("Supabase credentials missing, backend disabled");
        let unconfigured = Arc::new(Unconfigured::new());
        let auth: Arc<dyn AuthProvider> = unconfigured.clone();
        let rows: Arc<dyn RowStore> = unconfigured.clone();
        let storage: Arc<dyn ObjectStorage> = unconfigured;
        return Ok((auth, rows, storage));
    }

    let timeout = config.request_timeout();
    let auth = Arc::new(SupabaseAuth::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
        timeout,
    )?);
    let rows = SupabaseRows::new(
        &config.supabase_url,
        config.supabase_anon_key.clone(),
        auth.clone(),
        timeout,
    )?;
    let storage = SupabaseStorage::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
        config.storage_bucket.clone(),
        auth.clone(),
        timeout,
    )?;
    tracing::info!(
        url = %config.supabase_url,
        bucket = %config.storage_bucket,
        "using Supabase backend"
    );
    let auth: Arc<dyn AuthProvider> = auth;
    Ok((auth, Arc::new(rows), Arc::new(storage)))
}

fn build_geocoder(
    config: &AppConfig,
    missing: &[Credential],
) -> anyhow::Result<Box<dyn Geocoder>> {
    if missing.contains(&Credential::MapsKey) {
        tracing::warn!("GOOGLE_MAPS_API_KEY missing, location lookup disabled");
        return Ok(Box::new(Unconfigured::new()));
    }
    Ok(Box::new(GoogleGeocoder::new(
        config.google_maps_api_key.clone(),
        config.request_timeout(),
    )?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        tracing::warn!(
            ?missing,
            "running with missing credentials, only the configuration screen is available"
        );
    }

    let (auth, rows, storage) = build_backend(&config, &missing)?;
    let geocoder = build_geocoder(&config, &missing)?;

    let orchestrator = Arc::new(Orchestrator::new(
        auth,
        rows,
        storage,
        Settings::from_config(&config),
    ));
    let _listener = orchestrator.spawn_session_listener();

    let state = Arc::new(AppState {
        config: config.clone(),
        orchestrator,
        geocoder,
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(handlers::cors_layer(&config));

    let addr = config.bind_addr();
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
