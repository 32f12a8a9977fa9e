use std::env;
use std::time::Duration;

use url::Url;

use crate::models::Credential;

const PLACEHOLDER_PREFIX: &str = "YOUR_";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub google_maps_api_key: String,
    pub storage_bucket: String,
    pub public_base_url: String,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            supabase_url: env::var("SUPABASE_URL").unwrap_or_default(),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY").unwrap_or_default(),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "profile-assets".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/".to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Origin of `public_base_url`, the only one the API answers cross-origin.
    pub fn cors_origin(&self) -> Option<String> {
        let url = Url::parse(&self.public_base_url).ok()?;
        let origin = url.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    /// Credentials that are absent or still carry a `YOUR_...` placeholder.
    pub fn missing_credentials(&self) -> Vec<Credential> {
        [
            (Credential::BackendUrl, &self.supabase_url),
            (Credential::BackendKey, &self.supabase_anon_key),
            (Credential::MapsKey, &self.google_maps_api_key),
        ]
        .into_iter()
        .filter(|(_, value)| !is_configured(value))
        .map(|(credential, _)| credential)
        .collect()
    }
}

fn is_configured(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.starts_with(PLACEHOLDER_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            supabase_url: "https://example.supabase.co".to_string(),
            supabase_anon_key: "anon".to_string(),
            google_maps_api_key: "maps".to_string(),
            storage_bucket: "profile-assets".to_string(),
            public_base_url: "http://localhost:3000/".to_string(),
            request_timeout_secs: 15,
        }
    }

    #[test]
    fn test_fully_configured() {
        assert!(config().missing_credentials().is_empty());
    }

    #[test]
    fn test_placeholders_count_as_missing() {
        let mut cfg = config();
        cfg.supabase_url = "YOUR_SUPABASE_URL".to_string();
        cfg.google_maps_api_key = "  ".to_string();
        assert_eq!(
            cfg.missing_credentials(),
            vec![Credential::BackendUrl, Credential::MapsKey]
        );
    }

    #[test]
    fn test_bind_addr_uses_host() {
        assert_eq!(config().bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_cors_origin_drops_path() {
        let mut cfg = config();
        cfg.public_base_url = "https://hub.example.com/app/?lang=id".to_string();
        assert_eq!(cfg.cors_origin().as_deref(), Some("https://hub.example.com"));
        cfg.public_base_url = "http://localhost:3000/".to_string();
        assert_eq!(cfg.cors_origin().as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn test_cors_origin_rejects_garbage() {
        let mut cfg = config();
        cfg.public_base_url = "not a url".to_string();
        assert_eq!(cfg.cors_origin(), None);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let mut cfg = config();
        cfg.request_timeout_secs = 0;
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }
}
