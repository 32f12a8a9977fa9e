use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};

use super::{ObjectStorage, UploadFile};
use crate::errors::ProviderError;
use crate::services::auth::supabase::map_send_error;
use crate::services::auth::AccessTokenSource;

pub struct SupabaseStorage {
    base_url: String,
    anon_key: String,
    bucket: String,
    tokens: Arc<dyn AccessTokenSource>,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(
        base_url: String,
        anon_key: String,
        bucket: String,
        tokens: Arc<dyn AccessTokenSource>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build storage HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            bucket,
            tokens,
            client,
        })
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, path: &str, file: &UploadFile) -> Result<String, ProviderError> {
        let path = path.trim_start_matches('/');
        let bearer = self
            .tokens
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());

        let resp = self
            .client
            .post(format!(
                "{}/storage/v1/object/{}/{path}",
                self.base_url, self.bucket
            ))
            .header("apikey", &self.anon_key)
            .header("x-upsert", "true")
            .header(CACHE_CONTROL, "max-age=3600")
            .header(CONTENT_TYPE, &file.content_type)
            .bearer_auth(bearer)
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let data: serde_json::Value = resp.json().await.unwrap_or_default();
            let message = data["message"]
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("upload failed ({status})"));
            tracing::warn!(path, %status, "image upload rejected");
            return Err(ProviderError::Rejected(message));
        }

        tracing::debug!(path, bytes = file.bytes.len(), "uploaded object");
        Ok(self.public_url(path))
    }
}
