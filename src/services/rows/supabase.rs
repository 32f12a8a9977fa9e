use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_RANGE};
use url::Url;

use super::{Filter, Row, RowStore};
use crate::errors::ProviderError;
use crate::services::auth::supabase::map_send_error;
use crate::services::auth::AccessTokenSource;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const NO_ROWS_CODE: &str = "PGRST116";

/// PostgREST client for the Supabase `rest/v1` endpoint.
pub struct SupabaseRows {
    base_url: Url,
    anon_key: String,
    tokens: Arc<dyn AccessTokenSource>,
    client: reqwest::Client,
}

impl SupabaseRows {
    pub fn new(
        base_url: &str,
        anon_key: String,
        tokens: Arc<dyn AccessTokenSource>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).context("invalid SUPABASE_URL")?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build rows HTTP client")?;
        Ok(Self {
            base_url,
            anon_key,
            tokens,
            client,
        })
    }

    fn table_url(&self, table: &str, filter: Option<&Filter>) -> Result<Url, ProviderError> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{table}"))
            .context("invalid table url")?;
        if let Some(filter) = filter {
            url.query_pairs_mut()
                .append_pair(&filter.column, &format!("eq.{}", filter.value));
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let bearer = self
            .tokens
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}

fn rejection(status: reqwest::StatusCode, data: &serde_json::Value) -> ProviderError {
    if data["code"].as_str() == Some(NO_ROWS_CODE) {
        return ProviderError::NotFound;
    }
    let message = data["message"]
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("row request failed ({status})"));
    if status.is_server_error() {
        ProviderError::Connection(message)
    } else {
        ProviderError::Rejected(message)
    }
}

/// Total from a `Content-Range` header such as `0-0/42` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl RowStore for SupabaseRows {
    async fn get_row(&self, table: &str, filter: &Filter) -> Result<Row, ProviderError> {
        let mut url = self.table_url(table, Some(filter))?;
        url.query_pairs_mut().append_pair("select", "*");

        let resp = self
            .request(reqwest::Method::GET, url)
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse row response")?;

        if !status.is_success() {
            return Err(rejection(status, &data));
        }
        Ok(data)
    }

    async fn insert_row(&self, table: &str, data: Row) -> Result<Row, ProviderError> {
        let url = self.table_url(table, None)?;
        let resp = self
            .request(reqwest::Method::POST, url)
            .header(ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .json(&data)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse insert response")?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        Ok(body)
    }

    async fn update_row(
        &self,
        table: &str,
        filter: &Filter,
        patch: Row,
    ) -> Result<(), ProviderError> {
        let url = self.table_url(table, Some(filter))?;
        let resp = self
            .request(reqwest::Method::PATCH, url)
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            return Err(rejection(status, &body));
        }
        Ok(())
    }

    async fn count_rows(&self, table: &str, filter: &Filter) -> Result<u64, ProviderError> {
        let mut url = self.table_url(table, Some(filter))?;
        url.query_pairs_mut().append_pair("select", "user_id");

        let resp = self
            .request(reqwest::Method::HEAD, url)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(rejection(status, &serde_json::Value::Null));
        }

        resp.headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| ProviderError::Connection("missing row count".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoToken;

    impl AccessTokenSource for NoToken {
        fn access_token(&self) -> Option<String> {
            None
        }
    }

    fn rows() -> SupabaseRows {
        SupabaseRows::new(
            "https://example.supabase.co",
            "anon".to_string(),
            Arc::new(NoToken),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-0/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_no_rows_code_maps_to_not_found() {
        let data = serde_json::json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned"
        });
        assert_eq!(
            rejection(reqwest::StatusCode::NOT_ACCEPTABLE, &data),
            ProviderError::NotFound
        );
    }

    #[test]
    fn test_server_errors_are_connection_errors() {
        let err = rejection(reqwest::StatusCode::BAD_GATEWAY, &serde_json::Value::Null);
        assert!(matches!(err, ProviderError::Connection(_)));
    }

    #[test]
    fn test_table_url_encodes_filter() {
        let url = rows()
            .table_url("profiles", Some(&Filter::eq("user_id", "a b")))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.supabase.co/rest/v1/profiles?user_id=eq.a+b"
        );
    }
}
