use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;

use super::{AccessTokenSource, AuthProvider};
use crate::errors::ProviderError;
use crate::models::{Session, SessionEvent, SessionEventKind};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    user: Option<UserPayload>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
}

/// GoTrue (Supabase auth) REST client. Keeps the current session in memory and
/// emits session events locally, the way the browser SDK does.
pub struct SupabaseAuth {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseAuth {
    pub fn new(base_url: String, anon_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build auth HTTP client")?;
        let (events, _) = broadcast::channel(64);
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            client,
            session: Mutex::new(None),
            events,
        })
    }

    fn stored_session(&self) -> Option<Session> {
        self.session.lock().ok().and_then(|s| s.clone())
    }

    fn replace_session(&self, kind: SessionEventKind, session: Option<Session>) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = session.clone();
        }
        // no subscribers is fine
        let _ = self.events.send(SessionEvent { kind, session });
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse auth response")?;

        if !status.is_success() {
            return Err(ProviderError::Rejected(error_message(&data, status)));
        }
        Ok(data)
    }
}

pub(crate) fn map_send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::connection(err)
    }
}

fn error_message(data: &serde_json::Value, status: reqwest::StatusCode) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| data[*key].as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("auth request failed ({status})"))
}

impl AccessTokenSource for SupabaseAuth {
    fn access_token(&self) -> Option<String> {
        self.stored_session().map(|s| s.access_token)
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        let Some(session) = self.stored_session() else {
            return Ok(None);
        };

        let resp = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(map_send_error)?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::info!(user_id = %session.user_id, "stored session expired");
            self.replace_session(SessionEventKind::SignedOut, None);
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Connection(format!(
                "auth provider returned {}",
                resp.status()
            )));
        }
        Ok(Some(session))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), ProviderError> {
        let data = self
            .post_json(
                "/auth/v1/token?grant_type=password",
                json!({ "email": email, "password": password }),
            )
            .await?;
        let token: TokenResponse =
            serde_json::from_value(data).context("unexpected sign-in response")?;

        let (Some(access_token), Some(user)) = (token.access_token, token.user) else {
            return Err(ProviderError::Rejected("sign-in returned no session".to_string()));
        };

        tracing::info!(user_id = %user.id, "signed in");
        self.replace_session(
            SessionEventKind::SignedIn,
            Some(Session::new(user.id, access_token)),
        );
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<String, ProviderError> {
        let data = self
            .post_json(
                "/auth/v1/signup",
                json!({ "email": email, "password": password }),
            )
            .await?;
        let token: TokenResponse =
            serde_json::from_value(data).context("unexpected sign-up response")?;

        let user_id = token
            .user
            .map(|u| u.id)
            .or(token.id)
            .ok_or_else(|| ProviderError::Rejected("sign-up returned no user".to_string()))?;

        // With email confirmation enabled there is no session until the user confirms.
        match token.access_token {
            Some(access_token) => {
                tracing::info!(user_id = %user_id, "signed up");
                self.replace_session(
                    SessionEventKind::SignedIn,
                    Some(Session::new(user_id.clone(), access_token)),
                );
            }
            None => tracing::info!(user_id = %user_id, "signed up, awaiting confirmation"),
        }
        Ok(user_id)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let Some(session) = self.stored_session() else {
            self.replace_session(SessionEventKind::SignedOut, None);
            return Ok(());
        };

        let resp = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(map_send_error)?;

        // 401 means the token is already dead server-side; still a sign-out.
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Rejected(format!(
                "sign-out failed ({})",
                resp.status()
            )));
        }

        tracing::info!(user_id = %session.user_id, "signed out");
        self.replace_session(SessionEventKind::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_description() {
        let data = json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        });
        assert_eq!(
            error_message(&data, reqwest::StatusCode::BAD_REQUEST),
            "Invalid login credentials"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let msg = error_message(&json!({}), reqwest::StatusCode::BAD_REQUEST);
        assert!(msg.contains("400"));
    }

    #[tokio::test]
    async fn test_sign_out_without_session_emits_event() {
        let auth = SupabaseAuth::new(
            "http://localhost:1".to_string(),
            "anon".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        let mut rx = auth.subscribe();
        auth.sign_out().await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, SessionEventKind::SignedOut);
        assert!(event.session.is_none());
    }

    #[tokio::test]
    async fn test_current_session_without_stored_session_is_none() {
        let auth = SupabaseAuth::new(
            "http://localhost:1".to_string(),
            "anon".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(auth.current_session().await.unwrap(), None);
    }
}
