pub mod supabase;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::ProviderError;
use crate::models::{Session, SessionEvent};

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<(), ProviderError>;

    /// Returns the id of the created user.
    async fn sign_up(&self, email: &str, password: &str) -> Result<String, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Every session transition after this call, until the receiver is dropped.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Bearer token for backend calls made on behalf of the signed-in user.
pub trait AccessTokenSource: Send + Sync {
    fn access_token(&self) -> Option<String>;
}
