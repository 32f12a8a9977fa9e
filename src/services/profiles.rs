use std::sync::Arc;

use crate::errors::ProviderError;
use crate::models::{Partner, ProfilePatch, SubType};
use crate::services::rows::{Filter, RowStore};

pub const PROFILES_TABLE: &str = "profiles";

/// Typed access to the `profiles` table.
#[derive(Clone)]
pub struct ProfileRepository {
    rows: Arc<dyn RowStore>,
}

impl ProfileRepository {
    pub fn new(rows: Arc<dyn RowStore>) -> Self {
        Self { rows }
    }

    /// `Ok(None)` when the user has no profile row yet.
    pub async fn fetch(&self, user_id: &str) -> Result<Option<Partner>, ProviderError> {
        match self
            .rows
            .get_row(PROFILES_TABLE, &Filter::eq("user_id", user_id))
            .await
        {
            Ok(row) => decode(row).map(Some),
            Err(ProviderError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn insert(&self, partner: &Partner) -> Result<Partner, ProviderError> {
        let data = serde_json::to_value(partner).map_err(ProviderError::connection)?;
        let row = self.rows.insert_row(PROFILES_TABLE, data).await?;
        decode(row)
    }

    pub async fn update(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), ProviderError> {
        let data = serde_json::to_value(patch).map_err(ProviderError::connection)?;
        self.rows
            .update_row(PROFILES_TABLE, &Filter::eq("user_id", user_id), data)
            .await
    }

    pub async fn count_by_sub_type(&self, sub_type: SubType) -> Result<u64, ProviderError> {
        self.rows
            .count_rows(PROFILES_TABLE, &Filter::eq("sub_type", sub_type.as_str()))
            .await
    }
}

fn decode(row: serde_json::Value) -> Result<Partner, ProviderError> {
    serde_json::from_value(row)
        .map_err(|e| ProviderError::Connection(format!("malformed profile row: {e}")))
}
