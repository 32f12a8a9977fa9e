pub mod supabase;

use async_trait::async_trait;

use crate::errors::ProviderError;

pub type Row = serde_json::Value;

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Exactly one row, or `ProviderError::NotFound`.
    async fn get_row(&self, table: &str, filter: &Filter) -> Result<Row, ProviderError>;

    async fn insert_row(&self, table: &str, data: Row) -> Result<Row, ProviderError>;

    async fn update_row(&self, table: &str, filter: &Filter, patch: Row)
        -> Result<(), ProviderError>;

    async fn count_rows(&self, table: &str, filter: &Filter) -> Result<u64, ProviderError>;
}
