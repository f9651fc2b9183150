use async_trait::async_trait;
use thiserror::Error;

use shopguide_core::domain::order::OrderSummary;
use shopguide_core::domain::product::Product;
use shopguide_core::domain::profile::{UserId, UserProfile};

pub mod catalog;
pub mod memory;
pub mod orders;
pub mod profile;

pub use catalog::SqlCatalogRepository;
pub use memory::{InMemoryCatalogRepository, InMemoryOrderRepository, InMemoryProfileRepository};
pub use orders::SqlOrderRepository;
pub use profile::SqlProfileRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read-only catalog access. The snapshot is fetched fresh each turn and
/// never written by the guide subsystem.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Products ordered by descending `ai_score`, insertion order on ties.
    async fn list_by_ai_score(&self) -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;

    /// Replaces the entire tag collection for the user (insert-or-overwrite).
    /// Concurrent upserts for the same user are last-writer-wins.
    async fn upsert_tags(&self, user_id: &UserId, tags: &[String])
        -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Most-recent-first order summaries, at most `limit` of them.
    async fn list_recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<OrderSummary>, RepositoryError>;
}
