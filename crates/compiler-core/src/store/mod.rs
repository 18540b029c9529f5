//! Card/Strategy store (component B): durable CRUD with auto-ID and
//! monotonic version. Two implementations are provided: [`memory`] (used by
//! tests and `AppState::without_db`) and [`postgres`] (the teacher's actual
//! stack — `sea-orm` + `sqlx` against Postgres — standing in for the
//! Firestore document store `original_source/` actually talks to; see
//! SPEC_FULL.md §2 for why).

pub mod memory;
pub mod postgres;

use archetype_types::{CardId, StrategyId};
use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Card, Strategy};

/// Leaf storage error, grounded on `familiar-core::internal::errors::DbStoreError`.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CardStore: Send + Sync {
    async fn create(&self, card: Card) -> StoreResult<Card>;
    async fn get(&self, id: &CardId) -> StoreResult<Option<Card>>;
    async fn list(&self) -> StoreResult<Vec<Card>>;
    async fn update(&self, card: Card) -> StoreResult<Card>;
    async fn delete(&self, id: &CardId) -> StoreResult<()>;
}

#[async_trait]
pub trait StrategyStore: Send + Sync {
    async fn create(&self, strategy: Strategy) -> StoreResult<Strategy>;
    async fn get(&self, id: &StrategyId) -> StoreResult<Option<Strategy>>;
    async fn list(&self) -> StoreResult<Vec<Strategy>>;
    async fn update(&self, strategy: Strategy) -> StoreResult<Strategy>;
    async fn delete(&self, id: &StrategyId) -> StoreResult<()>;
    async fn find_by_thread(&self, thread_id: &str) -> StoreResult<Option<Strategy>>;
    async fn find_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Strategy>>;
}
