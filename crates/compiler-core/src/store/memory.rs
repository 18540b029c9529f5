//! In-memory `CardStore`/`StrategyStore`, used by tests and by
//! `AppState::without_db` (mirroring `familiar-api`'s "run without
//! persistence" fallback). The pack has no test-container tooling to spin up
//! a real Postgres, so integration tests exercise the compiler against this
//! implementation instead.

use std::collections::HashMap;
use std::sync::Mutex;

use archetype_types::{CardId, StrategyId, Timestamp};
use async_trait::async_trait;

use crate::model::{Card, Strategy};

use super::{CardStore, StoreError, StoreResult, StrategyStore};

#[derive(Default)]
pub struct InMemoryCardStore {
    cards: Mutex<HashMap<CardId, Card>>,
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn create(&self, mut card: Card) -> StoreResult<Card> {
        card.id = CardId::new();
        let now = Timestamp::now();
        card.created_at = now.clone();
        card.updated_at = now;
        let mut guard = self.cards.lock().unwrap();
        guard.insert(card.id, card.clone());
        Ok(card)
    }

    async fn get(&self, id: &CardId) -> StoreResult<Option<Card>> {
        Ok(self.cards.lock().unwrap().get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Card>> {
        Ok(self.cards.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, mut card: Card) -> StoreResult<Card> {
        let mut guard = self.cards.lock().unwrap();
        let existing = guard.get(&card.id).ok_or(StoreError::NotFound)?;
        card.created_at = existing.created_at.clone();
        card.updated_at = Timestamp::now();
        guard.insert(card.id, card.clone());
        Ok(card)
    }

    async fn delete(&self, id: &CardId) -> StoreResult<()> {
        let mut guard = self.cards.lock().unwrap();
        guard.remove(id).ok_or(StoreError::NotFound)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStrategyStore {
    strategies: Mutex<HashMap<StrategyId, Strategy>>,
}

#[async_trait]
impl StrategyStore for InMemoryStrategyStore {
    async fn create(&self, mut strategy: Strategy) -> StoreResult<Strategy> {
        strategy.id = StrategyId::new();
        let now = Timestamp::now();
        strategy.version = 1;
        strategy.created_at = now.clone();
        strategy.updated_at = now;
        let mut guard = self.strategies.lock().unwrap();
        guard.insert(strategy.id, strategy.clone());
        Ok(strategy)
    }

    async fn get(&self, id: &StrategyId) -> StoreResult<Option<Strategy>> {
        Ok(self.strategies.lock().unwrap().get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Strategy>> {
        Ok(self.strategies.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, mut strategy: Strategy) -> StoreResult<Strategy> {
        let mut guard = self.strategies.lock().unwrap();
        let existing = guard.get(&strategy.id).ok_or(StoreError::NotFound)?;
        strategy.created_at = existing.created_at.clone();
        strategy.version = existing.version + 1;
        strategy.updated_at = Timestamp::now();
        guard.insert(strategy.id, strategy.clone());
        Ok(strategy)
    }

    async fn delete(&self, id: &StrategyId) -> StoreResult<()> {
        let mut guard = self.strategies.lock().unwrap();
        guard.remove(id).ok_or(StoreError::NotFound)?;
        Ok(())
    }

    async fn find_by_thread(&self, thread_id: &str) -> StoreResult<Option<Strategy>> {
        Ok(self
            .strategies
            .lock()
            .unwrap()
            .values()
            .find(|s| s.thread_id.as_deref() == Some(thread_id))
            .cloned())
    }

    async fn find_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Strategy>> {
        Ok(self
            .strategies
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StrategyStatus;

    fn new_strategy() -> Strategy {
        Strategy {
            id: StrategyId::new(),
            owner_id: None,
            thread_id: None,
            name: "S".to_string(),
            status: StrategyStatus::Draft,
            universe: vec!["BTC-USD".to_string()],
            attachments: vec![],
            version: 0,
            created_at: Timestamp::from_raw(""),
            updated_at: Timestamp::from_raw(""),
        }
    }

    #[tokio::test]
    async fn create_assigns_version_one() {
        let store = InMemoryStrategyStore::default();
        let created = store.create(new_strategy()).await.unwrap();
        assert_eq!(created.version, 1);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn update_increments_version_and_preserves_created_at() {
        let store = InMemoryStrategyStore::default();
        let created = store.create(new_strategy()).await.unwrap();
        let created_at = created.created_at.clone();

        let mut to_update = created.clone();
        to_update.name = "S2".to_string();
        let updated = store.update(to_update).await.unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.created_at, created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn delete_fails_if_absent() {
        let store = InMemoryStrategyStore::default();
        let result = store.delete(&StrategyId::new()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
