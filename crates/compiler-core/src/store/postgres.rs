//! Postgres-backed `CardStore`/`StrategyStore` via `sea-orm` + `sqlx`.
//!
//! Each collection is a table with a `TEXT PRIMARY KEY` id column and a
//! `JSONB` body column holding the document verbatim, with `id` excluded
//! from the body (spec.md §6, "Persisted layout"). This is the document-store
//! shape `original_source/src/db/firestore_client.py` implements against
//! Firestore; no Rust crate in the pack talks to Firestore, so this adapter
//! follows the teacher's actual stack instead (see SPEC_FULL.md §2).
//!
//! Entity modules mirror `familiar-core::entities::db::conversation::message`'s
//! `DeriveEntityModel` style.

use archetype_types::{CardId, StrategyId};
use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, DatabaseConnection};
use serde_json::Value;

use crate::model::{Card, Strategy};

use super::{CardStore, StoreError, StoreResult, StrategyStore};

pub mod card_entity {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize, serde::Deserialize)]
    #[sea_orm(table_name = "cards")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(column_type = "JsonBinary")]
        pub body: Json,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod strategy_entity {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize, serde::Deserialize)]
    #[sea_orm(table_name = "strategies")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(column_type = "JsonBinary")]
        pub body: Json,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

fn query_err(err: sea_orm::DbErr) -> StoreError {
    StoreError::Query(err.to_string())
}

/// Splits a `Card`/`Strategy` into its id and an `id`-free body `Value`, the
/// way the document store requires (spec.md §6).
fn card_body(card: &Card) -> Value {
    let mut body = serde_json::to_value(card).unwrap_or_default();
    if let Some(obj) = body.as_object_mut() {
        obj.remove("id");
    }
    body
}

fn card_from_row(id: &str, body: Value) -> StoreResult<Card> {
    let mut obj = body.as_object().cloned().unwrap_or_default();
    obj.insert("id".to_string(), Value::String(id.to_string()));
    serde_json::from_value(Value::Object(obj))
        .map_err(|e| StoreError::Query(format!("corrupt card row {id}: {e}")))
}

fn strategy_body(strategy: &Strategy) -> Value {
    let mut body = serde_json::to_value(strategy).unwrap_or_default();
    if let Some(obj) = body.as_object_mut() {
        obj.remove("id");
    }
    body
}

fn strategy_from_row(id: &str, body: Value) -> StoreResult<Strategy> {
    let mut obj = body.as_object().cloned().unwrap_or_default();
    obj.insert("id".to_string(), Value::String(id.to_string()));
    serde_json::from_value(Value::Object(obj))
        .map_err(|e| StoreError::Query(format!("corrupt strategy row {id}: {e}")))
}

pub struct PostgresCardStore {
    db: DatabaseConnection,
}

impl PostgresCardStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CardStore for PostgresCardStore {
    async fn create(&self, mut card: Card) -> StoreResult<Card> {
        card.id = CardId::new();
        let now = archetype_types::Timestamp::now();
        card.created_at = now.clone();
        card.updated_at = now;

        let row = card_entity::ActiveModel {
            id: ActiveValue::Set(card.id.to_string()),
            body: ActiveValue::Set(card_body(&card)),
        };
        row.insert(&self.db).await.map_err(query_err)?;
        Ok(card)
    }

    async fn get(&self, id: &CardId) -> StoreResult<Option<Card>> {
        let row = card_entity::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(query_err)?;
        row.map(|r| card_from_row(&r.id, r.body)).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Card>> {
        let rows = card_entity::Entity::find()
            .all(&self.db)
            .await
            .map_err(query_err)?;
        rows.into_iter()
            .map(|r| card_from_row(&r.id, r.body))
            .collect()
    }

    async fn update(&self, mut card: Card) -> StoreResult<Card> {
        let existing = card_entity::Entity::find_by_id(card.id.to_string())
            .one(&self.db)
            .await
            .map_err(query_err)?
            .ok_or(StoreError::NotFound)?;
        let existing = card_from_row(&existing.id, existing.body)?;
        card.created_at = existing.created_at;
        card.updated_at = archetype_types::Timestamp::now();

        let row = card_entity::ActiveModel {
            id: ActiveValue::Unchanged(card.id.to_string()),
            body: ActiveValue::Set(card_body(&card)),
        };
        row.update(&self.db).await.map_err(query_err)?;
        Ok(card)
    }

    async fn delete(&self, id: &CardId) -> StoreResult<()> {
        let result = card_entity::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(query_err)?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

pub struct PostgresStrategyStore {
    db: DatabaseConnection,
}

impl PostgresStrategyStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StrategyStore for PostgresStrategyStore {
    async fn create(&self, mut strategy: Strategy) -> StoreResult<Strategy> {
        strategy.id = StrategyId::new();
        strategy.version = 1;
        let now = archetype_types::Timestamp::now();
        strategy.created_at = now.clone();
        strategy.updated_at = now;

        let row = strategy_entity::ActiveModel {
            id: ActiveValue::Set(strategy.id.to_string()),
            body: ActiveValue::Set(strategy_body(&strategy)),
        };
        row.insert(&self.db).await.map_err(query_err)?;
        Ok(strategy)
    }

    async fn get(&self, id: &StrategyId) -> StoreResult<Option<Strategy>> {
        let row = strategy_entity::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(query_err)?;
        row.map(|r| strategy_from_row(&r.id, r.body)).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Strategy>> {
        let rows = strategy_entity::Entity::find()
            .all(&self.db)
            .await
            .map_err(query_err)?;
        rows.into_iter()
            .map(|r| strategy_from_row(&r.id, r.body))
            .collect()
    }

    async fn update(&self, mut strategy: Strategy) -> StoreResult<Strategy> {
        let existing = strategy_entity::Entity::find_by_id(strategy.id.to_string())
            .one(&self.db)
            .await
            .map_err(query_err)?
            .ok_or(StoreError::NotFound)?;
        let existing = strategy_from_row(&existing.id, existing.body)?;
        strategy.created_at = existing.created_at;
        strategy.version = existing.version + 1;
        strategy.updated_at = archetype_types::Timestamp::now();

        let row = strategy_entity::ActiveModel {
            id: ActiveValue::Unchanged(strategy.id.to_string()),
            body: ActiveValue::Set(strategy_body(&strategy)),
        };
        row.update(&self.db).await.map_err(query_err)?;
        Ok(strategy)
    }

    async fn delete(&self, id: &StrategyId) -> StoreResult<()> {
        let result = strategy_entity::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(query_err)?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_by_thread(&self, thread_id: &str) -> StoreResult<Option<Strategy>> {
        // Embedded-document filter: JSONB-body queries on the
        // document-store substitute don't have a typed sea-orm column to
        // filter on, so this loads and filters in-process. Acceptable at
        // this scale; revisit with a generated column if the strategies
        // table grows large.
        let all = self.list().await?;
        Ok(all.into_iter().find(|s| s.thread_id.as_deref() == Some(thread_id)))
    }

    async fn find_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Strategy>> {
        let all = self.list().await?;
        Ok(all
            .into_iter()
            .filter(|s| s.owner_id.as_deref() == Some(owner_id))
            .collect())
    }
}
