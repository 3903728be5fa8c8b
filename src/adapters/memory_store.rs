use crate::domain::model::Headquarter;
use crate::domain::ports::{DocumentStore, Filter, Projection, Update, UpdateResult};
use crate::utils::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-process document store keyed by `swiftCode`.
///
/// Each operation holds the lock for its whole duration, which gives the same single-document
/// atomicity a real document database offers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Headquarter>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_indexes(&self) -> StoreResult<()> {
        // swiftCode 唯一性由 map key 保證
        Ok(())
    }

    async fn find_one(
        &self,
        filter: &Filter,
        projection: Projection,
    ) -> StoreResult<Option<Headquarter>> {
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .find(|doc| filter.matches(doc))
            .cloned()
            .map(|doc| projection.apply(filter, doc)))
    }

    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Headquarter>> {
        let docs = self.docs.read().await;
        Ok(docs.values().filter(|doc| filter.matches(doc)).cloned().collect())
    }

    async fn insert_one(&self, doc: &Headquarter) -> StoreResult<()> {
        let mut docs = self.docs.write().await;
        let key = doc.swift_code.to_string();
        if docs.contains_key(&key) {
            return Err(StoreError::DuplicateKey { key });
        }
        docs.insert(key, doc.clone());
        Ok(())
    }

    async fn insert_many(&self, batch: &[Headquarter]) -> StoreResult<usize> {
        let mut docs = self.docs.write().await;
        for doc in batch {
            if docs.contains_key(doc.swift_code.as_str()) {
                return Err(StoreError::DuplicateKey {
                    key: doc.swift_code.to_string(),
                });
            }
        }
        for doc in batch {
            docs.insert(doc.swift_code.to_string(), doc.clone());
        }
        Ok(batch.len())
    }

    async fn update_one(&self, filter: &Filter, update: &Update) -> StoreResult<UpdateResult> {
        let mut docs = self.docs.write().await;
        let Some(doc) = docs.values_mut().find(|doc| filter.matches(doc)) else {
            return Ok(UpdateResult::default());
        };

        let modified = update.apply(doc);
        Ok(UpdateResult {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let mut docs = self.docs.write().await;
        let key = docs
            .iter()
            .find(|(_, doc)| filter.matches(doc))
            .map(|(key, _)| key.clone());

        Ok(match key {
            Some(key) => {
                docs.remove(&key);
                1
            }
            None => 0,
        })
    }

    async fn drop_collection(&self) -> StoreResult<()> {
        self.docs.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.docs.read().await.len() as u64)
    }
}
