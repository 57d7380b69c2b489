use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use resource_models::{IdGenerator, SequenceGenerator, UuidGenerator};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repositories::traits::{Entity, EntityId, EntityRepository};
use crate::utils::errors::{Result, ServiceError};

/// In-process document store keyed by id.
///
/// Entities come back from `find_all` ordered by id. A single write guard
/// covers each check-and-write, so concurrent `persist` calls for the same
/// id cannot both succeed.
pub struct MemoryRepository<E, ID> {
    entries: RwLock<BTreeMap<ID, E>>,
    ids: Box<dyn IdGenerator<ID>>,
}

impl<E, ID> MemoryRepository<E, ID> {
    pub fn new(ids: impl IdGenerator<ID> + 'static) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            ids: Box::new(ids),
        }
    }

    fn next_id(&self) -> Result<ID> {
        self.ids.next_id().ok_or_else(|| {
            tracing::error!("id generator exhausted");
            ServiceError::InternalError
        })
    }
}

impl<E> MemoryRepository<E, Uuid> {
    pub fn with_uuids() -> Self {
        Self::new(UuidGenerator)
    }
}

impl<E> MemoryRepository<E, i64> {
    pub fn with_sequence() -> Self {
        Self::new(SequenceGenerator::new())
    }
}

impl<E, ID> fmt::Debug for MemoryRepository<E, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRepository").finish_non_exhaustive()
    }
}

#[async_trait]
impl<E, ID> EntityRepository<E, ID> for MemoryRepository<E, ID>
where
    E: Entity<ID>,
    ID: EntityId,
{
    async fn find_all(&self) -> Result<Vec<E>> {
        let entries = self.entries.read().await;
        Ok(entries.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &ID) -> Result<Option<E>> {
        let entries = self.entries.read().await;
        Ok(entries.get(id).cloned())
    }

    async fn exists(&self, id: &ID) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.contains_key(id))
    }

    async fn persist(&self, mut entity: E) -> Result<E> {
        let mut entries = self.entries.write().await;

        let id = match entity.id() {
            Some(id) if entries.contains_key(id) => {
                return Err(ServiceError::Conflict(format!("entity {} already exists", id)));
            }
            Some(id) => id.clone(),
            None => {
                // Skip ids a client already claimed explicitly.
                let mut id = self.next_id()?;
                while entries.contains_key(&id) {
                    id = self.next_id()?;
                }
                entity.set_id(id.clone());
                id
            }
        };

        entity.touch(Utc::now());
        entries.insert(id, entity.clone());
        Ok(entity)
    }

    async fn upsert(&self, id: ID, mut entity: E) -> Result<(E, bool)> {
        entity.set_id(id.clone());
        entity.touch(Utc::now());

        let mut entries = self.entries.write().await;
        if let Some(previous) = entries.get(&id) {
            entity.inherit_from(previous);
        }
        let created = entries.insert(id, entity.clone()).is_none();
        Ok((entity, created))
    }

    async fn delete_by_id(&self, id: &ID) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        let entries = self.entries.read().await;
        Ok(entries.len() as u64)
    }
}
