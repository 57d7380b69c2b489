use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

use async_trait::async_trait;
use resource_models::Identifiable;
use serde::{de::DeserializeOwned, Serialize};

use crate::utils::errors::Result;

/// Identifier usable as a map key, a path segment and a column value.
pub trait EntityId:
    Clone + Eq + Ord + Hash + Display + FromStr + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> EntityId for T where
    T: Clone
        + Eq
        + Ord
        + Hash
        + Display
        + FromStr
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Record type a repository can store and the HTTP layer can (de)serialize.
pub trait Entity<ID>:
    Identifiable<Id = ID> + Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
}

impl<T, ID> Entity<ID> for T where
    T: Identifiable<Id = ID> + Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
}

/// Storage contract every data-store backend fulfils.
#[async_trait]
pub trait EntityRepository<E, ID>: Send + Sync
where
    E: Entity<ID>,
    ID: EntityId,
{
    async fn find_all(&self) -> Result<Vec<E>>;

    async fn find_by_id(&self, id: &ID) -> Result<Option<E>>;

    async fn exists(&self, id: &ID) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Inserts a new entity, assigning an id when it has none.
    /// Fails with `Conflict` when the entity's id is already taken.
    async fn persist(&self, entity: E) -> Result<E>;

    /// Stores `entity` under `id`, replacing what was there.
    /// The flag is `true` when nothing existed under `id` before.
    async fn upsert(&self, id: ID, entity: E) -> Result<(E, bool)>;

    async fn delete_by_id(&self, id: &ID) -> Result<bool>;

    async fn count(&self) -> Result<u64>;
}
