use async_trait::async_trait;

use crate::repositories::traits::{Entity, EntityId};
use crate::utils::errors::Result;

/// A freshly created entity together with the id it can be found under.
#[derive(Debug, Clone, PartialEq)]
pub struct Created<E, ID> {
    pub entity: E,
    pub id: ID,
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<E, ID> {
    /// An existing entity was replaced; nothing to send back.
    Updated,
    /// Nothing existed under the id, so a new entity was created there.
    Created(Created<E, ID>),
}

/// Store-agnostic CRUD operations over one collection of entities.
///
/// Data-store backends plug in underneath through
/// [`EntityRepository`](crate::repositories::EntityRepository); the HTTP
/// layer in [`crate::api::routes`] only talks to this trait.
#[async_trait]
pub trait CrudResource<E, ID>: Send + Sync
where
    E: Entity<ID>,
    ID: EntityId,
{
    /// All entities. No pagination, filtering or ordering guarantees.
    async fn list(&self) -> Result<Vec<E>>;

    /// Fails with `NotFound` when nothing is stored under `id`.
    async fn get(&self, id: ID) -> Result<E>;

    async fn add(&self, entity: E) -> Result<Created<E, ID>>;

    /// Replace the entity under `id`, or create it there when absent.
    async fn update(&self, id: ID, entity: E) -> Result<UpdateOutcome<E, ID>>;

    /// Fails with `NotFound` when nothing is stored under `id`.
    async fn delete(&self, id: ID) -> Result<()>;
}
