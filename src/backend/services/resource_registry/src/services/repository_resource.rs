use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::repositories::traits::{Entity, EntityId, EntityRepository};
use crate::services::crud_resource::{Created, CrudResource, UpdateOutcome};
use crate::utils::errors::{Result, ServiceError};

/// [`CrudResource`] backed by any [`EntityRepository`].
pub struct RepositoryResource<R: ?Sized, E, ID> {
    repository: Arc<R>,
    name: String,
    _entity: PhantomData<fn() -> (E, ID)>,
}

impl<R: ?Sized, E, ID> RepositoryResource<R, E, ID> {
    /// `name` identifies the collection in logs and error messages.
    pub fn new(repository: Arc<R>, name: impl Into<String>) -> Self {
        Self {
            repository,
            name: name.into(),
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn not_found(&self, id: &impl std::fmt::Display) -> ServiceError {
        ServiceError::NotFound(format!("{} {}", self.name, id))
    }
}

#[async_trait]
impl<R, E, ID> CrudResource<E, ID> for RepositoryResource<R, E, ID>
where
    R: EntityRepository<E, ID> + ?Sized,
    E: Entity<ID>,
    ID: EntityId,
{
    async fn list(&self) -> Result<Vec<E>> {
        let entities = self.repository.find_all().await?;
        tracing::debug!(resource = %self.name, count = entities.len(), "listed entities");
        Ok(entities)
    }

    async fn get(&self, id: ID) -> Result<E> {
        match self.repository.find_by_id(&id).await? {
            Some(entity) => {
                tracing::debug!(resource = %self.name, %id, "fetched entity");
                Ok(entity)
            }
            None => {
                tracing::warn!(resource = %self.name, %id, "entity not found");
                Err(self.not_found(&id))
            }
        }
    }

    async fn add(&self, entity: E) -> Result<Created<E, ID>> {
        let entity = match self.repository.persist(entity).await {
            Ok(entity) => entity,
            Err(ServiceError::Conflict(reason)) => {
                tracing::warn!(resource = %self.name, %reason, "rejected duplicate entity");
                return Err(ServiceError::Conflict(reason));
            }
            Err(e) => return Err(e),
        };

        let id = entity.id().cloned().ok_or(ServiceError::InternalError)?;
        tracing::info!(resource = %self.name, %id, "created entity");

        Ok(Created { entity, id })
    }

    async fn update(&self, id: ID, entity: E) -> Result<UpdateOutcome<E, ID>> {
        let (entity, created) = self.repository.upsert(id.clone(), entity).await?;

        if created {
            tracing::info!(resource = %self.name, %id, "created entity on update");
            Ok(UpdateOutcome::Created(Created { entity, id }))
        } else {
            tracing::info!(resource = %self.name, %id, "updated entity");
            Ok(UpdateOutcome::Updated)
        }
    }

    async fn delete(&self, id: ID) -> Result<()> {
        if self.repository.delete_by_id(&id).await? {
            tracing::info!(resource = %self.name, %id, "deleted entity");
            Ok(())
        } else {
            tracing::warn!(resource = %self.name, %id, "entity not found for delete");
            Err(self.not_found(&id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use crate::repositories::MemoryRepository;
    use uuid::Uuid;

    fn resource() -> RepositoryResource<MemoryRepository<Document, Uuid>, Document, Uuid> {
        RepositoryResource::new(Arc::new(MemoryRepository::with_uuids()), "documents")
    }

    #[tokio::test]
    async fn add_then_get_returns_same_entity() {
        let resource = resource();

        let created = resource
            .add(Document::new().with_field("title", "Dune"))
            .await
            .unwrap();
        let fetched = resource.get(created.id).await.unwrap();

        assert_eq!(fetched, created.entity);
        assert_eq!(fetched.id, Some(created.id));
    }

    #[tokio::test]
    async fn list_contains_added_entity() {
        let resource = resource();
        let created = resource
            .add(Document::new().with_field("title", "Emma"))
            .await
            .unwrap();

        let all = resource.list().await.unwrap();

        assert!(all.contains(&created.entity));
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let err = resource().get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let resource = resource();
        let created = resource.add(Document::new()).await.unwrap();

        resource.delete(created.id).await.unwrap();

        let err = resource.get(created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let resource = resource();
        let created = resource.add(Document::new()).await.unwrap();

        resource.delete(created.id).await.unwrap();
        let err = resource.delete(created.id).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_existing_replaces_in_place() {
        let resource = resource();
        let created = resource
            .add(Document::new().with_field("title", "Draft"))
            .await
            .unwrap();

        let outcome = resource
            .update(created.id, Document::new().with_field("title", "Final"))
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Updated);
        let fetched = resource.get(created.id).await.unwrap();
        assert_eq!(fetched.field("title"), Some(&serde_json::json!("Final")));
        assert_eq!(resource.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_server_creation_time() {
        let resource = resource();
        let created = resource
            .add(Document::new().with_field("title", "Draft"))
            .await
            .unwrap();
        let before = resource.get(created.id).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let mut body = Document::new().with_field("title", "Final");
        body.created_at = Some(chrono::Utc::now() - chrono::Duration::days(1));
        resource.update(created.id, body).await.unwrap();
        let after = resource.get(created.id).await.unwrap();

        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.field("title"), Some(&serde_json::json!("Final")));
    }

    #[tokio::test]
    async fn update_absent_creates_under_path_id() {
        let resource = resource();
        let id = Uuid::new_v4();
        let mut body = Document::new().with_field("title", "New");
        body.id = Some(Uuid::new_v4());

        let outcome = resource.update(id, body).await.unwrap();

        match outcome {
            UpdateOutcome::Created(created) => {
                assert_eq!(created.id, id);
                assert_eq!(created.entity.id, Some(id));
            }
            UpdateOutcome::Updated => panic!("expected creation"),
        }
        assert!(resource.get(id).await.is_ok());
    }
}
