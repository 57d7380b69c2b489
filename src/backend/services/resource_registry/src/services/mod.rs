pub mod crud_resource;
pub mod repository_resource;

pub use crud_resource::{Created, CrudResource, UpdateOutcome};
pub use repository_resource::RepositoryResource;
