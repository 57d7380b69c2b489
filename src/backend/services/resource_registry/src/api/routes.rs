use actix_web::{http::header, web, HttpRequest, HttpResponse, Scope};

use crate::repositories::traits::{Entity, EntityId};
use crate::services::crud_resource::{CrudResource, UpdateOutcome};
use crate::utils::errors::{Result, ServiceError};

/// Mount the five CRUD endpoints for `R` under `path`.
///
/// The resource itself is looked up as `web::Data<R>`, so it must be
/// registered with `App::app_data` by the caller.
pub fn resource_routes<E, ID, R>(path: &str) -> Scope
where
    E: Entity<ID>,
    ID: EntityId,
    R: CrudResource<E, ID> + 'static,
{
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        ServiceError::ValidationError(err.to_string()).into()
    });

    web::scope(path)
        .app_data(json_config)
        .route("", web::get().to(list_entities::<E, ID, R>))
        .route("", web::post().to(add_entity::<E, ID, R>))
        .route("/{id}", web::get().to(get_entity::<E, ID, R>))
        .route("/{id}", web::put().to(update_entity::<E, ID, R>))
        .route("/{id}", web::delete().to(delete_entity::<E, ID, R>))
}

/// `Location` value for `id` inside the collection mounted at `collection`.
fn location_of<ID: EntityId>(collection: &str, id: &ID) -> String {
    format!("{}/{}", collection.trim_end_matches('/'), id)
}

fn parse_id<ID: EntityId>(raw: &str) -> Result<ID> {
    raw.parse::<ID>()
        .map_err(|_| ServiceError::ValidationError(format!("invalid id '{}'", raw)))
}

async fn list_entities<E, ID, R>(resource: web::Data<R>) -> Result<HttpResponse>
where
    E: Entity<ID>,
    ID: EntityId,
    R: CrudResource<E, ID> + 'static,
{
    let entities = resource.list().await?;
    Ok(HttpResponse::Ok().json(entities))
}

async fn get_entity<E, ID, R>(
    resource: web::Data<R>,
    id: web::Path<String>,
) -> Result<HttpResponse>
where
    E: Entity<ID>,
    ID: EntityId,
    R: CrudResource<E, ID> + 'static,
{
    let id = parse_id::<ID>(&id)?;
    let entity = resource.get(id).await?;
    Ok(HttpResponse::Ok().json(entity))
}

async fn add_entity<E, ID, R>(
    req: HttpRequest,
    resource: web::Data<R>,
    body: web::Json<E>,
) -> Result<HttpResponse>
where
    E: Entity<ID>,
    ID: EntityId,
    R: CrudResource<E, ID> + 'static,
{
    let created = resource.add(body.into_inner()).await?;
    let location = location_of(req.path(), &created.id);

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location))
        .json(created.entity))
}

async fn update_entity<E, ID, R>(
    req: HttpRequest,
    resource: web::Data<R>,
    id: web::Path<String>,
    body: web::Json<E>,
) -> Result<HttpResponse>
where
    E: Entity<ID>,
    ID: EntityId,
    R: CrudResource<E, ID> + 'static,
{
    let id = parse_id::<ID>(&id)?;

    match resource.update(id, body.into_inner()).await? {
        UpdateOutcome::Updated => Ok(HttpResponse::NoContent().finish()),
        UpdateOutcome::Created(created) => {
            // Rebuilt from the parsed id so the header matches the body.
            let collection = req
                .path()
                .rsplit_once('/')
                .map(|(collection, _)| collection)
                .unwrap_or_default();
            Ok(HttpResponse::Created()
                .insert_header((header::LOCATION, location_of(collection, &created.id)))
                .json(created.entity))
        }
    }
}

async fn delete_entity<E, ID, R>(
    resource: web::Data<R>,
    id: web::Path<String>,
) -> Result<HttpResponse>
where
    E: Entity<ID>,
    ID: EntityId,
    R: CrudResource<E, ID> + 'static,
{
    let id = parse_id::<ID>(&id)?;
    resource.delete(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
