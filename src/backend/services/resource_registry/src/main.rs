use std::{path::Path, sync::Arc};

use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::{App as Cli, Arg};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use resource_registry::{
    api::resource_routes,
    config::{Backend, ServerConfig},
    models::Document,
    repositories::{
        postgres::create_pool, EntityRepository, MemoryRepository, PostgresJsonRepository,
    },
    services::RepositoryResource,
};

type DocumentRepository = dyn EntityRepository<Document, Uuid>;
type DocumentResource = RepositoryResource<DocumentRepository, Document, Uuid>;

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = Cli::new("resource-registry")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serves a JSON document collection over REST")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Path to the configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Port to listen on")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("backend")
                .short("b")
                .long("backend")
                .value_name("BACKEND")
                .help("Storage backend: memory or postgres")
                .takes_value(true),
        )
        .get_matches();

    let mut config = ServerConfig::load(matches.value_of("config").map(Path::new))?;
    if let Some(port) = matches.value_of("port") {
        config.port = port.parse().context("invalid --port")?;
    }
    if let Some(backend) = matches.value_of("backend") {
        config.backend = backend.parse()?;
    }

    let repository = build_repository(&config).await?;
    let resource: Arc<DocumentResource> =
        Arc::new(RepositoryResource::new(repository, config.resource_name()));

    tracing::info!(
        "Starting resource registry on {}:{} ({:?} backend, mounted at {})",
        config.bind_address,
        config.port,
        config.backend,
        config.resource_path
    );

    let resource_path = config.resource_path.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::from(resource.clone()))
            .service(resource_routes::<Document, Uuid, DocumentResource>(&resource_path))
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server
        .bind((config.bind_address.as_str(), config.port))
        .with_context(|| format!("failed to bind {}:{}", config.bind_address, config.port))?
        .run()
        .await?;

    Ok(())
}

async fn build_repository(config: &ServerConfig) -> Result<Arc<DocumentRepository>> {
    match config.backend {
        Backend::Memory => Ok(Arc::new(MemoryRepository::<Document, Uuid>::with_uuids())),
        Backend::Postgres => {
            let pool = create_pool(&config.postgres)
                .await
                .context("failed to connect to PostgreSQL")?;
            let repository =
                PostgresJsonRepository::<Document, Uuid>::with_uuids(pool, &config.postgres.table)?;
            repository.ensure_schema().await?;
            Ok(Arc::new(repository))
        }
    }
}
