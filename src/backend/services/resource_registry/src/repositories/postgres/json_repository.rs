use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use resource_models::{IdGenerator, UuidGenerator};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::repositories::traits::{Entity, EntityId, EntityRepository};
use crate::utils::errors::{Result, ServiceError};

const MAX_GENERATED_ID_ATTEMPTS: usize = 8;

/// PostgreSQL store keeping each entity as a JSONB document.
///
/// Ids are stored in their `Display` form, so any `EntityId` works as long
/// as it round-trips through `FromStr`.
pub struct PostgresJsonRepository<E, ID> {
    pool: PgPool,
    table: String,
    ids: Box<dyn IdGenerator<ID>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, ID> PostgresJsonRepository<E, ID> {
    /// Create a repository over `table`, which must be a plain SQL identifier.
    pub fn new(pool: PgPool, table: &str, ids: impl IdGenerator<ID> + 'static) -> Result<Self> {
        validate_table_name(table)?;

        Ok(Self {
            pool,
            table: table.to_string(),
            ids: Box::new(ids),
            _entity: PhantomData,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the backing table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                document JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        tracing::info!(table = %self.table, "document table ready");
        Ok(())
    }
}

impl<E> PostgresJsonRepository<E, Uuid> {
    pub fn with_uuids(pool: PgPool, table: &str) -> Result<Self> {
        Self::new(pool, table, UuidGenerator)
    }
}

impl<E, ID> fmt::Debug for PostgresJsonRepository<E, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresJsonRepository")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<E, ID> PostgresJsonRepository<E, ID>
where
    E: Entity<ID>,
    ID: EntityId,
{
    async fn insert(&self, id: &ID, entity: &E) -> Result<bool> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, document, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
            self.table
        );

        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .bind(serde_json::to_value(entity)?)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl<E, ID> EntityRepository<E, ID> for PostgresJsonRepository<E, ID>
where
    E: Entity<ID>,
    ID: EntityId,
{
    async fn find_all(&self) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT document FROM {} ORDER BY created_at, id",
            self.table
        );
        let records = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut entities = Vec::with_capacity(records.len());
        for record in records {
            let document: serde_json::Value = record.try_get("document")?;
            entities.push(serde_json::from_value(document)?);
        }

        Ok(entities)
    }

    async fn find_by_id(&self, id: &ID) -> Result<Option<E>> {
        let sql = format!("SELECT document FROM {} WHERE id = $1", self.table);
        let record = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match record {
            Some(r) => {
                let document: serde_json::Value = r.try_get("document")?;
                Ok(Some(serde_json::from_value(document)?))
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, id: &ID) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1) AS present",
            self.table
        );
        let record = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(record.try_get("present")?)
    }

    async fn persist(&self, mut entity: E) -> Result<E> {
        entity.touch(Utc::now());

        if let Some(id) = entity.id().cloned() {
            if !self.insert(&id, &entity).await? {
                return Err(ServiceError::Conflict(format!("entity {} already exists", id)));
            }
            return Ok(entity);
        }

        for _ in 0..MAX_GENERATED_ID_ATTEMPTS {
            let id = self.ids.next_id().ok_or_else(|| {
                tracing::error!(table = %self.table, "id generator exhausted");
                ServiceError::InternalError
            })?;
            entity.set_id(id.clone());
            if self.insert(&id, &entity).await? {
                return Ok(entity);
            }
            tracing::warn!(table = %self.table, %id, "generated id already taken, retrying");
        }

        Err(ServiceError::InternalError)
    }

    async fn upsert(&self, id: ID, mut entity: E) -> Result<(E, bool)> {
        entity.set_id(id.clone());
        entity.touch(Utc::now());

        let mut tx = self.pool.begin().await?;

        // Lock the current row so its document cannot change before the write.
        let select_sql = format!(
            "SELECT document FROM {} WHERE id = $1 FOR UPDATE",
            self.table
        );
        let previous = sqlx::query(&select_sql)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(r) = previous {
            let document: serde_json::Value = r.try_get("document")?;
            let previous: E = serde_json::from_value(document)?;
            entity.inherit_from(&previous);
        }

        // xmax is zero only for freshly inserted rows.
        let sql = format!(
            r#"
            INSERT INTO {} (id, document, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (id)
            DO UPDATE SET
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
            RETURNING (xmax = 0) AS inserted
            "#,
            self.table
        );

        let record = sqlx::query(&sql)
            .bind(id.to_string())
            .bind(serde_json::to_value(&entity)?)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;
        let created: bool = record.try_get("inserted")?;

        tx.commit().await?;
        Ok((entity, created))
    }

    async fn delete_by_id(&self, id: &ID) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", self.table);
        let record = sqlx::query(&sql).fetch_one(&self.pool).await?;

        let total: i64 = record.try_get("total")?;
        Ok(total as u64)
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            table.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "invalid table name '{}'",
            table
        )))
    }
}
