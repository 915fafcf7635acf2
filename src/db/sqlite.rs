/// SQLite-backed document store
///
/// One table holds every collection; each row is a JSON document body keyed
/// by `(collection, id)`.
use crate::{
    db::{
        merge_fields, now_timestamp, resolve_sentinels, Direction, Document, DocumentStore, Fields,
        OrderBy, WriteMode,
    },
    error::{CmsError, CmsResult},
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

fn persistence(context: &'static str) -> impl FnOnce(sqlx::Error) -> CmsError {
    move |e| CmsError::Persistence(format!("{}: {}", context, e))
}

/// Document store on top of a SQLite database file
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) a database file and ensure the schema exists
    pub async fn connect(path: &Path, options: DatabaseOptions) -> CmsResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(if options.enable_wal {
                        SqliteJournalMode::Wal
                    } else {
                        SqliteJournalMode::Delete
                    })
                    .busy_timeout(std::time::Duration::from_secs(5)),
            )
            .await
            .map_err(persistence("Failed to open document database"))?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Private in-memory database (single connection so every query sees the same data)
    pub async fn in_memory() -> CmsResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(persistence("Failed to open in-memory database"))?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create the documents table if it does not exist
    async fn initialize(&self) -> CmsResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(persistence("Failed to create documents table"))?;

        Ok(())
    }

    /// Test database connection
    pub async fn ping(&self) -> CmsResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(persistence("Database ping failed"))?;

        Ok(())
    }

    fn encode(fields: &Fields) -> CmsResult<String> {
        Ok(serde_json::to_string(fields)?)
    }

    fn decode(body: &str) -> CmsResult<Fields> {
        Ok(serde_json::from_str(body)?)
    }

    fn json_path(field: &str) -> String {
        format!("$.{}", field)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> CmsResult<Option<Document>> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence("Failed to read document"))?;

        body.map(|body| {
            Ok(Document {
                id: id.to_string(),
                fields: Self::decode(&body)?,
            })
        })
        .transpose()
    }

    async fn set(&self, collection: &str, id: &str, mut fields: Fields, mode: WriteMode) -> CmsResult<()> {
        resolve_sentinels(&mut fields, &now_timestamp());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(persistence("Failed to begin write"))?;

        let body = match mode {
            WriteMode::Replace => fields,
            WriteMode::Merge => {
                let existing: Option<String> = sqlx::query_scalar(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                )
                .bind(collection)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(persistence("Failed to read document for merge"))?;

                match existing {
                    Some(body) => {
                        let mut merged = Self::decode(&body)?;
                        merge_fields(&mut merged, fields);
                        merged
                    }
                    None => fields,
                }
            }
        };

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Self::encode(&body)?)
        .execute(&mut *tx)
        .await
        .map_err(persistence("Failed to write document"))?;

        tx.commit().await.map_err(persistence("Failed to commit write"))?;

        Ok(())
    }

    async fn add(&self, collection: &str, mut fields: Fields) -> CmsResult<String> {
        resolve_sentinels(&mut fields, &now_timestamp());
        let id = uuid::Uuid::new_v4().simple().to_string();

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)")
            .bind(collection)
            .bind(&id)
            .bind(Self::encode(&fields)?)
            .execute(&self.pool)
            .await
            .map_err(persistence("Failed to insert document"))?;

        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, mut fields: Fields) -> CmsResult<()> {
        resolve_sentinels(&mut fields, &now_timestamp());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(persistence("Failed to begin update"))?;

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(persistence("Failed to read document for update"))?;

        let mut body = match existing {
            Some(body) => Self::decode(&body)?,
            None => {
                return Err(CmsError::NotFound(format!(
                    "Document {}/{} not found",
                    collection, id
                )))
            }
        };

        for (key, value) in fields {
            body.insert(key, value);
        }

        sqlx::query("UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3")
            .bind(Self::encode(&body)?)
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(persistence("Failed to update document"))?;

        tx.commit().await.map_err(persistence("Failed to commit update"))?;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> CmsResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(persistence("Failed to delete document"))?;

        Ok(())
    }

    async fn list(&self, collection: &str, order_by: Option<&OrderBy>) -> CmsResult<Vec<Document>> {
        let rows = match order_by {
            Some(order) => {
                let direction = match order.direction {
                    Direction::Ascending => "ASC",
                    Direction::Descending => "DESC",
                };
                let sql = format!(
                    "SELECT id, body FROM documents
                     WHERE collection = ?1 AND json_extract(body, ?2) IS NOT NULL
                     ORDER BY json_extract(body, ?2) {}, id ASC",
                    direction
                );
                sqlx::query(&sql)
                    .bind(collection)
                    .bind(Self::json_path(&order.field))
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id ASC")
                    .bind(collection)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(persistence("Failed to list documents"))?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(persistence("Malformed document row"))?;
            let body: String = row.try_get("body").map_err(persistence("Malformed document row"))?;
            docs.push(Document {
                id,
                fields: Self::decode(&body)?,
            });
        }

        Ok(docs)
    }
}
