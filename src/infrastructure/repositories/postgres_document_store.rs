use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgListener;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::repositories::{
    Collection, Document, DocumentChange, DocumentStore, StoreError, StoreResult, StoredDocument,
    Subscription, WriteOp,
};

/// `LISTEN`/`NOTIFY` channel carrying document change notices
pub const CHANGE_CHANNEL: &str = "roster_document_changes";

/// Payload of a change notification. The document itself is re-read by the
/// listener, which keeps payloads far below the NOTIFY size limit.
#[derive(Debug, Serialize, Deserialize)]
struct ChangeNotice {
    collection: Collection,
    id: Uuid,
}

type DocumentRow = (Uuid, i64, Json<Document>);

/// PostgreSQL implementation of DocumentStore
///
/// Both collections share one `documents` table holding JSONB bodies. Every
/// write runs in a transaction that also issues `pg_notify`, so the
/// notification is delivered only if the write commits. A background
/// listener turns notifications into `DocumentChange`s for subscribers,
/// including changes made by other processes.
pub struct PostgresDocumentStore {
    pool: PgPool,
    changes: broadcast::Sender<DocumentChange>,
    feed: JoinHandle<()>,
}

impl PostgresDocumentStore {
    /// Runs migrations and starts the change feed
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    /// * `change_buffer` - Changes buffered per subscriber before it lags
    pub async fn connect(pool: PgPool, change_buffer: usize) -> StoreResult<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to run migrations: {}", e)))?;

        let mut listener = PgListener::connect_with(&pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to open change listener: {}", e)))?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to listen for changes: {}", e)))?;

        let (changes, _) = broadcast::channel(change_buffer.max(1));
        let feed = tokio::spawn(run_change_feed(pool.clone(), listener, changes.clone()));

        tracing::info!(channel = CHANGE_CHANNEL, "Postgres change feed started");

        Ok(Self {
            pool,
            changes,
            feed,
        })
    }

    async fn commit(&self, ops: &[WriteOp]) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to begin transaction: {}", e)))?;

        for op in ops {
            apply_op(&mut tx, op).await?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to commit transaction: {}", e)))
    }
}

impl Drop for PostgresDocumentStore {
    fn drop(&mut self) {
        self.feed.abort();
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn create(&self, collection: Collection, data: Document) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&data))
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to create document: {}", e)))?;

        notify(&mut tx, collection, id).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to commit transaction: {}", e)))?;

        Ok(id)
    }

    async fn update(&self, collection: Collection, id: Uuid, fields: Document) -> StoreResult<()> {
        self.commit(&[WriteOp::Update {
            collection,
            id,
            fields,
        }])
        .await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        self.commit(&[WriteOp::Delete { collection, id }]).await
    }

    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Option<StoredDocument>> {
        fetch_document(&self.pool, collection, id).await
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<StoredDocument>> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, revision, data
            FROM documents
            WHERE collection = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to list {}: {}", collection, e)))?;

        Ok(rows.into_iter().map(into_stored).collect())
    }

    async fn batched_write(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        self.commit(&ops).await
    }

    fn subscribe(&self, collection: Collection) -> Subscription {
        Subscription::new(collection, self.changes.subscribe())
    }
}

async fn apply_op(conn: &mut PgConnection, op: &WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Set {
            collection,
            id,
            data,
        } => {
            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, data)
                VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE SET
                    data = EXCLUDED.data,
                    revision = nextval('document_revisions'),
                    updated_at = NOW()
                "#,
            )
            .bind(collection.as_str())
            .bind(*id)
            .bind(Json(data))
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to save document: {}", e)))?;
        }
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            let result = sqlx::query(
                r#"
                UPDATE documents
                SET data = data || $3,
                    revision = nextval('document_revisions'),
                    updated_at = NOW()
                WHERE collection = $1 AND id = $2
                "#,
            )
            .bind(collection.as_str())
            .bind(*id)
            .bind(Json(fields))
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to update document: {}", e)))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound {
                    collection: *collection,
                    id: *id,
                });
            }
        }
        WriteOp::Delete { collection, id } => {
            let result = sqlx::query(
                r#"
                DELETE FROM documents WHERE collection = $1 AND id = $2
                "#,
            )
            .bind(collection.as_str())
            .bind(*id)
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to delete document: {}", e)))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound {
                    collection: *collection,
                    id: *id,
                });
            }
        }
    }

    notify(conn, op.collection(), op.id()).await
}

async fn notify(conn: &mut PgConnection, collection: Collection, id: Uuid) -> StoreResult<()> {
    let payload = serde_json::to_string(&ChangeNotice { collection, id })
        .map_err(|e| StoreError::Backend(format!("Failed to encode change notice: {}", e)))?;

    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(CHANGE_CHANNEL)
        .bind(payload)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to publish change: {}", e)))?;

    Ok(())
}

async fn fetch_document(
    pool: &PgPool,
    collection: Collection,
    id: Uuid,
) -> StoreResult<Option<StoredDocument>> {
    let row: Option<DocumentRow> = sqlx::query_as(
        r#"
        SELECT id, revision, data
        FROM documents
        WHERE collection = $1 AND id = $2
        "#,
    )
    .bind(collection.as_str())
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StoreError::Backend(format!("Failed to find document: {}", e)))?;

    Ok(row.map(into_stored))
}

fn into_stored((id, revision, Json(data)): DocumentRow) -> StoredDocument {
    StoredDocument {
        id,
        revision: u64::try_from(revision).unwrap_or_default(),
        data,
    }
}

async fn run_change_feed(
    pool: PgPool,
    mut listener: PgListener,
    changes: broadcast::Sender<DocumentChange>,
) {
    loop {
        match listener.try_recv().await {
            Ok(Some(notification)) => {
                let notice: ChangeNotice = match serde_json::from_str(notification.payload()) {
                    Ok(notice) => notice,
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring malformed change notice");
                        continue;
                    }
                };

                let change = match fetch_document(&pool, notice.collection, notice.id).await {
                    Ok(Some(document)) => DocumentChange::Upserted {
                        collection: notice.collection,
                        document,
                    },
                    Ok(None) => DocumentChange::Removed {
                        collection: notice.collection,
                        id: notice.id,
                    },
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            collection = %notice.collection,
                            id = %notice.id,
                            "Failed to read changed document"
                        );
                        DocumentChange::Resync {
                            collection: notice.collection,
                        }
                    }
                };

                let _ = changes.send(change);
            }
            Ok(None) => {
                // Connection dropped; notifications sent meanwhile are lost
                tracing::warn!("Change listener reconnecting, requesting resync");
                for collection in [Collection::Agents, Collection::Missions] {
                    let _ = changes.send(DocumentChange::Resync { collection });
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Change listener failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
