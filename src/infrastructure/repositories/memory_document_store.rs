use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::repositories::{
    Collection, Document, DocumentChange, DocumentStore, StoreError, StoreResult, StoredDocument,
    Subscription, WriteOp,
};

pub const DEFAULT_CHANGE_BUFFER: usize = 256;

#[derive(Debug, Clone, Default)]
struct Contents {
    collections: HashMap<Collection, BTreeMap<Uuid, StoredDocument>>,
    revision: u64,
}

impl Contents {
    fn documents(&self, collection: Collection) -> Option<&BTreeMap<Uuid, StoredDocument>> {
        self.collections.get(&collection)
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Applies one operation and returns the change it produced
    fn apply(&mut self, op: WriteOp) -> StoreResult<DocumentChange> {
        let revision = self.next_revision();
        match op {
            WriteOp::Set {
                collection,
                id,
                data,
            } => {
                let document = StoredDocument { id, revision, data };
                self.collections
                    .entry(collection)
                    .or_default()
                    .insert(id, document.clone());
                Ok(DocumentChange::Upserted {
                    collection,
                    document,
                })
            }
            WriteOp::Update {
                collection,
                id,
                fields,
            } => {
                let document = self
                    .collections
                    .get_mut(&collection)
                    .and_then(|docs| docs.get_mut(&id))
                    .ok_or(StoreError::NotFound { collection, id })?;
                document.data.extend(fields);
                document.revision = revision;
                Ok(DocumentChange::Upserted {
                    collection,
                    document: document.clone(),
                })
            }
            WriteOp::Delete { collection, id } => {
                self.collections
                    .get_mut(&collection)
                    .and_then(|docs| docs.remove(&id))
                    .ok_or(StoreError::NotFound { collection, id })?;
                Ok(DocumentChange::Removed { collection, id })
            }
        }
    }
}

/// In-process document store
///
/// Backs tests and the `memory` store backend. Batches are applied to a
/// staged copy that only replaces the live contents when every operation
/// succeeded.
pub struct MemoryDocumentStore {
    contents: RwLock<Contents>,
    changes: broadcast::Sender<DocumentChange>,
    fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_change_buffer(DEFAULT_CHANGE_BUFFER)
    }

    /// Creates a store whose change feed holds `capacity` undelivered changes
    /// per subscriber before it lags
    pub fn with_change_buffer(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self {
            contents: RwLock::new(Contents::default()),
            changes,
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every following write fail with a backend error until reset
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "Memory store is rejecting writes".to_string(),
            ));
        }
        Ok(())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        self.check_writable()?;

        let mut contents = self.contents.write().await;
        let mut staged = contents.clone();
        let mut changes = Vec::with_capacity(ops.len());
        for op in ops {
            changes.push(staged.apply(op)?);
        }
        *contents = staged;
        drop(contents);

        for change in changes {
            // No subscribers is fine
            let _ = self.changes.send(change);
        }
        Ok(())
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: Collection, data: Document) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.commit(vec![WriteOp::Set {
            collection,
            id,
            data,
        }])
        .await?;
        tracing::debug!(%collection, %id, "Document created");
        Ok(id)
    }

    async fn update(&self, collection: Collection, id: Uuid, fields: Document) -> StoreResult<()> {
        self.commit(vec![WriteOp::Update {
            collection,
            id,
            fields,
        }])
        .await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        self.commit(vec![WriteOp::Delete { collection, id }]).await
    }

    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Option<StoredDocument>> {
        let contents = self.contents.read().await;
        Ok(contents
            .documents(collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<StoredDocument>> {
        let contents = self.contents.read().await;
        Ok(contents
            .documents(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn batched_write(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        let count = ops.len();
        self.commit(ops).await?;
        tracing::debug!(operations = count, "Batch committed");
        Ok(())
    }

    fn subscribe(&self, collection: Collection) -> Subscription {
        Subscription::new(collection, self.changes.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_revision() {
        let store = MemoryDocumentStore::new();

        let id = store
            .create(Collection::Agents, doc(json!({ "firstName": "Jean" })))
            .await
            .unwrap();

        let stored = store.get(Collection::Agents, id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.data["firstName"], json!("Jean"));
    }

    #[tokio::test]
    async fn update_merges_fields_and_bumps_revision() {
        let store = MemoryDocumentStore::new();
        let id = store
            .create(Collection::Missions, doc(json!({ "title": "A", "status": "planned" })))
            .await
            .unwrap();

        store
            .update(Collection::Missions, id, doc(json!({ "status": "completed" })))
            .await
            .unwrap();

        let stored = store.get(Collection::Missions, id).await.unwrap().unwrap();
        assert_eq!(stored.data["title"], json!("A"));
        assert_eq!(stored.data["status"], json!("completed"));
        assert_eq!(stored.revision, 2);
    }

    #[tokio::test]
    async fn update_missing_document_fails() {
        let store = MemoryDocumentStore::new();

        let result = store
            .update(Collection::Agents, Uuid::new_v4(), Document::new())
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = MemoryDocumentStore::new();
        let id = store.create(Collection::Agents, Document::new()).await.unwrap();

        store.delete(Collection::Agents, id).await.unwrap();

        assert!(store.get(Collection::Agents, id).await.unwrap().is_none());
        assert!(store.delete(Collection::Agents, id).await.is_err());
    }

    #[tokio::test]
    async fn failed_batch_changes_nothing() {
        let store = MemoryDocumentStore::new();
        let id = store
            .create(Collection::Missions, doc(json!({ "agentIds": ["a"] })))
            .await
            .unwrap();

        let result = store
            .batched_write(vec![
                WriteOp::Update {
                    collection: Collection::Missions,
                    id,
                    fields: doc(json!({ "agentIds": [] })),
                },
                WriteOp::Delete {
                    collection: Collection::Agents,
                    id: Uuid::new_v4(),
                },
            ])
            .await;

        assert!(result.is_err());
        let stored = store.get(Collection::Missions, id).await.unwrap().unwrap();
        assert_eq!(stored.data["agentIds"], json!(["a"]));
        assert_eq!(stored.revision, 1);
    }

    #[tokio::test]
    async fn injected_failure_rejects_writes() {
        let store = MemoryDocumentStore::new();
        store.fail_writes(true);

        assert!(matches!(
            store.create(Collection::Agents, Document::new()).await,
            Err(StoreError::Backend(_))
        ));
        assert!(store.list(Collection::Agents).await.unwrap().is_empty());

        store.fail_writes(false);
        assert!(store.create(Collection::Agents, Document::new()).await.is_ok());
    }

    #[tokio::test]
    async fn subscribers_see_committed_changes() {
        let store = MemoryDocumentStore::new();
        let mut agents = store.subscribe(Collection::Agents);

        let id = store.create(Collection::Agents, Document::new()).await.unwrap();
        store.delete(Collection::Agents, id).await.unwrap();

        match agents.recv().await {
            Some(DocumentChange::Upserted { document, .. }) => assert_eq!(document.id, id),
            other => panic!("Expected Upserted change, got {:?}", other),
        }
        assert_eq!(
            agents.recv().await,
            Some(DocumentChange::Removed {
                collection: Collection::Agents,
                id
            })
        );
    }
}
