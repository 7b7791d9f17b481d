use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A JSON document body. The id is the document key and is not stored inside.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The two collections the roster persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Agents,
    Missions,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Agents => "agents",
            Collection::Missions => "missions",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document as read back from the store
///
/// `revision` increases on every write to any document, so a larger revision
/// for the same id is always the newer state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub revision: u64,
    pub data: Document,
}

/// One operation of a batched write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert or overwrite a whole document under a known id
    Set {
        collection: Collection,
        id: Uuid,
        data: Document,
    },
    /// Merge top-level fields into an existing document
    Update {
        collection: Collection,
        id: Uuid,
        fields: Document,
    },
    /// Remove an existing document
    Delete { collection: Collection, id: Uuid },
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Set { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Delete { collection, .. } => *collection,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            WriteOp::Set { id, .. } | WriteOp::Update { id, .. } | WriteOp::Delete { id, .. } => {
                *id
            }
        }
    }
}

/// Change notification delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    /// A document was created or modified; carries its new state
    Upserted {
        collection: Collection,
        document: StoredDocument,
    },
    /// A document was deleted
    Removed { collection: Collection, id: Uuid },
    /// Changes may have been missed; reload the whole collection
    Resync { collection: Collection },
}

impl DocumentChange {
    pub fn collection(&self) -> Collection {
        match self {
            DocumentChange::Upserted { collection, .. }
            | DocumentChange::Removed { collection, .. }
            | DocumentChange::Resync { collection } => *collection,
        }
    }
}

/// Errors raised by document store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: Uuid },

    #[error("Invalid document {collection}/{id}: {reason}")]
    Decode {
        collection: Collection,
        id: Uuid,
        reason: String,
    },

    #[error("Failed to encode {collection} document: {reason}")]
    Encode {
        collection: Collection,
        reason: String,
    },

    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Live feed of changes for one collection
///
/// Dropping the subscription unsubscribes.
pub struct Subscription {
    collection: Collection,
    receiver: broadcast::Receiver<DocumentChange>,
}

impl Subscription {
    pub fn new(collection: Collection, receiver: broadcast::Receiver<DocumentChange>) -> Self {
        Self {
            collection,
            receiver,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Waits for the next change to this collection
    ///
    /// Returns `None` once the store is gone. A subscriber that fell behind
    /// gets a `Resync` instead of the changes it missed.
    pub async fn recv(&mut self) -> Option<DocumentChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.collection() == self.collection => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        collection = %self.collection,
                        missed,
                        "Subscriber lagged behind change feed"
                    );
                    return Some(DocumentChange::Resync {
                        collection: self.collection,
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Port for the external document database
///
/// Implementations must make `batched_write` all-or-nothing and publish a
/// change for every committed write to subscribers of the collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; the store assigns and returns its id
    async fn create(&self, collection: Collection, data: Document) -> StoreResult<Uuid>;

    /// Merge top-level fields into an existing document
    async fn update(&self, collection: Collection, id: Uuid, fields: Document) -> StoreResult<()>;

    /// Delete an existing document
    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<()>;

    /// Read one document
    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Option<StoredDocument>>;

    /// Read every document of a collection
    async fn list(&self, collection: Collection) -> StoreResult<Vec<StoredDocument>>;

    /// Apply several operations atomically
    async fn batched_write(&self, ops: Vec<WriteOp>) -> StoreResult<()>;

    /// Subscribe to changes of a collection
    fn subscribe(&self, collection: Collection) -> Subscription;
}
