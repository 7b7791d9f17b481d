// Repository ports (interfaces implemented by infrastructure adapters)

pub mod document_store;

pub use document_store::{
    Collection, Document, DocumentChange, DocumentStore, StoreError, StoreResult,
    StoredDocument, Subscription, WriteOp,
};
