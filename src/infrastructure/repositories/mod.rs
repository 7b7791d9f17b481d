// Document store implementations (data access layer)
// Adapters that implement the domain DocumentStore port

pub mod memory_document_store;
pub mod postgres_document_store;

pub use memory_document_store::MemoryDocumentStore;
pub use postgres_document_store::PostgresDocumentStore;
