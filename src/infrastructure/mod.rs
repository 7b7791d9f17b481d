// Infrastructure layer module
// Contains document store adapters and the document codec
// Follows Hexagonal Architecture

pub mod documents;
pub mod repositories;
