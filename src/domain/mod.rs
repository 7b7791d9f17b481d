// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod agent;
pub mod availability;
pub mod errors;
pub mod mission;
pub mod repositories;

pub use errors::{EntityKind, RosterError, RosterResult, ValidationError};
