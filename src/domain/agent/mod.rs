// Agent domain module
// Contains agent aggregate root and value objects

#![allow(clippy::module_inception)]

pub mod agent;
pub mod value_objects;

pub use agent::{Agent, AgentDraft, AgentProfile};
pub use value_objects::Matricule;
