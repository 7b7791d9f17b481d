// Mission domain module
// Contains mission aggregate root, value objects, and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod mission;
pub mod value_objects;

// Re-export main types for convenience
pub use events::MissionEvent;
pub use mission::{Mission, MissionDraft, MissionPlan};
pub use value_objects::MissionStatus;
