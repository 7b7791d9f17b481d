use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::mission::MissionStatus;
use super::repositories::StoreError;

/// Input rejected before anything is written to the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("New end date {requested} is before current end date {current}")]
    EndDateRegression {
        current: NaiveDate,
        requested: NaiveDate,
    },

    #[error("Matricule already used by another agent: {0}")]
    DuplicateMatricule(String),

    #[error("A mission needs at least one agent")]
    NoAgentsAssigned,

    #[error("Cannot move mission from {from} to {to}")]
    InvalidTransition {
        from: MissionStatus,
        to: MissionStatus,
    },

    #[error("Mission is already completed")]
    MissionCompleted,
}

/// Kind of entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Agent,
    Mission,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Agent => write!(f, "Agent"),
            EntityKind::Mission => write!(f, "Mission"),
        }
    }
}

/// Errors surfaced by roster operations
#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("Agent {agent_id} is already assigned to active mission {mission_id}")]
    Conflict { agent_id: Uuid, mission_id: Uuid },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl RosterError {
    pub fn agent_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: EntityKind::Agent,
            id,
        }
    }

    pub fn mission_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: EntityKind::Mission,
            id,
        }
    }
}

pub type RosterResult<T> = Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let id = Uuid::new_v4();
        let err = RosterError::mission_not_found(id);
        assert_eq!(err.to_string(), format!("Mission not found: {}", id));
    }

    #[test]
    fn validation_error_is_transparent() {
        let err = RosterError::from(ValidationError::MissingField("title"));
        assert_eq!(err.to_string(), "Missing required field: title");
    }
}
