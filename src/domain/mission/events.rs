use chrono::NaiveDate;
use uuid::Uuid;

/// Domain events that occur within the Mission aggregate
///
/// These events represent the moments of a mission's lifecycle. The roster
/// engine logs them once the matching write has been committed.
///
/// # Example
/// ```
/// use roster_api::domain::mission::events::MissionEvent;
/// use uuid::Uuid;
///
/// let event = MissionEvent::Completed {
///     mission_id: Uuid::new_v4(),
/// };
/// assert_eq!(event.name(), "completed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionEvent {
    /// Fired when a mission is created
    Planned {
        mission_id: Uuid,
        /// Agents assigned at creation
        agent_ids: Vec<Uuid>,
    },
    /// Fired when a mission moves from planned to in-progress
    Started { mission_id: Uuid },
    /// Fired when a mission completes
    Completed { mission_id: Uuid },
    /// Fired when the end date is pushed back
    Extended {
        mission_id: Uuid,
        previous_end: NaiveDate,
        new_end: NaiveDate,
    },
    /// Fired when an agent is removed from the mission
    AgentReleased { mission_id: Uuid, agent_id: Uuid },
}

impl MissionEvent {
    /// Returns the mission_id for this event
    pub fn mission_id(&self) -> Uuid {
        match self {
            MissionEvent::Planned { mission_id, .. } => *mission_id,
            MissionEvent::Started { mission_id } => *mission_id,
            MissionEvent::Completed { mission_id } => *mission_id,
            MissionEvent::Extended { mission_id, .. } => *mission_id,
            MissionEvent::AgentReleased { mission_id, .. } => *mission_id,
        }
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            MissionEvent::Planned { .. } => "planned",
            MissionEvent::Started { .. } => "started",
            MissionEvent::Completed { .. } => "completed",
            MissionEvent::Extended { .. } => "extended",
            MissionEvent::AgentReleased { .. } => "agent_released",
        }
    }
}
