use serde::{Deserialize, Serialize};

/// Lifecycle status of a mission
///
/// # Status Transitions
/// ```text
/// Planned -> InProgress -> Completed
///    └--------------------->┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissionStatus {
    /// Mission is scheduled but has not started
    Planned,
    /// Mission is underway
    InProgress,
    /// Mission is finished (terminal)
    Completed,
}

impl MissionStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Valid Transitions
    /// - Planned -> InProgress
    /// - Planned -> Completed
    /// - InProgress -> Completed
    ///
    /// # Example
    /// ```
    /// use roster_api::domain::mission::MissionStatus;
    ///
    /// assert!(MissionStatus::Planned.can_transition_to(MissionStatus::InProgress));
    /// assert!(!MissionStatus::Completed.can_transition_to(MissionStatus::Planned));
    /// ```
    pub fn can_transition_to(&self, next: MissionStatus) -> bool {
        use MissionStatus::*;
        matches!(
            (self, next),
            (Planned, InProgress) | (Planned, Completed) | (InProgress, Completed)
        )
    }

    /// Active missions keep their agents occupied
    pub fn is_active(&self) -> bool {
        matches!(self, MissionStatus::Planned | MissionStatus::InProgress)
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionStatus::Planned => write!(f, "planned"),
            MissionStatus::InProgress => write!(f, "in-progress"),
            MissionStatus::Completed => write!(f, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transition_planned_to_in_progress() {
        assert!(MissionStatus::Planned.can_transition_to(MissionStatus::InProgress));
    }

    #[test]
    fn valid_transition_planned_to_completed() {
        assert!(MissionStatus::Planned.can_transition_to(MissionStatus::Completed));
    }

    #[test]
    fn valid_transition_in_progress_to_completed() {
        assert!(MissionStatus::InProgress.can_transition_to(MissionStatus::Completed));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(!MissionStatus::Completed.can_transition_to(MissionStatus::Planned));
        assert!(!MissionStatus::Completed.can_transition_to(MissionStatus::InProgress));
        assert!(!MissionStatus::Completed.can_transition_to(MissionStatus::Completed));
    }

    #[test]
    fn invalid_transition_in_progress_to_planned() {
        assert!(!MissionStatus::InProgress.can_transition_to(MissionStatus::Planned));
    }

    #[test]
    fn active_statuses() {
        assert!(MissionStatus::Planned.is_active());
        assert!(MissionStatus::InProgress.is_active());
        assert!(!MissionStatus::Completed.is_active());
    }

    #[test]
    fn status_display_matches_wire_format() {
        assert_eq!(MissionStatus::Planned.to_string(), "planned");
        assert_eq!(MissionStatus::InProgress.to_string(), "in-progress");
        assert_eq!(MissionStatus::Completed.to_string(), "completed");

        let json = serde_json::to_string(&MissionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }
}
