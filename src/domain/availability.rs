//! Agent availability, derived from mission membership.
//!
//! An agent is occupied iff at least one active (planned or in-progress)
//! mission lists it. Nothing here is persisted: the index is rebuilt from the
//! mission set whenever that set changes.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mission::Mission;

/// Derived availability of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Available,
    Occupied,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Available => write!(f, "available"),
            AgentStatus::Occupied => write!(f, "occupied"),
        }
    }
}

/// Computes an agent's status by scanning missions
///
/// # Example
/// ```
/// use roster_api::domain::availability::{agent_status, AgentStatus};
/// use roster_api::domain::mission::Mission;
/// use uuid::Uuid;
///
/// let missions: Vec<Mission> = Vec::new();
/// assert_eq!(agent_status(Uuid::new_v4(), &missions), AgentStatus::Available);
/// ```
pub fn agent_status<'a>(
    agent_id: Uuid,
    missions: impl IntoIterator<Item = &'a Mission>,
) -> AgentStatus {
    let occupied = missions
        .into_iter()
        .any(|mission| mission.is_active() && mission.has_agent(agent_id));

    if occupied {
        AgentStatus::Occupied
    } else {
        AgentStatus::Available
    }
}

/// Inverted index: agent id -> ids of the active missions listing it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityIndex {
    active: HashMap<Uuid, BTreeSet<Uuid>>,
}

impl AvailabilityIndex {
    /// Builds the index from a full mission set
    pub fn build<'a>(missions: impl IntoIterator<Item = &'a Mission>) -> Self {
        let mut active: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for mission in missions.into_iter().filter(|m| m.is_active()) {
            for agent_id in mission.agent_ids() {
                active.entry(*agent_id).or_default().insert(mission.id());
            }
        }
        Self { active }
    }

    /// Marks an agent as held by a mission known only by id
    pub fn hold(&mut self, agent_id: Uuid, mission_id: Uuid) {
        self.active.entry(agent_id).or_default().insert(mission_id);
    }

    /// Same answer as [`agent_status`] over the missions the index was built from
    pub fn status(&self, agent_id: Uuid) -> AgentStatus {
        if self.active.contains_key(&agent_id) {
            AgentStatus::Occupied
        } else {
            AgentStatus::Available
        }
    }

    /// Active missions listing the agent, in id order
    pub fn active_missions(&self, agent_id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.active
            .get(&agent_id)
            .into_iter()
            .flat_map(|missions| missions.iter().copied())
    }

    /// Number of distinct agents on at least one active mission
    pub fn occupied_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mission::MissionStatus;
    use chrono::NaiveDate;

    fn mission(agents: &[Uuid], status: MissionStatus) -> Mission {
        Mission::from_persistence(
            Uuid::new_v4(),
            "Mission".to_string(),
            String::new(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            agents.iter().copied().collect(),
            status,
        )
    }

    #[test]
    fn agent_without_missions_is_available() {
        let missions: Vec<Mission> = vec![];
        assert_eq!(agent_status(Uuid::new_v4(), &missions), AgentStatus::Available);
    }

    #[test]
    fn agent_on_planned_mission_is_occupied() {
        let agent = Uuid::new_v4();
        let missions = vec![mission(&[agent], MissionStatus::Planned)];

        assert_eq!(agent_status(agent, &missions), AgentStatus::Occupied);
    }

    #[test]
    fn agent_on_in_progress_mission_is_occupied() {
        let agent = Uuid::new_v4();
        let missions = vec![mission(&[agent], MissionStatus::InProgress)];

        assert_eq!(agent_status(agent, &missions), AgentStatus::Occupied);
    }

    #[test]
    fn agent_on_completed_mission_only_is_available() {
        let agent = Uuid::new_v4();
        let missions = vec![mission(&[agent], MissionStatus::Completed)];

        assert_eq!(agent_status(agent, &missions), AgentStatus::Available);
    }

    #[test]
    fn index_tracks_every_active_mission() {
        let agent = Uuid::new_v4();
        let first = mission(&[agent], MissionStatus::Planned);
        let second = mission(&[agent], MissionStatus::InProgress);
        let done = mission(&[agent], MissionStatus::Completed);

        let index = AvailabilityIndex::build([&first, &second, &done]);

        let mut expected = vec![first.id(), second.id()];
        expected.sort();
        assert_eq!(index.active_missions(agent).collect::<Vec<_>>(), expected);
        assert_eq!(index.status(agent), AgentStatus::Occupied);
        assert_eq!(index.occupied_count(), 1);
    }

    #[test]
    fn index_agrees_with_scan() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let missions = vec![
            mission(&[a, b], MissionStatus::Completed),
            mission(&[b], MissionStatus::Planned),
        ];
        let index = AvailabilityIndex::build(&missions);

        for agent in [a, b, c] {
            assert_eq!(index.status(agent), agent_status(agent, &missions));
        }
    }

    #[test]
    fn held_agent_is_occupied() {
        let agent = Uuid::new_v4();
        let held_by = Uuid::new_v4();
        let mut index = AvailabilityIndex::build(&Vec::<Mission>::new());

        index.hold(agent, held_by);

        assert_eq!(index.status(agent), AgentStatus::Occupied);
        assert_eq!(index.active_missions(agent).collect::<Vec<_>>(), vec![held_by]);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AgentStatus::Occupied).unwrap(),
            "\"occupied\""
        );
        assert_eq!(AgentStatus::Available.to_string(), "available");
    }
}
