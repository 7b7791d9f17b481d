//! Read-only projections over a roster snapshot.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::snapshot::RosterSnapshot;
use crate::domain::agent::Agent;
use crate::domain::availability::AgentStatus;
use crate::domain::mission::{Mission, MissionStatus};

/// An agent together with its derived status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentView {
    pub agent: Agent,
    pub status: AgentStatus,
}

/// Headline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_agents: usize,
    pub available_agents: usize,
    pub occupied_agents: usize,
    pub active_missions: usize,
    pub completed_missions: usize,
}

/// A completed mission with its length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mission: Mission,
    pub duration_days: i64,
}

/// Order of history listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySort {
    /// Newest start date first
    #[default]
    Date,
    Title,
}

pub fn agent_view(snapshot: &RosterSnapshot, agent: &Agent) -> AgentView {
    AgentView {
        agent: agent.clone(),
        status: snapshot.agent_status(agent.id()),
    }
}

/// Agents matching `term` (all when blank) and `status`, sorted by last then
/// first name
pub fn agents(
    snapshot: &RosterSnapshot,
    term: Option<&str>,
    status: Option<AgentStatus>,
) -> Vec<AgentView> {
    let term = term.map(str::trim).filter(|t| !t.is_empty());

    let mut views: Vec<AgentView> = snapshot
        .agents()
        .filter(|agent| term.map_or(true, |t| agent.matches(t)))
        .map(|agent| agent_view(snapshot, agent))
        .filter(|view| status.map_or(true, |s| view.status == s))
        .collect();

    views.sort_by_cached_key(|view| (view.agent.sort_key(), view.agent.id()));
    views
}

/// Missions matching `term` (all when blank) and `status`, sorted by title
pub fn missions(
    snapshot: &RosterSnapshot,
    term: Option<&str>,
    status: Option<MissionStatus>,
) -> Vec<Mission> {
    let term = term.map(str::trim).filter(|t| !t.is_empty());

    let mut missions: Vec<Mission> = snapshot
        .missions()
        .filter(|mission| term.map_or(true, |t| mission.matches(t)))
        .filter(|mission| status.map_or(true, |s| mission.status() == s))
        .cloned()
        .collect();

    missions.sort_by(by_title);
    missions
}

/// Agents listed by a mission. Ids of agents no longer on file are skipped.
pub fn mission_agents(snapshot: &RosterSnapshot, mission: &Mission) -> Vec<AgentView> {
    let mut views: Vec<AgentView> = mission
        .agent_ids()
        .iter()
        .filter_map(|id| snapshot.agent(*id))
        .map(|agent| agent_view(snapshot, agent))
        .collect();

    views.sort_by_cached_key(|view| (view.agent.sort_key(), view.agent.id()));
    views
}

/// Completed missions, optionally only those listing `agent_id`
pub fn history(
    snapshot: &RosterSnapshot,
    agent_id: Option<Uuid>,
    sort: HistorySort,
) -> Vec<HistoryEntry> {
    let mut completed: Vec<&Mission> = snapshot
        .missions()
        .filter(|mission| mission.is_completed())
        .filter(|mission| agent_id.map_or(true, |id| mission.has_agent(id)))
        .collect();

    match sort {
        HistorySort::Date => completed.sort_by(|a, b| {
            b.start_date()
                .cmp(&a.start_date())
                .then_with(|| by_title(a, b))
        }),
        HistorySort::Title => completed.sort_by(|a, b| by_title(a, b)),
    }

    completed
        .into_iter()
        .map(|mission| HistoryEntry {
            mission: mission.clone(),
            duration_days: mission.duration_days(),
        })
        .collect()
}

pub fn dashboard(snapshot: &RosterSnapshot) -> DashboardStats {
    let mut stats = DashboardStats::default();

    for agent in snapshot.agents() {
        stats.total_agents += 1;
        match snapshot.agent_status(agent.id()) {
            AgentStatus::Available => stats.available_agents += 1,
            AgentStatus::Occupied => stats.occupied_agents += 1,
        }
    }

    for mission in snapshot.missions() {
        if mission.is_active() {
            stats.active_missions += 1;
        } else if mission.is_completed() {
            stats.completed_missions += 1;
        }
    }

    stats
}

fn by_title(a: &Mission, b: &Mission) -> Ordering {
    a.title()
        .to_lowercase()
        .cmp(&b.title().to_lowercase())
        .then_with(|| a.id().cmp(&b.id()))
}
