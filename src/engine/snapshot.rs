//! In-process view of both collections, kept current from store changes.
//!
//! Ordering is last-write-wins per document, decided by store revision.
//! Deleted ids are remembered until the next full listing of their
//! collection; ids are never reused, so any upsert for one in between is
//! stale.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use uuid::Uuid;

use crate::domain::agent::Agent;
use crate::domain::availability::{AgentStatus, AvailabilityIndex};
use crate::domain::mission::Mission;
use crate::domain::repositories::{
    Collection, DocumentChange, StoreError, StoreResult, StoredDocument,
};
use crate::infrastructure::documents::{decode_agent, decode_mission, raw_mission_agent_ids};

#[derive(Debug, Clone)]
struct Revisioned<T> {
    revision: u64,
    value: T,
}

/// Outcome of applying one change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// Stale or duplicate change, snapshot untouched
    Ignored,
}

#[derive(Debug, Default)]
pub struct RosterSnapshot {
    agents: BTreeMap<Uuid, Revisioned<Agent>>,
    missions: BTreeMap<Uuid, Revisioned<Mission>>,
    /// Mission documents that fail to decode, with their agent ids when
    /// those can still be read. They keep holding those agents.
    unreadable: BTreeMap<Uuid, Revisioned<Option<BTreeSet<Uuid>>>>,
    /// Ids removed since the last full listing of their collection
    removed: HashSet<(Collection, Uuid)>,
    availability: AvailabilityIndex,
}

impl RosterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a change notification
    ///
    /// `Resync` cannot be applied from the notification alone; the caller
    /// reloads the collection and calls [`RosterSnapshot::replace`].
    pub fn apply(&mut self, change: &DocumentChange) -> StoreResult<Applied> {
        match change {
            DocumentChange::Upserted {
                collection,
                document,
            } => self.upsert(*collection, document),
            DocumentChange::Removed { collection, id } => Ok(self.remove(*collection, *id)),
            DocumentChange::Resync { .. } => Ok(Applied::Ignored),
        }
    }

    /// Stores a newer document state
    ///
    /// A mission that fails to decode is still recorded as unreadable before
    /// the error is returned.
    pub fn upsert(&mut self, collection: Collection, document: &StoredDocument) -> StoreResult<Applied> {
        let result = self.put(collection, document);
        if collection == Collection::Missions && !matches!(result, Ok(Applied::Ignored)) {
            self.rebuild_availability();
        }
        result
    }

    /// Deletes a document and remembers the id so stale upserts stay out
    pub fn remove(&mut self, collection: Collection, id: Uuid) -> Applied {
        let existed = self.forget(collection, id);
        if existed && collection == Collection::Missions {
            self.rebuild_availability();
        }
        let first_removal = self.removed.insert((collection, id));

        if existed || first_removal {
            Applied::Changed
        } else {
            Applied::Ignored
        }
    }

    /// Replaces a whole collection with a fresh listing
    ///
    /// Ids missing from the listing are dropped without a tombstone, and
    /// tombstones for ids the store no longer lists are released. Documents
    /// that fail to decode are returned with their errors so the caller can
    /// report them.
    pub fn replace(
        &mut self,
        collection: Collection,
        documents: &[StoredDocument],
    ) -> Vec<StoreError> {
        let listed: HashSet<Uuid> = documents.iter().map(|d| d.id).collect();
        let known: Vec<Uuid> = match collection {
            Collection::Agents => self.agents.keys().copied().collect(),
            Collection::Missions => self
                .missions
                .keys()
                .chain(self.unreadable.keys())
                .copied()
                .collect(),
        };
        for id in known.into_iter().filter(|id| !listed.contains(id)) {
            self.forget(collection, id);
        }
        self.removed
            .retain(|(c, id)| *c != collection || listed.contains(id));

        let mut failures = Vec::new();
        for document in documents {
            if let Err(e) = self.put(collection, document) {
                failures.push(e);
            }
        }
        if collection == Collection::Missions {
            self.rebuild_availability();
        }
        failures
    }

    /// Records an agent the caller just wrote but could not read back
    ///
    /// The known revision is kept, so the next change from the store wins.
    pub fn assume_agent(&mut self, agent: Agent) {
        let id = agent.id();
        if self.removed.contains(&(Collection::Agents, id)) {
            return;
        }
        let revision = self.agents.get(&id).map_or(0, |a| a.revision);
        self.agents.insert(id, Revisioned {
            revision,
            value: agent,
        });
    }

    /// Records a mission the caller just wrote but could not read back
    pub fn assume_mission(&mut self, mission: Mission) {
        let id = mission.id();
        if self.removed.contains(&(Collection::Missions, id)) {
            return;
        }
        let revision = self.mission_revision(id).unwrap_or(0);
        self.unreadable.remove(&id);
        self.missions.insert(id, Revisioned {
            revision,
            value: mission,
        });
        self.rebuild_availability();
    }

    fn put(&mut self, collection: Collection, document: &StoredDocument) -> StoreResult<Applied> {
        let id = document.id;
        if self.removed.contains(&(collection, id)) {
            return Ok(Applied::Ignored);
        }

        match collection {
            Collection::Agents => {
                if is_stale(self.agents.get(&id).map(|a| a.revision), document.revision) {
                    return Ok(Applied::Ignored);
                }
                let agent = decode_agent(document)?;
                self.agents.insert(id, Revisioned {
                    revision: document.revision,
                    value: agent,
                });
            }
            Collection::Missions => {
                if is_stale(self.mission_revision(id), document.revision) {
                    return Ok(Applied::Ignored);
                }
                match decode_mission(document) {
                    Ok(mission) => {
                        self.unreadable.remove(&id);
                        self.missions.insert(id, Revisioned {
                            revision: document.revision,
                            value: mission,
                        });
                    }
                    Err(e) => {
                        self.missions.remove(&id);
                        self.unreadable.insert(id, Revisioned {
                            revision: document.revision,
                            value: raw_mission_agent_ids(document),
                        });
                        return Err(e);
                    }
                }
            }
        }
        Ok(Applied::Changed)
    }

    /// Drops a document without leaving a tombstone
    fn forget(&mut self, collection: Collection, id: Uuid) -> bool {
        match collection {
            Collection::Agents => self.agents.remove(&id).is_some(),
            Collection::Missions => {
                let decoded = self.missions.remove(&id).is_some();
                let unreadable = self.unreadable.remove(&id).is_some();
                decoded || unreadable
            }
        }
    }

    fn mission_revision(&self, id: Uuid) -> Option<u64> {
        self.missions
            .get(&id)
            .map(|m| m.revision)
            .or_else(|| self.unreadable.get(&id).map(|m| m.revision))
    }

    fn rebuild_availability(&mut self) {
        let mut index = AvailabilityIndex::build(self.missions.values().map(|m| &m.value));
        for (mission_id, held) in &self.unreadable {
            for agent_id in held.value.iter().flatten() {
                index.hold(*agent_id, *mission_id);
            }
        }
        self.availability = index;
    }

    // ===== Reads =====

    pub fn agent(&self, id: Uuid) -> Option<&Agent> {
        self.agents.get(&id).map(|a| &a.value)
    }

    pub fn mission(&self, id: Uuid) -> Option<&Mission> {
        self.missions.get(&id).map(|m| &m.value)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values().map(|a| &a.value)
    }

    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.values().map(|m| &m.value)
    }

    pub fn agent_status(&self, agent_id: Uuid) -> AgentStatus {
        self.availability.status(agent_id)
    }

    /// First mission keeping an agent from a new assignment
    ///
    /// An unreadable mission whose agent ids are unknown blocks every agent.
    pub fn blocking_mission(&self, agent_id: Uuid) -> Option<Uuid> {
        self.availability
            .active_missions(agent_id)
            .next()
            .or_else(|| {
                self.unreadable
                    .iter()
                    .find(|(_, held)| held.value.is_none())
                    .map(|(id, _)| *id)
            })
    }

    /// Another agent already holding `matricule`, if any
    pub fn matricule_owner(&self, matricule: &str, except: Option<Uuid>) -> Option<Uuid> {
        self.agents()
            .find(|a| a.profile().matricule().as_str() == matricule && Some(a.id()) != except)
            .map(Agent::id)
    }
}

fn is_stale(current: Option<u64>, revision: u64) -> bool {
    current.is_some_and(|c| c >= revision)
}
