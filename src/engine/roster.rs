use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use uuid::Uuid;

use super::reports::{self, AgentView, DashboardStats, HistoryEntry, HistorySort};
use super::snapshot::{Applied, RosterSnapshot};
use crate::domain::agent::value_objects::placeholder_photo_url;
use crate::domain::agent::{Agent, AgentDraft, AgentProfile};
use crate::domain::availability::AgentStatus;
use crate::domain::errors::{EntityKind, RosterError, RosterResult, ValidationError};
use crate::domain::mission::{Mission, MissionDraft, MissionEvent, MissionPlan, MissionStatus};
use crate::domain::repositories::{
    Collection, DocumentChange, DocumentStore, StoreError, StoreResult, WriteOp,
};
use crate::infrastructure::documents::{
    agent_profile_fields, decode_mission, mission_agent_fields, mission_end_date_fields,
    mission_status_fields, new_agent_document, new_mission_document,
};

/// Roster engine
///
/// Owns the live snapshot of agents and missions and every business rule
/// that guards writes to the document store. Mutations are serialised
/// through one writer lock; reads go to the snapshot.
pub struct Roster {
    store: Arc<dyn DocumentStore>,
    snapshot: RwLock<RosterSnapshot>,
    writer: Mutex<()>,
}

impl Roster {
    /// Builds a roster from the current store contents
    pub async fn load(store: Arc<dyn DocumentStore>) -> RosterResult<Self> {
        let roster = Self {
            store,
            snapshot: RwLock::new(RosterSnapshot::new()),
            writer: Mutex::new(()),
        };
        roster.reload().await?;
        Ok(roster)
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Re-reads both collections from the store
    pub async fn reload(&self) -> RosterResult<()> {
        self.reload_collection(Collection::Agents).await?;
        self.reload_collection(Collection::Missions).await
    }

    /// Re-reads one collection
    ///
    /// Holds the writer lock so no mutation commits between the listing and
    /// the snapshot swap.
    pub async fn reload_collection(&self, collection: Collection) -> RosterResult<()> {
        let _guard = self.writer.lock().await;
        let documents = self.store.list(collection).await?;
        let failures = self.snapshot.write().await.replace(collection, &documents);
        for error in &failures {
            tracing::warn!(error = %error, %collection, "Skipping unreadable document");
        }
        tracing::debug!(%collection, documents = documents.len(), "Collection loaded");
        Ok(())
    }

    /// Applies one change notification from the store
    pub async fn apply_change(&self, change: &DocumentChange) -> RosterResult<()> {
        if let DocumentChange::Resync { collection } = change {
            tracing::info!(%collection, "Resynchronising collection");
            return self.reload_collection(*collection).await;
        }

        let applied = self.snapshot.write().await.apply(change)?;
        if applied == Applied::Changed {
            tracing::trace!(collection = %change.collection(), "Change applied");
        }
        Ok(())
    }

    // ===== Agent mutations =====

    /// Registers a new agent
    ///
    /// # Business Rules
    /// - First name, last name and matricule are required
    /// - The matricule is not held by any other agent
    /// - A placeholder photo is derived from a fresh id
    pub async fn add_agent(&self, draft: AgentDraft) -> RosterResult<Agent> {
        let profile = AgentProfile::new(draft)?;
        let _guard = self.writer.lock().await;

        self.ensure_matricule_free(&profile, None).await?;

        let photo_url = placeholder_photo_url(&Uuid::new_v4().simple().to_string());
        let id = self
            .store
            .create(
                Collection::Agents,
                new_agent_document(&profile, photo_url.clone())?,
            )
            .await?;

        let agent = Agent::from_persistence(id, profile, photo_url);
        self.refresh_agent(&agent).await;
        tracing::info!(agent_id = %id, matricule = %agent.profile().matricule(), "Agent added");

        Ok(agent)
    }

    /// Replaces an agent's editable fields. Id and photo are kept.
    pub async fn update_agent(&self, agent_id: Uuid, draft: AgentDraft) -> RosterResult<Agent> {
        let profile = AgentProfile::new(draft)?;
        let _guard = self.writer.lock().await;

        let mut agent = self
            .snapshot
            .read()
            .await
            .agent(agent_id)
            .cloned()
            .ok_or_else(|| RosterError::agent_not_found(agent_id))?;
        self.ensure_matricule_free(&profile, Some(agent_id)).await?;

        self.store
            .update(Collection::Agents, agent_id, agent_profile_fields(&profile)?)
            .await
            .map_err(not_found_as_roster)?;

        agent.update_profile(profile);
        self.refresh_agent(&agent).await;
        tracing::info!(agent_id = %agent_id, "Agent updated");

        Ok(agent)
    }

    /// Deletes an agent and removes it from every mission in one batch
    ///
    /// Missions are read from the store rather than the snapshot, so
    /// assignments not yet seen locally are released as well.
    pub async fn delete_agent(&self, agent_id: Uuid) -> RosterResult<()> {
        let _guard = self.writer.lock().await;

        if self.store.get(Collection::Agents, agent_id).await?.is_none() {
            return Err(RosterError::agent_not_found(agent_id));
        }

        let mut ops = Vec::new();
        let mut released = Vec::new();
        for document in self.store.list(Collection::Missions).await? {
            let mut mission = decode_mission(&document)?;
            if let Some(event) = mission.release_agent(agent_id) {
                ops.push(WriteOp::Update {
                    collection: Collection::Missions,
                    id: mission.id(),
                    fields: mission_agent_fields(mission.agent_ids())?,
                });
                released.push((mission, event));
            }
        }
        ops.push(WriteOp::Delete {
            collection: Collection::Agents,
            id: agent_id,
        });

        self.store
            .batched_write(ops)
            .await
            .map_err(not_found_as_roster)?;

        self.snapshot
            .write()
            .await
            .remove(Collection::Agents, agent_id);
        for (mission, event) in &released {
            self.refresh_mission(mission).await;
            record(event);
        }

        tracing::info!(
            agent_id = %agent_id,
            released_from = released.len(),
            "Agent deleted"
        );
        Ok(())
    }

    // ===== Mission mutations =====

    /// Plans a new mission
    ///
    /// # Business Rules
    /// - Title, both dates and at least one agent are required
    /// - The start date is not after the end date
    /// - Every agent exists and is not on another active mission
    /// - A stored mission that cannot be read still holds the agents it lists
    pub async fn add_mission(&self, draft: MissionDraft) -> RosterResult<Mission> {
        let plan = MissionPlan::new(draft)?;
        let _guard = self.writer.lock().await;

        {
            let snapshot = self.snapshot.read().await;
            for agent_id in plan.agent_ids() {
                if snapshot.agent(*agent_id).is_none() {
                    return Err(RosterError::agent_not_found(*agent_id));
                }
                if let Some(mission_id) = snapshot.blocking_mission(*agent_id) {
                    return Err(RosterError::Conflict {
                        agent_id: *agent_id,
                        mission_id,
                    });
                }
            }
        }

        let id = self
            .store
            .create(Collection::Missions, new_mission_document(&plan)?)
            .await?;

        let (mission, event) = Mission::from_plan(id, plan);
        self.refresh_mission(&mission).await;
        record(&event);
        Ok(mission)
    }

    /// Moves a planned mission to in-progress
    pub async fn start_mission(&self, mission_id: Uuid) -> RosterResult<Mission> {
        let _guard = self.writer.lock().await;

        let mut mission = self.current_mission(mission_id).await?;
        let event = mission.start()?;
        self.write_status(&mission).await?;

        record(&event);
        Ok(mission)
    }

    /// Completes a mission, releasing its agents
    ///
    /// Completing a completed mission succeeds without writing anything.
    pub async fn complete_mission(&self, mission_id: Uuid) -> RosterResult<Mission> {
        let _guard = self.writer.lock().await;

        let mut mission = self.current_mission(mission_id).await?;
        if mission.is_completed() {
            tracing::debug!(mission_id = %mission_id, "Mission already completed");
            return Ok(mission);
        }
        let event = mission.complete()?;
        self.write_status(&mission).await?;

        record(&event);
        Ok(mission)
    }

    /// Pushes a mission's end date back
    pub async fn extend_mission(&self, mission_id: Uuid, new_end: NaiveDate) -> RosterResult<Mission> {
        let _guard = self.writer.lock().await;

        let mut mission = self.current_mission(mission_id).await?;
        let event = mission.extend(new_end)?;
        self.store
            .update(
                Collection::Missions,
                mission_id,
                mission_end_date_fields(mission.end_date())?,
            )
            .await
            .map_err(not_found_as_roster)?;
        self.refresh_mission(&mission).await;

        record(&event);
        Ok(mission)
    }

    // ===== Queries =====

    pub async fn agent(&self, agent_id: Uuid) -> RosterResult<AgentView> {
        let snapshot = self.read().await;
        snapshot
            .agent(agent_id)
            .map(|agent| reports::agent_view(&snapshot, agent))
            .ok_or_else(|| RosterError::agent_not_found(agent_id))
    }

    /// Status of a known agent
    pub async fn agent_status(&self, agent_id: Uuid) -> RosterResult<AgentStatus> {
        let snapshot = self.read().await;
        if snapshot.agent(agent_id).is_none() {
            return Err(RosterError::agent_not_found(agent_id));
        }
        Ok(snapshot.agent_status(agent_id))
    }

    pub async fn agents(&self) -> Vec<AgentView> {
        reports::agents(&*self.read().await, None, None)
    }

    pub async fn search_agents(&self, term: &str, status: Option<AgentStatus>) -> Vec<AgentView> {
        reports::agents(&*self.read().await, Some(term), status)
    }

    pub async fn mission(&self, mission_id: Uuid) -> RosterResult<Mission> {
        self.read()
            .await
            .mission(mission_id)
            .cloned()
            .ok_or_else(|| RosterError::mission_not_found(mission_id))
    }

    pub async fn missions(&self, status: Option<MissionStatus>) -> Vec<Mission> {
        reports::missions(&*self.read().await, None, status)
    }

    pub async fn search_missions(&self, term: &str, status: Option<MissionStatus>) -> Vec<Mission> {
        reports::missions(&*self.read().await, Some(term), status)
    }

    pub async fn mission_agents(&self, mission_id: Uuid) -> RosterResult<Vec<AgentView>> {
        let snapshot = self.read().await;
        let mission = snapshot
            .mission(mission_id)
            .ok_or_else(|| RosterError::mission_not_found(mission_id))?;
        Ok(reports::mission_agents(&snapshot, mission))
    }

    /// Completed missions, optionally only those of one known agent
    pub async fn history(
        &self,
        agent_id: Option<Uuid>,
        sort: HistorySort,
    ) -> RosterResult<Vec<HistoryEntry>> {
        let snapshot = self.read().await;
        if let Some(id) = agent_id {
            if snapshot.agent(id).is_none() {
                return Err(RosterError::agent_not_found(id));
            }
        }
        Ok(reports::history(&snapshot, agent_id, sort))
    }

    pub async fn dashboard(&self) -> DashboardStats {
        reports::dashboard(&*self.read().await)
    }

    // ===== Internals =====

    async fn read(&self) -> RwLockReadGuard<'_, RosterSnapshot> {
        self.snapshot.read().await
    }

    async fn ensure_matricule_free(
        &self,
        profile: &AgentProfile,
        except: Option<Uuid>,
    ) -> RosterResult<()> {
        let matricule = profile.matricule().as_str();
        if self
            .read()
            .await
            .matricule_owner(matricule, except)
            .is_some()
        {
            return Err(ValidationError::DuplicateMatricule(matricule.to_string()).into());
        }
        Ok(())
    }

    async fn current_mission(&self, mission_id: Uuid) -> RosterResult<Mission> {
        self.read()
            .await
            .mission(mission_id)
            .cloned()
            .ok_or_else(|| RosterError::mission_not_found(mission_id))
    }

    async fn write_status(&self, mission: &Mission) -> RosterResult<()> {
        self.store
            .update(
                Collection::Missions,
                mission.id(),
                mission_status_fields(mission.status())?,
            )
            .await
            .map_err(not_found_as_roster)?;
        self.refresh_mission(mission).await;
        Ok(())
    }

    /// Brings a just-written agent into the snapshot
    ///
    /// The write is already committed, so a failed read-back falls back to
    /// the state the caller wrote instead of failing the operation.
    async fn refresh_agent(&self, agent: &Agent) {
        if let Err(e) = self.refresh(Collection::Agents, agent.id()).await {
            tracing::warn!(
                error = %e,
                agent_id = %agent.id(),
                "Read-back failed, using written state"
            );
            self.snapshot.write().await.assume_agent(agent.clone());
        }
    }

    async fn refresh_mission(&self, mission: &Mission) {
        if let Err(e) = self.refresh(Collection::Missions, mission.id()).await {
            tracing::warn!(
                error = %e,
                mission_id = %mission.id(),
                "Read-back failed, using written state"
            );
            self.snapshot.write().await.assume_mission(mission.clone());
        }
    }

    /// Pulls one document into the snapshot so callers see their own writes
    /// before the change notification arrives
    async fn refresh(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        let document = self.store.get(collection, id).await?;
        let mut snapshot = self.snapshot.write().await;
        match document {
            Some(document) => {
                snapshot.upsert(collection, &document)?;
            }
            None => {
                snapshot.remove(collection, id);
            }
        }
        Ok(())
    }
}

fn record(event: &MissionEvent) {
    match event {
        MissionEvent::Planned { agent_ids, .. } => tracing::info!(
            mission_id = %event.mission_id(),
            event = event.name(),
            agents = agent_ids.len(),
            "Mission event"
        ),
        MissionEvent::Extended {
            previous_end,
            new_end,
            ..
        } => tracing::info!(
            mission_id = %event.mission_id(),
            event = event.name(),
            %previous_end,
            %new_end,
            "Mission event"
        ),
        MissionEvent::AgentReleased { agent_id, .. } => tracing::info!(
            mission_id = %event.mission_id(),
            event = event.name(),
            agent_id = %agent_id,
            "Mission event"
        ),
        MissionEvent::Started { .. } | MissionEvent::Completed { .. } => tracing::info!(
            mission_id = %event.mission_id(),
            event = event.name(),
            "Mission event"
        ),
    }
}

fn not_found_as_roster(error: StoreError) -> RosterError {
    match error {
        StoreError::NotFound { collection, id } => RosterError::NotFound {
            kind: match collection {
                Collection::Agents => EntityKind::Agent,
                Collection::Missions => EntityKind::Mission,
            },
            id,
        },
        other => RosterError::Store(other),
    }
}
