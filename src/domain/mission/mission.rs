use std::collections::BTreeSet;

use chrono::NaiveDate;
use uuid::Uuid;

use super::events::MissionEvent;
use super::value_objects::MissionStatus;
use crate::domain::errors::ValidationError;

/// Raw mission input as received from a caller
#[derive(Debug, Clone, Default)]
pub struct MissionDraft {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub agent_ids: Vec<Uuid>,
}

/// A validated mission that has not been persisted yet
///
/// # Invariants
/// - Title is not blank
/// - Both dates are present and `start_date <= end_date`
/// - At least one agent is assigned (duplicates collapsed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionPlan {
    title: String,
    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    agent_ids: BTreeSet<Uuid>,
}

impl MissionPlan {
    /// Validates a draft
    ///
    /// # Returns
    /// * `Ok(MissionPlan)` - If every field rule holds
    /// * `Err(ValidationError)` - The first rule that failed
    pub fn new(draft: MissionDraft) -> Result<Self, ValidationError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }

        let start_date = draft
            .start_date
            .ok_or(ValidationError::MissingField("start_date"))?;
        let end_date = draft
            .end_date
            .ok_or(ValidationError::MissingField("end_date"))?;

        if start_date > end_date {
            return Err(ValidationError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        let agent_ids: BTreeSet<Uuid> = draft.agent_ids.into_iter().collect();
        if agent_ids.is_empty() {
            return Err(ValidationError::NoAgentsAssigned);
        }

        Ok(Self {
            title,
            description: draft.description.trim().to_string(),
            start_date,
            end_date,
            agent_ids,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn agent_ids(&self) -> &BTreeSet<Uuid> {
        &self.agent_ids
    }
}

/// Mission aggregate root
///
/// A time-boxed task with a status and a set of assigned agents. Enforces the
/// lifecycle rules; agent availability is derived from missions elsewhere and
/// never stored here.
///
/// # Invariants
/// - `end_date >= start_date`
/// - `end_date` only moves forward
/// - Completed is terminal
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use roster_api::domain::mission::{Mission, MissionDraft, MissionPlan, MissionStatus};
/// use uuid::Uuid;
///
/// let plan = MissionPlan::new(MissionDraft {
///     title: "Patrouille".to_string(),
///     description: String::new(),
///     start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
///     end_date: NaiveDate::from_ymd_opt(2024, 1, 5),
///     agent_ids: vec![Uuid::new_v4()],
/// })
/// .expect("valid plan");
///
/// let (mission, _event) = Mission::from_plan(Uuid::new_v4(), plan);
/// assert_eq!(mission.status(), MissionStatus::Planned);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    id: Uuid,
    title: String,
    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    agent_ids: BTreeSet<Uuid>,
    status: MissionStatus,
}

impl Mission {
    /// Builds the planned mission for a plan the store accepted under `id`
    pub fn from_plan(id: Uuid, plan: MissionPlan) -> (Self, MissionEvent) {
        let mission = Self {
            id,
            title: plan.title,
            description: plan.description,
            start_date: plan.start_date,
            end_date: plan.end_date,
            agent_ids: plan.agent_ids,
            status: MissionStatus::Planned,
        };

        let event = MissionEvent::Planned {
            mission_id: id,
            agent_ids: mission.agent_ids.iter().copied().collect(),
        };

        (mission, event)
    }

    /// Moves the mission from planned to in-progress
    pub fn start(&mut self) -> Result<MissionEvent, ValidationError> {
        self.transition_to(MissionStatus::InProgress)?;
        Ok(MissionEvent::Started {
            mission_id: self.id,
        })
    }

    /// Completes the mission
    ///
    /// # Business Rules
    /// - Planned and in-progress missions can complete
    /// - A completed mission cannot complete again; callers that want
    ///   idempotence check `is_completed` first
    pub fn complete(&mut self) -> Result<MissionEvent, ValidationError> {
        self.transition_to(MissionStatus::Completed)?;
        Ok(MissionEvent::Completed {
            mission_id: self.id,
        })
    }

    /// Pushes the end date back
    ///
    /// # Business Rules
    /// - The mission must not be completed
    /// - `new_end` must not be before the current end date
    pub fn extend(&mut self, new_end: NaiveDate) -> Result<MissionEvent, ValidationError> {
        if self.is_completed() {
            return Err(ValidationError::MissionCompleted);
        }

        if new_end < self.end_date {
            return Err(ValidationError::EndDateRegression {
                current: self.end_date,
                requested: new_end,
            });
        }

        let previous_end = self.end_date;
        self.end_date = new_end;

        Ok(MissionEvent::Extended {
            mission_id: self.id,
            previous_end,
            new_end,
        })
    }

    /// Removes an agent from the mission. Status is left untouched.
    pub fn release_agent(&mut self, agent_id: Uuid) -> Option<MissionEvent> {
        if self.agent_ids.remove(&agent_id) {
            Some(MissionEvent::AgentReleased {
                mission_id: self.id,
                agent_id,
            })
        } else {
            None
        }
    }

    fn transition_to(&mut self, next: MissionStatus) -> Result<(), ValidationError> {
        if !self.status.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn agent_ids(&self) -> &BTreeSet<Uuid> {
        &self.agent_ids
    }

    pub fn status(&self) -> MissionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_completed(&self) -> bool {
        self.status == MissionStatus::Completed
    }

    pub fn has_agent(&self, agent_id: Uuid) -> bool {
        self.agent_ids.contains(&agent_id)
    }

    /// Length in whole days between start and end
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Case-insensitive match over title and description
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }

    /// Reconstructs a Mission from stored data
    ///
    /// Bypasses validation since the data was validated when written.
    /// Only to be used by store adapters.
    pub fn from_persistence(
        id: Uuid,
        title: String,
        description: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        agent_ids: BTreeSet<Uuid>,
        status: MissionStatus,
    ) -> Self {
        Self {
            id,
            title,
            description,
            start_date,
            end_date,
            agent_ids,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(agent_ids: Vec<Uuid>) -> MissionDraft {
        MissionDraft {
            title: "Patrouille".to_string(),
            description: "Ronde de nuit".to_string(),
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(date(2024, 1, 5)),
            agent_ids,
        }
    }

    fn planned_mission() -> Mission {
        let plan = MissionPlan::new(draft(vec![Uuid::new_v4()])).unwrap();
        Mission::from_plan(Uuid::new_v4(), plan).0
    }

    #[test]
    fn plan_with_valid_draft() {
        let agent = Uuid::new_v4();
        let plan = MissionPlan::new(draft(vec![agent, agent])).unwrap();

        assert_eq!(plan.title(), "Patrouille");
        assert_eq!(plan.agent_ids().len(), 1);
        assert!(plan.agent_ids().contains(&agent));
    }

    #[test]
    fn plan_with_blank_title_fails() {
        let mut d = draft(vec![Uuid::new_v4()]);
        d.title = "   ".to_string();

        assert_eq!(
            MissionPlan::new(d).unwrap_err(),
            ValidationError::MissingField("title")
        );
    }

    #[test]
    fn plan_without_dates_fails() {
        let mut d = draft(vec![Uuid::new_v4()]);
        d.end_date = None;

        assert_eq!(
            MissionPlan::new(d).unwrap_err(),
            ValidationError::MissingField("end_date")
        );
    }

    #[test]
    fn plan_with_inverted_dates_fails() {
        let mut d = draft(vec![Uuid::new_v4()]);
        d.start_date = Some(date(2024, 2, 1));

        assert!(matches!(
            MissionPlan::new(d),
            Err(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn plan_with_same_start_and_end_is_valid() {
        let mut d = draft(vec![Uuid::new_v4()]);
        d.end_date = d.start_date;

        assert!(MissionPlan::new(d).is_ok());
    }

    #[test]
    fn plan_without_agents_fails() {
        assert_eq!(
            MissionPlan::new(draft(vec![])).unwrap_err(),
            ValidationError::NoAgentsAssigned
        );
    }

    #[test]
    fn from_plan_starts_planned_and_emits_event() {
        let agent = Uuid::new_v4();
        let id = Uuid::new_v4();
        let plan = MissionPlan::new(draft(vec![agent])).unwrap();

        let (mission, event) = Mission::from_plan(id, plan);

        assert_eq!(mission.id(), id);
        assert_eq!(mission.status(), MissionStatus::Planned);
        assert!(mission.has_agent(agent));
        assert_eq!(
            event,
            MissionEvent::Planned {
                mission_id: id,
                agent_ids: vec![agent],
            }
        );
    }

    #[test]
    fn start_then_complete() {
        let mut mission = planned_mission();

        mission.start().unwrap();
        assert_eq!(mission.status(), MissionStatus::InProgress);

        mission.complete().unwrap();
        assert_eq!(mission.status(), MissionStatus::Completed);
    }

    #[test]
    fn start_twice_fails() {
        let mut mission = planned_mission();
        mission.start().unwrap();

        assert!(matches!(
            mission.start(),
            Err(ValidationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn complete_is_one_way() {
        let mut mission = planned_mission();
        mission.complete().unwrap();

        assert!(mission.complete().is_err());
        assert!(mission.start().is_err());
        assert!(mission.is_completed());
    }

    #[test]
    fn extend_moves_end_date_forward() {
        let mut mission = planned_mission();

        let event = mission.extend(date(2024, 1, 10)).unwrap();

        assert_eq!(mission.end_date(), date(2024, 1, 10));
        assert_eq!(
            event,
            MissionEvent::Extended {
                mission_id: mission.id(),
                previous_end: date(2024, 1, 5),
                new_end: date(2024, 1, 10),
            }
        );
    }

    #[test]
    fn extend_to_same_date_is_allowed() {
        let mut mission = planned_mission();
        assert!(mission.extend(date(2024, 1, 5)).is_ok());
    }

    #[test]
    fn extend_backwards_fails_and_keeps_end_date() {
        let mut mission = planned_mission();

        let result = mission.extend(date(2024, 1, 3));

        assert!(matches!(
            result,
            Err(ValidationError::EndDateRegression { .. })
        ));
        assert_eq!(mission.end_date(), date(2024, 1, 5));
    }

    #[test]
    fn extend_completed_mission_fails() {
        let mut mission = planned_mission();
        mission.complete().unwrap();

        assert_eq!(
            mission.extend(date(2024, 2, 1)).unwrap_err(),
            ValidationError::MissionCompleted
        );
    }

    #[test]
    fn release_agent_keeps_status() {
        let agent = Uuid::new_v4();
        let plan = MissionPlan::new(draft(vec![agent, Uuid::new_v4()])).unwrap();
        let (mut mission, _) = Mission::from_plan(Uuid::new_v4(), plan);
        mission.start().unwrap();

        assert!(mission.release_agent(agent).is_some());
        assert!(mission.release_agent(agent).is_none());
        assert!(!mission.has_agent(agent));
        assert_eq!(mission.status(), MissionStatus::InProgress);
    }

    #[test]
    fn duration_in_days() {
        let mission = planned_mission();
        assert_eq!(mission.duration_days(), 4);
    }

    #[test]
    fn matches_title_or_description() {
        let mission = planned_mission();

        assert!(mission.matches("patrou"));
        assert!(mission.matches("NUIT"));
        assert!(!mission.matches("escorte"));
    }
}
