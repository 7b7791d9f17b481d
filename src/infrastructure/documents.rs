//! Mapping between domain aggregates and stored JSON documents.
//!
//! Field names follow the persisted schema (`firstName`, `agentIds`, ...).

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentDraft, AgentProfile};
use crate::domain::mission::{Mission, MissionPlan, MissionStatus};
use crate::domain::repositories::{Collection, Document, StoreError, StoreResult, StoredDocument};

/// Stored shape of an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDocument {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    pub matricule: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub photo_url: String,
}

/// Stored shape of a mission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDocument {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub agent_ids: BTreeSet<Uuid>,
    pub status: MissionStatus,
}

/// Body of a new agent document
pub fn new_agent_document(profile: &AgentProfile, photo_url: String) -> StoreResult<Document> {
    to_document(Collection::Agents, &profile_document(profile, photo_url))
}

/// Fields written when an agent is edited. The photo is left untouched.
pub fn agent_profile_fields(profile: &AgentProfile) -> StoreResult<Document> {
    let mut fields = to_document(Collection::Agents, &profile_document(profile, String::new()))?;
    fields.remove("photoUrl");
    if profile.grade().is_none() {
        fields.insert("grade".to_string(), serde_json::Value::Null);
    }
    Ok(fields)
}

/// Body of a new mission document, always planned
pub fn new_mission_document(plan: &MissionPlan) -> StoreResult<Document> {
    to_document(Collection::Missions, &MissionDocument {
        title: plan.title().to_string(),
        description: plan.description().to_string(),
        start_date: plan.start_date(),
        end_date: plan.end_date(),
        agent_ids: plan.agent_ids().clone(),
        status: MissionStatus::Planned,
    })
}

/// Full body of a mission document
pub fn mission_document(mission: &Mission) -> StoreResult<Document> {
    to_document(Collection::Missions, &MissionDocument {
        title: mission.title().to_string(),
        description: mission.description().to_string(),
        start_date: mission.start_date(),
        end_date: mission.end_date(),
        agent_ids: mission.agent_ids().clone(),
        status: mission.status(),
    })
}

pub fn mission_status_fields(status: MissionStatus) -> StoreResult<Document> {
    single_field("status", &status)
}

pub fn mission_end_date_fields(end_date: NaiveDate) -> StoreResult<Document> {
    single_field("endDate", &end_date)
}

pub fn mission_agent_fields(agent_ids: &BTreeSet<Uuid>) -> StoreResult<Document> {
    single_field("agentIds", agent_ids)
}

/// Decodes an agent document
///
/// Stored documents written by older clients may carry fields such as
/// `status` or `currentMissionId`; they are ignored.
pub fn decode_agent(document: &StoredDocument) -> StoreResult<Agent> {
    let stored: AgentDocument = from_document(Collection::Agents, document)?;
    let profile = AgentProfile::new(AgentDraft {
        first_name: stored.first_name,
        last_name: stored.last_name,
        grade: stored.grade,
        matricule: stored.matricule,
        contact: stored.contact,
        address: stored.address,
    })
    .map_err(|e| StoreError::Decode {
        collection: Collection::Agents,
        id: document.id,
        reason: e.to_string(),
    })?;

    Ok(Agent::from_persistence(
        document.id,
        profile,
        stored.photo_url,
    ))
}

pub fn decode_mission(document: &StoredDocument) -> StoreResult<Mission> {
    let stored: MissionDocument = from_document(Collection::Missions, document)?;
    Ok(Mission::from_persistence(
        document.id,
        stored.title,
        stored.description,
        stored.start_date,
        stored.end_date,
        stored.agent_ids,
        stored.status,
    ))
}

fn profile_document(profile: &AgentProfile, photo_url: String) -> AgentDocument {
    AgentDocument {
        first_name: profile.first_name().to_string(),
        last_name: profile.last_name().to_string(),
        grade: profile.grade().map(str::to_string),
        matricule: profile.matricule().as_str().to_string(),
        contact: profile.contact().to_string(),
        address: profile.address().to_string(),
        photo_url,
    }
}

/// Agent ids of a mission document that does not decode as a whole
///
/// `None` when the `agentIds` field itself is missing or malformed.
pub fn raw_mission_agent_ids(document: &StoredDocument) -> Option<BTreeSet<Uuid>> {
    document
        .data
        .get("agentIds")?
        .as_array()?
        .iter()
        .map(|id| id.as_str().and_then(|s| Uuid::parse_str(s).ok()))
        .collect()
}

fn single_field<T: Serialize + ?Sized>(name: &str, value: &T) -> StoreResult<Document> {
    let value = serde_json::to_value(value).map_err(|e| StoreError::Encode {
        collection: Collection::Missions,
        reason: e.to_string(),
    })?;
    let mut fields = Document::new();
    fields.insert(name.to_string(), value);
    Ok(fields)
}

fn to_document<T: Serialize>(collection: Collection, value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Encode {
            collection,
            reason: format!("expected an object, got {}", other),
        }),
        Err(e) => Err(StoreError::Encode {
            collection,
            reason: e.to_string(),
        }),
    }
}

fn from_document<T: DeserializeOwned>(
    collection: Collection,
    document: &StoredDocument,
) -> StoreResult<T> {
    serde_json::from_value(serde_json::Value::Object(document.data.clone())).map_err(|e| {
        StoreError::Decode {
            collection,
            id: document.id,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mission::MissionDraft;
    use serde_json::json;

    fn stored(data: serde_json::Value) -> StoredDocument {
        StoredDocument {
            id: Uuid::new_v4(),
            revision: 1,
            data: data.as_object().cloned().unwrap(),
        }
    }

    fn profile() -> AgentProfile {
        AgentProfile::new(AgentDraft {
            first_name: "Jean".to_string(),
            last_name: "Koffi".to_string(),
            grade: None,
            matricule: "M-100".to_string(),
            contact: "jean@bssi.example".to_string(),
            address: String::new(),
        })
        .unwrap()
    }

    #[test]
    fn agent_document_uses_stored_field_names() {
        let doc =
            new_agent_document(&profile(), "https://picsum.photos/seed/a/400/400".into()).unwrap();

        assert_eq!(doc["firstName"], json!("Jean"));
        assert_eq!(doc["lastName"], json!("Koffi"));
        assert_eq!(doc["matricule"], json!("M-100"));
        assert_eq!(doc["photoUrl"], json!("https://picsum.photos/seed/a/400/400"));
        assert!(!doc.contains_key("grade"));
        assert!(!doc.contains_key("status"));
    }

    #[test]
    fn profile_fields_leave_photo_and_clear_grade() {
        let fields = agent_profile_fields(&profile()).unwrap();

        assert!(!fields.contains_key("photoUrl"));
        assert_eq!(fields["grade"], serde_json::Value::Null);
    }

    #[test]
    fn decode_agent_ignores_legacy_status_fields() {
        let document = stored(json!({
            "firstName": "Tali",
            "lastName": "Zorah",
            "matricule": "QM-003",
            "contact": "",
            "address": "",
            "photoUrl": "",
            "status": "occupied",
            "currentMissionId": "101"
        }));

        let agent = decode_agent(&document).unwrap();

        assert_eq!(agent.id(), document.id);
        assert_eq!(agent.profile().matricule().as_str(), "QM-003");
    }

    #[test]
    fn decode_agent_with_missing_matricule_fails() {
        let document = stored(json!({ "firstName": "A", "lastName": "B", "matricule": "" }));

        assert!(matches!(
            decode_agent(&document),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn mission_document_decodes_back() {
        let agent = Uuid::new_v4();
        let plan = MissionPlan::new(MissionDraft {
            title: "Patrouille".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            agent_ids: vec![agent],
        })
        .unwrap();

        let data = new_mission_document(&plan).unwrap();
        assert_eq!(data["status"], json!("planned"));
        assert_eq!(data["startDate"], json!("2024-01-01"));
        assert_eq!(data["agentIds"], json!([agent.to_string()]));

        let mission = decode_mission(&StoredDocument {
            id: Uuid::new_v4(),
            revision: 3,
            data,
        })
        .unwrap();
        assert_eq!(mission.status(), MissionStatus::Planned);
        assert!(mission.has_agent(agent));
    }

    #[test]
    fn decode_mission_with_unknown_status_fails() {
        let document = stored(json!({
            "title": "X",
            "startDate": "2024-01-01",
            "endDate": "2024-01-02",
            "agentIds": [],
            "status": "archived"
        }));

        assert!(decode_mission(&document).is_err());
    }

    #[test]
    fn single_field_documents() {
        assert_eq!(
            mission_status_fields(MissionStatus::Completed).unwrap()["status"],
            json!("completed")
        );
        assert_eq!(
            mission_end_date_fields(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()).unwrap()["endDate"],
            json!("2024-03-09")
        );
    }

    #[test]
    fn raw_agent_ids_survive_a_broken_document() {
        let agent = Uuid::new_v4();
        let broken = stored(json!({ "title": "X", "agentIds": [agent], "status": "archived" }));
        assert!(decode_mission(&broken).is_err());
        assert_eq!(
            raw_mission_agent_ids(&broken),
            Some(BTreeSet::from([agent]))
        );

        let garbled = stored(json!({ "title": "X", "agentIds": [agent, 7] }));
        assert_eq!(raw_mission_agent_ids(&garbled), None);
        assert_eq!(raw_mission_agent_ids(&stored(json!({ "title": "X" }))), None);
    }
}
