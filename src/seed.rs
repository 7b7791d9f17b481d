//! Demo roster for a fresh store.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::agent::value_objects::placeholder_photo_url;
use crate::domain::agent::{AgentDraft, AgentProfile};
use crate::domain::errors::RosterResult;
use crate::domain::mission::{Mission, MissionDraft, MissionPlan, MissionStatus};
use crate::domain::repositories::{Collection, DocumentStore, WriteOp};
use crate::infrastructure::documents::{mission_document, new_agent_document};

struct DemoAgent {
    first_name: &'static str,
    last_name: &'static str,
    grade: &'static str,
    matricule: &'static str,
    contact: &'static str,
    address: &'static str,
    photo_seed: &'static str,
}

struct DemoMission {
    title: &'static str,
    description: &'static str,
    start: (i32, u32, u32),
    end: (i32, u32, u32),
    /// Indexes into DEMO_AGENTS
    agents: &'static [usize],
    status: MissionStatus,
}

const DEMO_AGENTS: &[DemoAgent] = &[
    DemoAgent {
        first_name: "Jean",
        last_name: "Koffi",
        grade: "Sergent",
        matricule: "M-100",
        contact: "jkoffi@bssi.example",
        address: "Cocody, Abidjan",
        photo_seed: "jkoffi",
    },
    DemoAgent {
        first_name: "Awa",
        last_name: "Diallo",
        grade: "Lieutenant",
        matricule: "M-101",
        contact: "adiallo@bssi.example",
        address: "Plateau, Abidjan",
        photo_seed: "adiallo",
    },
    DemoAgent {
        first_name: "Kouamé",
        last_name: "Yao",
        grade: "Caporal",
        matricule: "M-102",
        contact: "kyao@bssi.example",
        address: "Bouaké",
        photo_seed: "kyao",
    },
    DemoAgent {
        first_name: "Fatou",
        last_name: "Traoré",
        grade: "Adjudant",
        matricule: "M-103",
        contact: "ftraore@bssi.example",
        address: "Yamoussoukro",
        photo_seed: "ftraore",
    },
    DemoAgent {
        first_name: "Marc",
        last_name: "Bamba",
        grade: "",
        matricule: "M-104",
        contact: "mbamba@bssi.example",
        address: "San-Pédro",
        photo_seed: "mbamba",
    },
];

const DEMO_MISSIONS: &[DemoMission] = &[
    DemoMission {
        title: "Patrouille de nuit",
        description: "Rondes sur le port autonome.",
        start: (2024, 8, 1),
        end: (2024, 8, 15),
        agents: &[2, 3],
        status: MissionStatus::InProgress,
    },
    DemoMission {
        title: "Escorte de convoi",
        description: "Escorte d'un convoi de fonds vers Bouaké.",
        start: (2024, 7, 20),
        end: (2024, 7, 30),
        agents: &[0, 1],
        status: MissionStatus::Completed,
    },
    DemoMission {
        title: "Audit de site",
        description: "Inspection des accès d'un entrepôt client.",
        start: (2024, 9, 1),
        end: (2024, 9, 10),
        agents: &[4],
        status: MissionStatus::Planned,
    },
];

/// Seeds the demo roster when both collections are empty
///
/// Returns whether anything was written. Everything goes in one batch.
pub async fn seed_if_empty(store: &dyn DocumentStore) -> RosterResult<bool> {
    if !store.list(Collection::Agents).await?.is_empty()
        || !store.list(Collection::Missions).await?.is_empty()
    {
        tracing::debug!("Store already holds data, skipping demo seed");
        return Ok(false);
    }

    let ops = demo_ops()?;
    let count = ops.len();
    store.batched_write(ops).await?;

    tracing::info!(documents = count, "Demo roster seeded");
    Ok(true)
}

fn demo_ops() -> RosterResult<Vec<WriteOp>> {
    let mut ops = Vec::new();
    let mut agent_ids = Vec::with_capacity(DEMO_AGENTS.len());

    for demo in DEMO_AGENTS {
        let profile = AgentProfile::new(AgentDraft {
            first_name: demo.first_name.to_string(),
            last_name: demo.last_name.to_string(),
            grade: Some(demo.grade.to_string()),
            matricule: demo.matricule.to_string(),
            contact: demo.contact.to_string(),
            address: demo.address.to_string(),
        })?;
        let id = Uuid::new_v4();
        agent_ids.push(id);
        ops.push(WriteOp::Set {
            collection: Collection::Agents,
            id,
            data: new_agent_document(&profile, placeholder_photo_url(demo.photo_seed))?,
        });
    }

    for demo in DEMO_MISSIONS {
        let plan = MissionPlan::new(MissionDraft {
            title: demo.title.to_string(),
            description: demo.description.to_string(),
            start_date: date(demo.start),
            end_date: date(demo.end),
            agent_ids: demo
                .agents
                .iter()
                .filter_map(|i| agent_ids.get(*i).copied())
                .collect(),
        })?;
        let id = Uuid::new_v4();
        let (planned, _) = Mission::from_plan(id, plan);
        let mission = Mission::from_persistence(
            id,
            planned.title().to_string(),
            planned.description().to_string(),
            planned.start_date(),
            planned.end_date(),
            planned.agent_ids().clone(),
            demo.status,
        );
        ops.push(WriteOp::Set {
            collection: Collection::Missions,
            id,
            data: mission_document(&mission)?,
        });
    }

    Ok(ops)
}

fn date((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}
