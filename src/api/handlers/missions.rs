use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agents::AgentResponse;
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::mission::{Mission, MissionDraft, MissionStatus};

/// Request body for planning a mission
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateMissionRequest {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub agent_ids: Vec<Uuid>,
}

impl From<CreateMissionRequest> for MissionDraft {
    fn from(req: CreateMissionRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            agent_ids: req.agent_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtendMissionRequest {
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MissionResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub agent_ids: BTreeSet<Uuid>,
    pub status: MissionStatus,
}

impl From<&Mission> for MissionResponse {
    fn from(mission: &Mission) -> Self {
        Self {
            id: mission.id(),
            title: mission.title().to_string(),
            description: mission.description().to_string(),
            start_date: mission.start_date(),
            end_date: mission.end_date(),
            agent_ids: mission.agent_ids().clone(),
            status: mission.status(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MissionListQuery {
    /// Matched against title and description
    pub q: Option<String>,
    pub status: Option<MissionStatus>,
}

/// List missions sorted by title, optionally filtered
///
/// GET /api/missions?q=&status=
pub async fn list_missions(
    State(state): State<AppState>,
    Query(query): Query<MissionListQuery>,
) -> Json<Vec<MissionResponse>> {
    let missions = match query.q.as_deref() {
        Some(term) => state.roster.search_missions(term, query.status).await,
        None => state.roster.missions(query.status).await,
    };

    Json(missions.iter().map(MissionResponse::from).collect())
}

/// Plan a new mission
///
/// POST /api/missions
pub async fn create_mission(
    State(state): State<AppState>,
    Json(req): Json<CreateMissionRequest>,
) -> Result<(StatusCode, Json<MissionResponse>), ApiError> {
    let mission = state.roster.add_mission(req.into()).await?;

    Ok((StatusCode::CREATED, Json(MissionResponse::from(&mission))))
}

/// GET /api/missions/:id
pub async fn get_mission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MissionResponse>, ApiError> {
    let mission = state.roster.mission(id).await?;

    Ok(Json(MissionResponse::from(&mission)))
}

/// POST /api/missions/:id/start
pub async fn start_mission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MissionResponse>, ApiError> {
    let mission = state.roster.start_mission(id).await?;

    Ok(Json(MissionResponse::from(&mission)))
}

/// Complete a mission. Completing twice is not an error.
///
/// POST /api/missions/:id/complete
pub async fn complete_mission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MissionResponse>, ApiError> {
    let mission = state.roster.complete_mission(id).await?;

    Ok(Json(MissionResponse::from(&mission)))
}

/// POST /api/missions/:id/extend
pub async fn extend_mission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ExtendMissionRequest>,
) -> Result<Json<MissionResponse>, ApiError> {
    let mission = state.roster.extend_mission(id, req.end_date).await?;

    Ok(Json(MissionResponse::from(&mission)))
}

/// Agents taking part in a mission
///
/// GET /api/missions/:id/agents
pub async fn get_mission_agents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AgentResponse>>, ApiError> {
    let views = state.roster.mission_agents(id).await?;

    Ok(Json(views.iter().map(AgentResponse::from).collect()))
}
