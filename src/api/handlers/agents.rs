use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reports::{HistoryEntryResponse, HistoryQuery};
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::agent::{Agent, AgentDraft};
use crate::domain::availability::AgentStatus;
use crate::engine::AgentView;

/// Request body for creating or editing an agent
///
/// Missing text fields arrive empty so the roster can name the one missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentRequest {
    pub first_name: String,
    pub last_name: String,
    pub grade: Option<String>,
    pub matricule: String,
    pub contact: String,
    pub address: String,
}

impl From<AgentRequest> for AgentDraft {
    fn from(req: AgentRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            grade: req.grade,
            matricule: req.matricule,
            contact: req.contact,
            address: req.address,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub grade: Option<String>,
    pub matricule: String,
    pub contact: String,
    pub address: String,
    pub photo_url: String,
    pub status: AgentStatus,
}

impl AgentResponse {
    fn new(agent: &Agent, status: AgentStatus) -> Self {
        let profile = agent.profile();
        Self {
            id: agent.id(),
            first_name: profile.first_name().to_string(),
            last_name: profile.last_name().to_string(),
            grade: profile.grade().map(str::to_string),
            matricule: profile.matricule().as_str().to_string(),
            contact: profile.contact().to_string(),
            address: profile.address().to_string(),
            photo_url: agent.photo_url().to_string(),
            status,
        }
    }
}

impl From<&AgentView> for AgentResponse {
    fn from(view: &AgentView) -> Self {
        Self::new(&view.agent, view.status)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentListQuery {
    /// Matched against names, matricule and contact
    pub q: Option<String>,
    pub status: Option<AgentStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentStatusResponse {
    pub agent_id: Uuid,
    pub status: AgentStatus,
}

/// List agents, optionally filtered
///
/// GET /api/agents?q=&status=
pub async fn list_agents(
    State(state): State<AppState>,
    Query(query): Query<AgentListQuery>,
) -> Json<Vec<AgentResponse>> {
    let views = state
        .roster
        .search_agents(query.q.as_deref().unwrap_or_default(), query.status)
        .await;

    Json(views.iter().map(AgentResponse::from).collect())
}

/// Register a new agent
///
/// POST /api/agents
pub async fn create_agent(
    State(state): State<AppState>,
    Json(req): Json<AgentRequest>,
) -> Result<(StatusCode, Json<AgentResponse>), ApiError> {
    let agent = state.roster.add_agent(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(AgentResponse::new(&agent, AgentStatus::Available)),
    ))
}

/// Get an agent by ID
///
/// GET /api/agents/:id
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AgentResponse>, ApiError> {
    let view = state.roster.agent(id).await?;

    Ok(Json(AgentResponse::from(&view)))
}

/// Replace an agent's editable fields
///
/// PUT /api/agents/:id
pub async fn update_agent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    state.roster.update_agent(id, req.into()).await?;
    let view = state.roster.agent(id).await?;

    Ok(Json(AgentResponse::from(&view)))
}

/// Delete an agent and release it from its missions
///
/// DELETE /api/agents/:id
pub async fn delete_agent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.roster.delete_agent(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/agents/:id/status
pub async fn get_agent_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AgentStatusResponse>, ApiError> {
    let status = state.roster.agent_status(id).await?;

    Ok(Json(AgentStatusResponse {
        agent_id: id,
        status,
    }))
}

/// Completed missions of one agent
///
/// GET /api/agents/:id/history?sort=date|title
pub async fn get_agent_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntryResponse>>, ApiError> {
    let entries = state
        .roster
        .history(Some(id), query.sort.unwrap_or_default())
        .await?;

    Ok(Json(entries.iter().map(HistoryEntryResponse::from).collect()))
}
