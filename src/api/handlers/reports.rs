use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::missions::MissionResponse;
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::engine::{DashboardStats, HistoryEntry, HistorySort};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub agent_id: Option<Uuid>,
    pub sort: Option<HistorySort>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntryResponse {
    #[serde(flatten)]
    pub mission: MissionResponse,
    pub duration_days: i64,
}

impl From<&HistoryEntry> for HistoryEntryResponse {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            mission: MissionResponse::from(&entry.mission),
            duration_days: entry.duration_days,
        }
    }
}

/// Completed missions
///
/// GET /api/history?agent_id=&sort=date|title
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntryResponse>>, ApiError> {
    let entries = state
        .roster
        .history(query.agent_id, query.sort.unwrap_or_default())
        .await?;

    Ok(Json(entries.iter().map(HistoryEntryResponse::from).collect()))
}

/// GET /api/dashboard
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.roster.dashboard().await)
}
