use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::domain::repositories::{RepositoryError, TeamRepository};
use crate::domain::team::Team;
use crate::infrastructure::repositories::SqliteTeamRepository;

/// Request body for creating a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

/// Team as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub member_ids: Vec<Uuid>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
            member_ids: team.members().to_vec(),
        }
    }
}

/// Create a new team
///
/// POST /api/teams
pub async fn create_team(
    State(pool): State<SqlitePool>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let team = Team::new(req.name).map_err(ApiError::bad_request)?;

    let team_repo = SqliteTeamRepository::new(pool);
    team_repo.save(&team).await?;

    tracing::info!(team_id = %team.id(), name = team.name(), "created team");
    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// List all teams
///
/// GET /api/teams
pub async fn list_teams(State(pool): State<SqlitePool>) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let team_repo = SqliteTeamRepository::new(pool);
    let teams = team_repo.find_all().await?;

    Ok(Json(teams.iter().map(TeamResponse::from).collect()))
}

/// Get a team by ID, with its member ids
///
/// GET /api/teams/:id
pub async fn get_team(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team_repo = SqliteTeamRepository::new(pool);
    let team = team_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| RepositoryError::team_not_found(id))?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Delete a team; its members stay, without a team
///
/// DELETE /api/teams/:id
pub async fn delete_team(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let team_repo = SqliteTeamRepository::new(pool);
    team_repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
