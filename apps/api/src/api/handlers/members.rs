use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::domain::member::search::blank_as_none;
use crate::domain::member::{Member, MemberSearchCondition, MemberTeamDto};
use crate::domain::page::{Order, Page, Pageable, Sort, DEFAULT_PAGE_SIZE};
use crate::domain::repositories::{MemberRepository, RepositoryError, TeamRepository};
use crate::infrastructure::repositories::{SqliteMemberRepository, SqliteTeamRepository};

/// Request body for creating a member
#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<Uuid>,
}

/// Request body for moving a member to another team
#[derive(Debug, Deserialize)]
pub struct ChangeTeamRequest {
    pub team_id: Uuid,
}

/// Member as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<Uuid>,
    pub team_name: Option<String>,
}

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id(),
            username: member.username().map(str::to_string),
            age: member.age(),
            team_id: member.team_id(),
            team_name: member.team().map(|team| team.name().to_string()),
        }
    }
}

/// Query string of the paged search endpoints
///
/// `sort` is `property[,asc|desc]`; several terms are separated by `;`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSearchParams {
    pub username: Option<String>,
    pub team_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub age_goe: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub age_loe: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl MemberSearchParams {
    fn condition(&self) -> MemberSearchCondition {
        MemberSearchCondition {
            username: self.username.clone(),
            team_name: self.team_name.clone(),
            age_goe: self.age_goe,
            age_loe: self.age_loe,
        }
    }

    fn pageable(&self) -> Result<Pageable, ApiError> {
        let pageable = Pageable::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .map_err(ApiError::bad_request)?;

        let sort = match self.sort.as_deref().map(str::trim) {
            Some(sort) if !sort.is_empty() => Sort::by(
                sort.split(';')
                    .map(Order::parse)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(ApiError::bad_request)?,
            ),
            _ => Sort::unsorted(),
        };

        Ok(pageable.with_sort(sort))
    }
}

/// One page of search results
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            page: page.number(),
            size: page.size(),
            total_elements: page.total_elements(),
            total_pages: page.total_pages(),
            first: page.is_first(),
            last: page.is_last(),
            content: page.into_content(),
        }
    }
}

/// Create a member, optionally in a team
///
/// POST /api/members
pub async fn create_member(
    State(pool): State<SqlitePool>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let mut member = match req.username {
        Some(username) => Member::new(username, req.age),
        None => Member::anonymous(req.age),
    }
    .map_err(ApiError::bad_request)?;

    if let Some(team_id) = req.team_id {
        let team_repo = SqliteTeamRepository::new(pool.clone());
        let mut team = team_repo
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| RepositoryError::team_not_found(team_id))?;
        member.change_team(&mut team);
    }

    let member_repo = SqliteMemberRepository::new(pool);
    member_repo.save(&member).await?;

    tracing::info!(member_id = %member.id(), "created member");
    Ok((StatusCode::CREATED, Json(MemberResponse::from(&member))))
}

/// Get a member with its team
///
/// GET /api/members/:id
pub async fn get_member(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member_repo = SqliteMemberRepository::new(pool);
    let member = member_repo
        .find_by_id_with_team(id)
        .await?
        .ok_or_else(|| RepositoryError::member_not_found(id))?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Move a member to another team
///
/// PUT /api/members/:id/team
pub async fn change_team(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeTeamRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member_repo = SqliteMemberRepository::new(pool.clone());
    let team_repo = SqliteTeamRepository::new(pool);

    let mut member = member_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| RepositoryError::member_not_found(id))?;
    let mut team = team_repo
        .find_by_id(req.team_id)
        .await?
        .ok_or_else(|| RepositoryError::team_not_found(req.team_id))?;

    member.change_team(&mut team);
    member_repo.save(&member).await?;

    let mut response = MemberResponse::from(&member);
    response.team_name = Some(team.name().to_string());
    Ok(Json(response))
}

/// Unpaged member search
///
/// GET /v1/members
pub async fn search_members_v1(
    State(pool): State<SqlitePool>,
    Query(condition): Query<MemberSearchCondition>,
) -> Result<Json<Vec<MemberTeamDto>>, ApiError> {
    let member_repo = SqliteMemberRepository::new(pool);
    let rows = member_repo.search(&condition).await?;

    Ok(Json(rows))
}

/// Paged member search, counting with the content query
///
/// GET /v2/members
pub async fn search_members_v2(
    State(pool): State<SqlitePool>,
    Query(params): Query<MemberSearchParams>,
) -> Result<Json<PageResponse<MemberTeamDto>>, ApiError> {
    let pageable = params.pageable()?;
    let member_repo = SqliteMemberRepository::new(pool);
    let page = member_repo
        .search_page_simple(&params.condition(), &pageable)
        .await?;

    Ok(Json(PageResponse::from(page)))
}

/// Paged member search, counting only when needed
///
/// GET /v3/members
pub async fn search_members_v3(
    State(pool): State<SqlitePool>,
    Query(params): Query<MemberSearchParams>,
) -> Result<Json<PageResponse<MemberTeamDto>>, ApiError> {
    let pageable = params.pageable()?;
    let member_repo = SqliteMemberRepository::new(pool);
    let page = member_repo
        .search_page_count_optimized(&params.condition(), &pageable)
        .await?;

    Ok(Json(PageResponse::from(page)))
}
