use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::member::{Member, MemberSearchCondition, MemberTeamDto};
use crate::domain::page::{Page, Pageable};

/// Repository trait for Member
///
/// Besides plain CRUD it offers the member search: a member left-joined to
/// its team, filtered by the set fields of a [`MemberSearchCondition`].
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Save a member (insert or update), including its `team_id`
    async fn save(&self, member: &Member) -> RepositoryResult<()>;

    /// Find a member by ID; the team is not loaded
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Member>>;

    /// Find a member by ID, loading its team in the same query
    async fn find_by_id_with_team(&self, id: Uuid) -> RepositoryResult<Option<Member>>;

    async fn find_all(&self) -> RepositoryResult<Vec<Member>>;

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Vec<Member>>;

    /// Delete a member by ID
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    /// Unpaged search with one optional predicate per condition field
    async fn search(&self, condition: &MemberSearchCondition) -> RepositoryResult<Vec<MemberTeamDto>>;

    /// Same as [`MemberRepository::search`], accumulating predicates in a builder
    async fn search_by_builder(
        &self,
        condition: &MemberSearchCondition,
    ) -> RepositoryResult<Vec<MemberTeamDto>>;

    /// Paged search; content and count come from the same query
    async fn search_page_simple(
        &self,
        condition: &MemberSearchCondition,
        pageable: &Pageable,
    ) -> RepositoryResult<Page<MemberTeamDto>>;

    /// Paged search with a separately built count query that always runs
    async fn search_page_complex(
        &self,
        condition: &MemberSearchCondition,
        pageable: &Pageable,
    ) -> RepositoryResult<Page<MemberTeamDto>>;

    /// Paged search that only counts when the content does not tell the total
    async fn search_page_count_optimized(
        &self,
        condition: &MemberSearchCondition,
        pageable: &Pageable,
    ) -> RepositoryResult<Page<MemberTeamDto>>;
}
