use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::team::Team;

/// Repository trait for Team
///
/// Only the team row is written; membership is persisted through the members'
/// `team_id`.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Save a team (insert or update)
    async fn save(&self, team: &Team) -> RepositoryResult<()>;

    /// Find a team by its ID, with the ids of its members
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Team>>;

    /// Find the first team with the given name
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Team>>;

    /// All teams ordered by name, with their member ids
    async fn find_all(&self) -> RepositoryResult<Vec<Team>>;

    /// Delete a team by ID; its members are left without a team
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}
