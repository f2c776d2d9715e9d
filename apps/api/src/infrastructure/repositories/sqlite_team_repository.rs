use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::repositories::{RepositoryError, RepositoryResult, TeamRepository};
use crate::domain::team::Team;
use crate::query::{self, QMember, QTeam};

/// SQLite implementation of TeamRepository
pub struct SqliteTeamRepository {
    pool: SqlitePool,
}

impl SqliteTeamRepository {
    /// Creates a new SqliteTeamRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for SQLite
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn member_ids(&self, team_id: Uuid) -> RepositoryResult<Vec<Uuid>> {
        let m = QMember::default();
        let ids = query::select(m.id.clone())
            .from(&m)
            .filter(m.team_id.eq(team_id))
            .order_by(m.username.asc().nulls_last())
            .order_by(m.age.asc())
            .fetch(&self.pool)
            .await?;

        Ok(ids)
    }

    /// Member ids of every team, read in one query
    async fn memberships(&self) -> RepositoryResult<HashMap<Uuid, Vec<Uuid>>> {
        let m = QMember::default();
        let rows = query::select((m.team_id.clone(), m.id.clone()))
            .from(&m)
            .filter(m.team_id.is_not_null())
            .order_by(m.username.asc().nulls_last())
            .order_by(m.age.asc())
            .fetch(&self.pool)
            .await?;

        let mut members: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (team_id, member_id) in rows {
            members.entry(team_id).or_default().push(member_id);
        }
        Ok(members)
    }
}

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    async fn save(&self, team: &Team) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO team (team_id, name)
            VALUES (?, ?)
            ON CONFLICT (team_id) DO UPDATE SET
                name = excluded.name
            "#,
        )
        .bind(team.id())
        .bind(team.name())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Team>> {
        let t = QTeam::default();
        let team = query::select_from(&t)
            .filter(t.id.eq(id))
            .fetch_one(&self.pool)
            .await?;

        match team {
            Some(team) => {
                let members = self.member_ids(id).await?;
                Ok(Some(team.with_members(members)))
            }
            None => Ok(None),
        }
    }

    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Team>> {
        let t = QTeam::default();
        let team = query::select_from(&t)
            .filter(t.name.eq(name))
            .fetch_first(&self.pool)
            .await?;

        match team {
            Some(team) => {
                let members = self.member_ids(team.id()).await?;
                Ok(Some(team.with_members(members)))
            }
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Team>> {
        let t = QTeam::default();
        let teams = query::select_from(&t)
            .order_by(t.name.asc())
            .fetch(&self.pool)
            .await?;

        let mut members = self.memberships().await?;
        let loaded = teams
            .into_iter()
            .map(|team| {
                let ids = members.remove(&team.id()).unwrap_or_default();
                team.with_members(ids)
            })
            .collect();

        Ok(loaded)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query("UPDATE member SET team_id = NULL WHERE team_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM team WHERE team_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::team_not_found(id));
        }

        tx.commit().await?;
        tracing::debug!(team_id = %id, members = detached.rows_affected(), "deleted team");

        Ok(())
    }
}
