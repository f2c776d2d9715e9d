use sqlx::SqlitePool;

use crate::domain::member::Member;
use crate::domain::repositories::{MemberRepository, RepositoryError, TeamRepository};
use crate::domain::team::Team;
use crate::infrastructure::repositories::{SqliteMemberRepository, SqliteTeamRepository};

/// Number of sample members inserted by [`seed_sample_data`]
pub const SAMPLE_MEMBER_COUNT: i32 = 100;

/// Inserts `teamA`, `teamB` and `member0..member99` unless members already exist
///
/// Member `i` is `i` years old and belongs to `teamA` for even `i`, `teamB`
/// otherwise.
///
/// # Returns
/// * `Ok(true)` - If the sample data was inserted
/// * `Ok(false)` - If the database already had members
pub async fn seed_sample_data(pool: &SqlitePool) -> Result<bool, RepositoryError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM member")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::info!(existing, "members present, skipping sample data");
        return Ok(false);
    }

    let team_repo = SqliteTeamRepository::new(pool.clone());
    let member_repo = SqliteMemberRepository::new(pool.clone());

    let mut team_a = Team::new("teamA").map_err(RepositoryError::InvalidData)?;
    let mut team_b = Team::new("teamB").map_err(RepositoryError::InvalidData)?;
    team_repo.save(&team_a).await?;
    team_repo.save(&team_b).await?;

    for i in 0..SAMPLE_MEMBER_COUNT {
        let team = if i % 2 == 0 { &mut team_a } else { &mut team_b };
        let member = Member::with_team(format!("member{}", i), i, team)
            .map_err(RepositoryError::InvalidData)?;
        member_repo.save(&member).await?;
    }

    tracing::info!(
        teams = 2,
        members = SAMPLE_MEMBER_COUNT,
        "inserted sample data"
    );
    Ok(true)
}
