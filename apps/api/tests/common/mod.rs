//! Shared setup for integration tests: a migrated in-memory database and the
//! two-team, four-member fixture most tests start from.

#![allow(dead_code)]

use roster_api::domain::member::Member;
use roster_api::domain::repositories::{MemberRepository, TeamRepository};
use roster_api::domain::team::Team;
use roster_api::infrastructure::database;
use roster_api::infrastructure::repositories::{SqliteMemberRepository, SqliteTeamRepository};
use sqlx::SqlitePool;

/// Fresh, migrated in-memory database
pub async fn setup_test_db() -> SqlitePool {
    let pool = database::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    database::migrate(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// teamA with member1 (10) and member2 (20), teamB with member3 (30) and member4 (40)
pub struct Fixture {
    pub pool: SqlitePool,
    pub team_a: Team,
    pub team_b: Team,
    pub members: Vec<Member>,
}

pub async fn setup_fixture() -> Fixture {
    let pool = setup_test_db().await;

    let mut team_a = Team::new("teamA").expect("valid team");
    let mut team_b = Team::new("teamB").expect("valid team");
    let members = vec![
        Member::with_team("member1", 10, &mut team_a).expect("valid member"),
        Member::with_team("member2", 20, &mut team_a).expect("valid member"),
        Member::with_team("member3", 30, &mut team_b).expect("valid member"),
        Member::with_team("member4", 40, &mut team_b).expect("valid member"),
    ];

    save_team(&pool, &team_a).await;
    save_team(&pool, &team_b).await;
    for member in &members {
        save_member(&pool, member).await;
    }

    Fixture {
        pool,
        team_a,
        team_b,
        members,
    }
}

pub async fn save_team(pool: &SqlitePool, team: &Team) {
    SqliteTeamRepository::new(pool.clone())
        .save(team)
        .await
        .expect("Failed to save team");
}

pub async fn save_member(pool: &SqlitePool, member: &Member) {
    SqliteMemberRepository::new(pool.clone())
        .save(member)
        .await
        .expect("Failed to save member");
}
