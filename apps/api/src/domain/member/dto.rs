use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::{Projection, QMember, QTeam};

/// Username and age of a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberDto {
    pub username: Option<String>,
    pub age: i32,
}

impl MemberDto {
    pub fn new(username: Option<String>, age: i32) -> Self {
        Self { username, age }
    }

    /// Constructor-style projection of a member path
    pub fn projection(m: &QMember) -> impl Projection<Output = MemberDto> {
        (m.username.nullable(), m.age.clone())
            .map(|(username, age)| MemberDto::new(username, age))
    }
}

/// Same data as [`MemberDto`] under different field names
///
/// Its fields do not match the member columns, so projections into it need
/// aliases (`username AS name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDto {
    pub name: Option<String>,
    pub age: i32,
}

/// One row of a member search: the member plus its team, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTeamDto {
    pub member_id: Uuid,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<Uuid>,
    pub team_name: Option<String>,
}

impl MemberTeamDto {
    /// Projection over a member left-joined to its team
    pub fn projection(m: &QMember, t: &QTeam) -> impl Projection<Output = MemberTeamDto> {
        (
            m.id.clone(),
            m.username.nullable(),
            m.age.clone(),
            t.id.nullable(),
            t.name.nullable(),
        )
            .map(|(member_id, username, age, team_id, team_name)| MemberTeamDto {
                member_id,
                username,
                age,
                team_id,
                team_name,
            })
    }
}
