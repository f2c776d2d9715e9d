use std::fmt;

use uuid::Uuid;

use crate::domain::team::Team;

/// Member entity
///
/// Owning side of the member/team relation: `team_id` is the persisted
/// foreign key. The team itself is only present when it was loaded together
/// with the member (fetch join); otherwise the member holds just the id.
///
/// # Invariants
/// - Age is not negative
/// - `team_id` and the team's member list are changed together through
///   [`Member::change_team`]
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    id: Uuid,
    username: Option<String>,
    age: i32,
    team_id: Option<Uuid>,
    team: Option<Team>,
}

impl Member {
    /// Creates a member without a team
    ///
    /// # Returns
    /// * `Err(String)` - If the age is negative
    pub fn new(username: impl Into<String>, age: i32) -> Result<Self, String> {
        Self::build(Some(username.into()), age)
    }

    /// Creates a member whose username is not known
    pub fn anonymous(age: i32) -> Result<Self, String> {
        Self::build(None, age)
    }

    /// Creates a member and places it in `team`
    pub fn with_team(username: impl Into<String>, age: i32, team: &mut Team) -> Result<Self, String> {
        let mut member = Self::new(username, age)?;
        member.change_team(team);
        Ok(member)
    }

    fn build(username: Option<String>, age: i32) -> Result<Self, String> {
        if age < 0 {
            return Err(format!("Age cannot be negative: {}", age));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            username,
            age,
            team_id: None,
            team: None,
        })
    }

    /// Moves the member into `team`, updating both sides of the relation
    ///
    /// A previously loaded team is dropped since it no longer matches
    /// `team_id`.
    pub fn change_team(&mut self, team: &mut Team) {
        self.team_id = Some(team.id());
        self.team = None;
        team.attach_member(self.id);
    }

    /// Removes the member from `team`; a no-op for another team
    pub fn leave_team(&mut self, team: &mut Team) {
        if self.team_id == Some(team.id()) {
            self.team_id = None;
            self.team = None;
        }
        team.detach_member(self.id);
    }

    pub fn change_age(&mut self, age: i32) -> Result<(), String> {
        if age < 0 {
            return Err(format!("Age cannot be negative: {}", age));
        }
        self.age = age;
        Ok(())
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn team_id(&self) -> Option<Uuid> {
        self.team_id
    }

    /// The team, when it was loaded with the member
    pub fn team(&self) -> Option<&Team> {
        self.team.as_ref()
    }

    pub fn is_team_loaded(&self) -> bool {
        self.team.is_some()
    }

    /// Reconstructs a Member from persistence layer data
    ///
    /// Skips validation; only for repository implementations and row decoders.
    pub fn from_persistence(
        id: Uuid,
        username: Option<String>,
        age: i32,
        team_id: Option<Uuid>,
    ) -> Self {
        Self {
            id,
            username,
            age,
            team_id,
            team: None,
        }
    }

    /// Attaches the member's team read in the same row; `team_id` is kept
    pub(crate) fn with_loaded_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }
}

// The team is left out: it may not be loaded, and printing it is not needed to
// identify the member.
impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Member(id={}, username={}, age={})",
            self.id,
            self.username.as_deref().unwrap_or("null"),
            self.age
        )
    }
}
