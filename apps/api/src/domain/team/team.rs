use super::value_objects::TeamName;
use uuid::Uuid;

/// Team entity
///
/// The inverse side of the member/team relation: the member list is never
/// written by the team repository, it mirrors the members whose `team_id`
/// points at this team. It is filled by [`Member::change_team`] while building
/// up a unit of work and by `TeamRepository::find_by_id` when loading. Teams
/// decoded from a join row carry an empty member list.
///
/// # Example
/// ```
/// use roster_api::domain::member::Member;
/// use roster_api::domain::team::Team;
///
/// let mut team = Team::new("teamA").expect("valid team");
/// let member = Member::with_team("member1", 10, &mut team).expect("valid member");
///
/// assert_eq!(member.team_id(), Some(team.id()));
/// assert_eq!(team.members(), &[member.id()]);
/// ```
///
/// [`Member::change_team`]: crate::domain::member::Member::change_team
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    id: Uuid,
    name: TeamName,
    members: Vec<Uuid>,
}

impl Team {
    /// Creates a new team without members
    ///
    /// # Returns
    /// * `Ok(Team)` - New team with a fresh id
    /// * `Err(String)` - If the name is blank or too long
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: TeamName::new(name)?,
            members: Vec::new(),
        })
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), String> {
        self.name = TeamName::new(name)?;
        Ok(())
    }

    /// Records `member_id` in the member list; only called from `Member::change_team`
    pub(crate) fn attach_member(&mut self, member_id: Uuid) {
        if !self.members.contains(&member_id) {
            self.members.push(member_id);
        }
    }

    /// Replaces the member list with ids read from storage
    pub(crate) fn with_members(mut self, members: Vec<Uuid>) -> Self {
        self.members = members;
        self
    }

    pub(crate) fn detach_member(&mut self, member_id: Uuid) {
        self.members.retain(|id| *id != member_id);
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Ids of the members known to belong to this team
    pub fn members(&self) -> &[Uuid] {
        &self.members
    }

    pub fn has_member(&self, member_id: Uuid) -> bool {
        self.members.contains(&member_id)
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Skips validation; only for repository implementations and row decoders.
    pub fn from_persistence(id: Uuid, name: String, members: Vec<Uuid>) -> Self {
        Self {
            id,
            name: TeamName::from_persistence(name),
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_team_with_valid_name() {
        let team = Team::new("teamA").unwrap();

        assert_eq!(team.name(), "teamA");
        assert!(team.members().is_empty());
    }

    #[test]
    fn create_team_with_blank_name_fails() {
        let result = Team::new("  ");

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("blank"));
    }

    #[test]
    fn teams_get_distinct_ids() {
        let a = Team::new("teamA").unwrap();
        let b = Team::new("teamA").unwrap();

        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn rename_validates() {
        let mut team = Team::new("teamA").unwrap();

        assert!(team.rename("").is_err());
        assert_eq!(team.name(), "teamA");

        team.rename("teamZ").unwrap();
        assert_eq!(team.name(), "teamZ");
    }

    #[test]
    fn attach_is_idempotent() {
        let mut team = Team::new("teamA").unwrap();
        let member_id = Uuid::new_v4();

        team.attach_member(member_id);
        team.attach_member(member_id);

        assert_eq!(team.members(), &[member_id]);
        assert!(team.has_member(member_id));

        team.detach_member(member_id);
        assert!(!team.has_member(member_id));
    }

    #[test]
    fn from_persistence_keeps_members() {
        let id = Uuid::new_v4();
        let members = vec![Uuid::new_v4(), Uuid::new_v4()];

        let team = Team::from_persistence(id, "teamB".to_string(), members.clone());

        assert_eq!(team.id(), id);
        assert_eq!(team.name(), "teamB");
        assert_eq!(team.members(), members.as_slice());
    }
}
