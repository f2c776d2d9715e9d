use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a team name, in characters
pub const MAX_TEAM_NAME_LEN: usize = 100;

/// Team name value object
///
/// # Invariants
/// - Not blank
/// - Surrounding whitespace is trimmed
/// - At most [`MAX_TEAM_NAME_LEN`] characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamName(String);

impl TeamName {
    /// Creates a new TeamName value object
    ///
    /// # Example
    /// ```
    /// use roster_api::domain::team::value_objects::TeamName;
    ///
    /// let name = TeamName::new("  teamA ").expect("valid name");
    /// assert_eq!(name.as_str(), "teamA");
    /// assert!(TeamName::new("   ").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err("Team name cannot be blank".to_string());
        }

        if trimmed.chars().count() > MAX_TEAM_NAME_LEN {
            return Err(format!(
                "Team name cannot exceed {} characters",
                MAX_TEAM_NAME_LEN
            ));
        }

        Ok(TeamName(trimmed.to_string()))
    }

    /// Wraps a name read back from the database without re-validating it
    pub(crate) fn from_persistence(name: String) -> Self {
        TeamName(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_name() {
        assert!(TeamName::new("teamA").is_ok());
    }

    #[test]
    fn name_is_trimmed() {
        let name = TeamName::new("  teamB\t").unwrap();
        assert_eq!(name.as_str(), "teamB");
    }

    #[test]
    fn empty_name_fails() {
        assert!(TeamName::new("").is_err());
    }

    #[test]
    fn whitespace_name_fails() {
        let err = TeamName::new(" \n ").unwrap_err();
        assert!(err.contains("blank"));
    }

    #[test]
    fn name_at_max_length() {
        assert!(TeamName::new("a".repeat(MAX_TEAM_NAME_LEN)).is_ok());
    }

    #[test]
    fn name_too_long_fails() {
        assert!(TeamName::new("a".repeat(MAX_TEAM_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn name_display() {
        let name = TeamName::new("teamA").unwrap();
        assert_eq!(format!("{}", name), "teamA");
    }
}
