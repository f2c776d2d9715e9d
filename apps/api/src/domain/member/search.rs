use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Optional filters for a member search
///
/// Every unset field leaves the search unrestricted on that dimension. Text
/// fields count as unset when empty or whitespace only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSearchCondition {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "team_name")]
    pub team_name: Option<String>,
    #[serde(default, alias = "age_goe", deserialize_with = "blank_as_none")]
    pub age_goe: Option<i32>,
    #[serde(default, alias = "age_loe", deserialize_with = "blank_as_none")]
    pub age_loe: Option<i32>,
}

impl MemberSearchCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    pub fn age_goe(mut self, age: i32) -> Self {
        self.age_goe = Some(age);
        self
    }

    pub fn age_loe(mut self, age: i32) -> Self {
        self.age_loe = Some(age);
        self
    }

    /// The username filter, if it has text
    pub fn username_filter(&self) -> Option<&str> {
        has_text(self.username.as_deref())
    }

    /// The team name filter, if it has text
    pub fn team_name_filter(&self) -> Option<&str> {
        has_text(self.team_name.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.username_filter().is_none()
            && self.team_name_filter().is_none()
            && self.age_goe.is_none()
            && self.age_loe.is_none()
    }
}

fn has_text(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Reads an optional number that may arrive as text, treating blank text as unset
///
/// Query strings carry every value as text, so `?ageGoe=` yields `None`
/// rather than a parse error.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(value)) => Ok(Some(value)),
        Some(NumberOrText::Text(text)) => match text.trim() {
            "" => Ok(None),
            text => text.parse().map(Some).map_err(de::Error::custom),
        },
    }
}
