use std::str::FromStr;

use super::expr::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    /// Case-insensitive `asc` / `desc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Direction::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Direction::Desc)
        } else {
            Err(format!("Invalid sort direction: {}", s))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullHandling {
    NullsFirst,
    NullsLast,
}

/// One `ORDER BY` term
#[derive(Debug, Clone)]
pub struct OrderSpecifier {
    pub(crate) node: Node,
    pub(crate) direction: Direction,
    pub(crate) nulls: Option<NullHandling>,
}

impl OrderSpecifier {
    pub(crate) fn new(node: Node, direction: Direction) -> Self {
        Self {
            node,
            direction,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullHandling::NullsFirst);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullHandling::NullsLast);
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}
