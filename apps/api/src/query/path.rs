//! Entity paths: a table alias plus one typed expression per mapped column.

use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::expr::{BinaryOp, Expr, Node, SqlType};
use crate::domain::member::Member;
use crate::domain::team::Team;

/// Column alias prefix for the columns a fetch join adds to the select list
pub(crate) const FETCH_PREFIX: &str = "fetch_";

/// A mapped table seen through an alias
pub trait EntityPath: Clone + Send + Sync {
    type Entity: Send + Unpin;

    const TABLE: &'static str;

    /// Mapped columns, identifier first
    const COLUMNS: &'static [&'static str];

    fn alias(&self) -> &Arc<str>;

    /// Reads one entity starting at `index`, advancing past its columns.
    /// Returns `None` when the identifier is NULL (outer join miss).
    fn decode_entity(
        &self,
        row: &SqliteRow,
        index: &mut usize,
    ) -> Result<Option<Self::Entity>, sqlx::Error>;
}

/// A to-one or to-many relation between two entity paths, joined on a key pair
#[derive(Debug, Clone)]
pub struct Association<E> {
    source: Arc<str>,
    source_column: &'static str,
    target_column: &'static str,
    _target: PhantomData<fn() -> E>,
}

impl<E: EntityPath> Association<E> {
    fn new(source: &Arc<str>, source_column: &'static str, target_column: &'static str) -> Self {
        Self {
            source: Arc::clone(source),
            source_column,
            target_column,
            _target: PhantomData,
        }
    }

    /// Join condition between the association's source and `target`
    pub(crate) fn condition(&self, target: &E) -> Node {
        Node::binary(
            BinaryOp::Eq,
            Node::Column {
                alias: Arc::clone(&self.source),
                name: self.source_column,
            },
            Node::Column {
                alias: Arc::clone(target.alias()),
                name: self.target_column,
            },
        )
    }
}

/// Query type for the `member` table
#[derive(Debug, Clone)]
pub struct QMember {
    alias: Arc<str>,
    pub id: Expr<Uuid>,
    pub username: Expr<String>,
    pub age: Expr<i32>,
    pub team_id: Expr<Uuid>,
}

impl QMember {
    pub fn new(alias: &str) -> Self {
        let alias: Arc<str> = Arc::from(alias);
        Self {
            id: Expr::column(&alias, "member_id"),
            username: Expr::column(&alias, "username"),
            age: Expr::column(&alias, "age"),
            team_id: Expr::column(&alias, "team_id"),
            alias,
        }
    }

    /// The many-to-one `member.team` relation
    pub fn team(&self) -> Association<QTeam> {
        Association::new(&self.alias, "team_id", "team_id")
    }

    /// `COUNT(member.member_id)`
    pub fn count(&self) -> Expr<i64> {
        self.id.count()
    }

    pub fn optional(&self) -> OptionalEntity<Self> {
        OptionalEntity(self.clone())
    }
}

impl Default for QMember {
    fn default() -> Self {
        Self::new("member")
    }
}

impl EntityPath for QMember {
    type Entity = Member;

    const TABLE: &'static str = "member";
    const COLUMNS: &'static [&'static str] = &["member_id", "username", "age", "team_id"];

    fn alias(&self) -> &Arc<str> {
        &self.alias
    }

    fn decode_entity(
        &self,
        row: &SqliteRow,
        index: &mut usize,
    ) -> Result<Option<Member>, sqlx::Error> {
        let start = *index;
        *index += Self::COLUMNS.len();

        let Some(id) = Uuid::decode_nullable(row, start)? else {
            return Ok(None);
        };
        let member = Member::from_persistence(
            id,
            String::decode_nullable(row, start + 1)?,
            i32::decode(row, start + 2)?,
            Uuid::decode_nullable(row, start + 3)?,
        );

        // Only the member's own team counts as loaded; a fetch over an
        // unrelated join must not rewrite the foreign key.
        Ok(Some(match fetched_team(row)? {
            Some(team) if member.team_id() == Some(team.id()) => member.with_loaded_team(team),
            _ => member,
        }))
    }
}

/// Team columns added by `fetch_join` on a `member.team` join, if present
fn fetched_team(row: &SqliteRow) -> Result<Option<Team>, sqlx::Error> {
    let id_column = format!("{}{}_{}", FETCH_PREFIX, QTeam::TABLE, QTeam::COLUMNS[0]);
    let name_column = format!("{}{}_{}", FETCH_PREFIX, QTeam::TABLE, QTeam::COLUMNS[1]);

    match row.try_get::<Option<Uuid>, _>(id_column.as_str()) {
        Ok(Some(id)) => {
            let name: String = row.try_get(name_column.as_str())?;
            Ok(Some(Team::from_persistence(id, name, Vec::new())))
        }
        Ok(None) | Err(sqlx::Error::ColumnNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Query type for the `team` table
#[derive(Debug, Clone)]
pub struct QTeam {
    alias: Arc<str>,
    pub id: Expr<Uuid>,
    pub name: Expr<String>,
}

impl QTeam {
    pub fn new(alias: &str) -> Self {
        let alias: Arc<str> = Arc::from(alias);
        Self {
            id: Expr::column(&alias, "team_id"),
            name: Expr::column(&alias, "name"),
            alias,
        }
    }

    /// The one-to-many `team.members` relation
    pub fn members(&self) -> Association<QMember> {
        Association::new(&self.alias, "team_id", "team_id")
    }

    pub fn count(&self) -> Expr<i64> {
        self.id.count()
    }

    /// Selects the team as `Option<Team>`, for outer joins
    pub fn optional(&self) -> OptionalEntity<Self> {
        OptionalEntity(self.clone())
    }
}

impl Default for QTeam {
    fn default() -> Self {
        Self::new("team")
    }
}

impl EntityPath for QTeam {
    type Entity = Team;

    const TABLE: &'static str = "team";
    const COLUMNS: &'static [&'static str] = &["team_id", "name"];

    fn alias(&self) -> &Arc<str> {
        &self.alias
    }

    fn decode_entity(&self, row: &SqliteRow, index: &mut usize) -> Result<Option<Team>, sqlx::Error> {
        let start = *index;
        *index += Self::COLUMNS.len();

        let Some(id) = Uuid::decode_nullable(row, start)? else {
            return Ok(None);
        };
        let name = String::decode(row, start + 1)?;
        Ok(Some(Team::from_persistence(id, name, Vec::new())))
    }
}

/// An entity selected through an outer join, decoded as `Option<Entity>`
#[derive(Debug, Clone)]
pub struct OptionalEntity<E>(pub(crate) E);
