use std::sync::Arc;

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::error::{QueryError, QueryResult};
use super::expr::{Expr, Node, Predicate};
use super::order::OrderSpecifier;
use super::path::{Association, EntityPath, FETCH_PREFIX};
use super::projection::{Projection, SelectItem};
use super::render;

#[derive(Debug, Clone)]
pub(crate) struct Source {
    pub(crate) table: &'static str,
    pub(crate) alias: Arc<str>,
}

impl Source {
    fn of<E: EntityPath>(entity: &E) -> Self {
        Self {
            table: E::TABLE,
            alias: Arc::clone(entity.alias()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone)]
pub(crate) struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) target: Source,
    pub(crate) conditions: Vec<Node>,
    pub(crate) columns: &'static [&'static str],
    pub(crate) fetch: bool,
}

/// Untyped select statement shared by top-level queries and subqueries
#[derive(Debug, Clone, Default)]
pub(crate) struct SelectClauses {
    pub(crate) items: Vec<SelectItem>,
    pub(crate) distinct: bool,
    pub(crate) sources: Vec<Source>,
    pub(crate) joins: Vec<Join>,
    pub(crate) filters: Vec<Node>,
    pub(crate) group_by: Vec<Node>,
    pub(crate) having: Vec<Node>,
    pub(crate) order_by: Vec<OrderSpecifier>,
    pub(crate) offset: Option<u64>,
    pub(crate) limit: Option<u64>,
}

impl SelectClauses {
    /// Select list including the columns of fetch-joined entities
    pub(crate) fn rendered_items(&self) -> Vec<SelectItem> {
        let mut items = self.items.clone();
        for join in self.joins.iter().filter(|join| join.fetch) {
            items.extend(join.columns.iter().copied().map(|column| {
                SelectItem::new(
                    Node::Column {
                        alias: Arc::clone(&join.target.alias),
                        name: column,
                    },
                    Some(format!("{}{}_{}", FETCH_PREFIX, join.target.table, column)),
                )
            }));
        }
        items
    }

    /// Same rows without ordering and paging, for counting
    fn unpaged(&self) -> SelectClauses {
        SelectClauses {
            order_by: Vec::new(),
            offset: None,
            limit: None,
            ..self.clone()
        }
    }
}

/// A select query whose rows are decoded through the projection `P`
///
/// # Example
/// ```
/// use roster_api::query::{self, QMember, QTeam};
///
/// let m = QMember::new("m");
/// let t = QTeam::new("t");
/// let sql = query::select((m.username.clone(), t.name.clone()))
///     .from(&m)
///     .join(m.team(), &t)
///     .filter(m.age.goe(20))
///     .order_by(m.username.asc())
///     .to_sql();
///
/// assert_eq!(
///     sql,
///     "SELECT m.username, t.name FROM member m \
///      INNER JOIN team t ON m.team_id = t.team_id \
///      WHERE m.age >= ? ORDER BY m.username ASC"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Query<P> {
    projection: P,
    clauses: SelectClauses,
}

/// Starts a query selecting `projection`
pub fn select<P: Projection>(projection: P) -> Query<P> {
    let mut items = Vec::new();
    projection.select_items(&mut items);
    Query {
        projection,
        clauses: SelectClauses {
            items,
            ..SelectClauses::default()
        },
    }
}

/// `select(entity).from(entity)`
pub fn select_from<E>(entity: &E) -> Query<E>
where
    E: EntityPath + Projection,
{
    select(entity.clone()).from(entity)
}

impl<P> Query<P> {
    pub(crate) fn into_clauses(self) -> SelectClauses {
        self.clauses
    }

    /// Adds a source to `FROM`; several sources form a cross (theta) join
    pub fn from<E: EntityPath>(mut self, entity: &E) -> Self {
        self.clauses.sources.push(Source::of(entity));
        self
    }

    /// Inner join along an association, e.g. `join(member.team(), &team)`
    pub fn join<E: EntityPath>(self, association: Association<E>, target: &E) -> Self {
        let condition = association.condition(target);
        self.push_join(JoinKind::Inner, target, vec![condition])
    }

    /// Left outer join along an association
    pub fn left_join<E: EntityPath>(self, association: Association<E>, target: &E) -> Self {
        let condition = association.condition(target);
        self.push_join(JoinKind::Left, target, vec![condition])
    }

    /// Inner join of an unrelated entity; the condition comes from [`Query::on`]
    pub fn join_entity<E: EntityPath>(self, target: &E) -> Self {
        self.push_join(JoinKind::Inner, target, Vec::new())
    }

    /// Left outer join of an unrelated entity; the condition comes from [`Query::on`]
    pub fn left_join_entity<E: EntityPath>(self, target: &E) -> Self {
        self.push_join(JoinKind::Left, target, Vec::new())
    }

    /// Adds a condition to the most recent join; ignored before any join
    pub fn on(mut self, predicate: Predicate) -> Self {
        if let Some(join) = self.clauses.joins.last_mut() {
            join.conditions.push(predicate.node);
        }
        self
    }

    /// Loads the most recently joined entity together with the selected one
    pub fn fetch_join(mut self) -> Self {
        if let Some(join) = self.clauses.joins.last_mut() {
            join.fetch = true;
        }
        self
    }

    fn push_join<E: EntityPath>(mut self, kind: JoinKind, target: &E, conditions: Vec<Node>) -> Self {
        self.clauses.joins.push(Join {
            kind,
            target: Source::of(target),
            conditions,
            columns: E::COLUMNS,
            fetch: false,
        });
        self
    }

    /// Adds a `WHERE` condition; `None` leaves the query unfiltered
    pub fn filter(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        if let Some(predicate) = predicate.into() {
            self.clauses.filters.push(predicate.node);
        }
        self
    }

    /// Adds every present condition, joined with `AND`
    pub fn filters<I, F>(self, predicates: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Option<Predicate>>,
    {
        predicates
            .into_iter()
            .fold(self, |query, predicate| query.filter(predicate))
    }

    pub fn group_by<T>(mut self, expr: &Expr<T>) -> Self {
        self.clauses.group_by.push(expr.node.clone());
        self
    }

    pub fn having(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        if let Some(predicate) = predicate.into() {
            self.clauses.having.push(predicate.node);
        }
        self
    }

    pub fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.clauses.order_by.push(order);
        self
    }

    pub fn order_by_all(mut self, orders: impl IntoIterator<Item = OrderSpecifier>) -> Self {
        self.clauses.order_by.extend(orders);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.clauses.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.clauses.limit = Some(limit);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.clauses.distinct = true;
        self
    }

    /// Rendered SQL with `?` placeholders
    pub fn to_sql(&self) -> String {
        let mut builder = QueryBuilder::<Sqlite>::new("");
        render::push_select(&mut builder, &self.clauses);
        builder.sql().to_string()
    }

    /// Counts the rows of this query, ignoring ordering, offset and limit
    pub async fn fetch_count(&self, pool: &SqlitePool) -> QueryResult<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM (");
        render::push_select(&mut builder, &self.clauses.unpaged());
        builder.push(") AS counted");

        tracing::debug!(sql = builder.sql(), "executing count query");
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

impl<P: Projection> Query<P> {
    async fn fetch_rows(&self, pool: &SqlitePool) -> QueryResult<Vec<SqliteRow>> {
        let mut builder = QueryBuilder::<Sqlite>::new("");
        render::push_select(&mut builder, &self.clauses);

        tracing::debug!(sql = builder.sql(), "executing query");
        Ok(builder.build().fetch_all(pool).await?)
    }

    fn decode(&self, row: &SqliteRow) -> QueryResult<P::Output> {
        let mut index = 0;
        Ok(self.projection.decode(row, &mut index)?)
    }

    /// All rows
    pub async fn fetch(&self, pool: &SqlitePool) -> QueryResult<Vec<P::Output>> {
        self.fetch_rows(pool)
            .await?
            .iter()
            .map(|row| self.decode(row))
            .collect()
    }

    /// At most one row: no row is `None`, more than one is
    /// [`QueryError::NonUniqueResult`]
    pub async fn fetch_one(&self, pool: &SqlitePool) -> QueryResult<Option<P::Output>> {
        let rows = self.fetch_rows(pool).await?;
        match rows.as_slice() {
            [] => Ok(None),
            [row] => self.decode(row).map(Some),
            _ => Err(QueryError::NonUniqueResult(rows.len())),
        }
    }

    /// Exactly one row; no row is [`QueryError::NoResult`]
    pub async fn fetch_single(&self, pool: &SqlitePool) -> QueryResult<P::Output> {
        self.fetch_one(pool).await?.ok_or(QueryError::NoResult)
    }

    /// The first row, applying `LIMIT 1`
    pub async fn fetch_first(self, pool: &SqlitePool) -> QueryResult<Option<P::Output>> {
        let query = self.limit(1);
        let rows = query.fetch_rows(pool).await?;
        rows.first().map(|row| query.decode(row)).transpose()
    }

    /// Content and total count in one call
    ///
    /// Runs the count query first and skips the content query when nothing
    /// matches.
    pub async fn fetch_results(&self, pool: &SqlitePool) -> QueryResult<QueryResults<P::Output>> {
        let total = self.fetch_count(pool).await?;
        let results = if total > 0 {
            self.fetch(pool).await?
        } else {
            Vec::new()
        };

        Ok(QueryResults {
            results,
            total,
            offset: self.clauses.offset,
            limit: self.clauses.limit,
        })
    }
}

/// Result rows plus the total count of the unpaged query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults<T> {
    pub results: Vec<T>,
    pub total: i64,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl<T> QueryResults<T> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{case, constant, QMember, QTeam};

    #[test]
    fn select_from_lists_entity_columns() {
        let m = QMember::new("m");
        assert_eq!(
            select_from(&m).to_sql(),
            "SELECT m.member_id, m.username, m.age, m.team_id FROM member m"
        );
    }

    #[test]
    fn absent_filters_are_not_rendered() {
        let m = QMember::new("m");
        let sql = select(m.username.clone())
            .from(&m)
            .filters([None, Some(m.age.goe(10)), None])
            .to_sql();

        assert_eq!(sql, "SELECT m.username FROM member m WHERE m.age >= ?");
    }

    #[test]
    fn all_filters_absent_renders_no_where_clause() {
        let m = QMember::new("m");
        let sql = select(m.username.clone())
            .from(&m)
            .filters([None::<Predicate>, None])
            .to_sql();

        assert_eq!(sql, "SELECT m.username FROM member m");
    }

    #[test]
    fn or_is_parenthesized_inside_conjunction() {
        let m = QMember::new("m");
        let sql = select(m.username.clone())
            .from(&m)
            .filter(m.age.eq(10).or(m.age.eq(20)))
            .filter(m.username.is_not_null())
            .to_sql();

        assert_eq!(
            sql,
            "SELECT m.username FROM member m WHERE (m.age = ? OR m.age = ?) AND m.username IS NOT NULL"
        );
    }

    #[test]
    fn left_join_with_extra_on_condition() {
        let m = QMember::new("m");
        let t = QTeam::new("t");
        let sql = select((m.username.clone(), t.name.nullable()))
            .from(&m)
            .left_join(m.team(), &t)
            .on(t.name.eq("teamA"))
            .to_sql();

        assert_eq!(
            sql,
            "SELECT m.username, t.name FROM member m \
             LEFT JOIN team t ON m.team_id = t.team_id AND t.name = ?"
        );
    }

    #[test]
    fn fetch_join_appends_target_columns() {
        let m = QMember::new("m");
        let t = QTeam::new("t");
        let sql = select_from(&m).join(m.team(), &t).fetch_join().to_sql();

        assert_eq!(
            sql,
            "SELECT m.member_id, m.username, m.age, m.team_id, \
             t.team_id AS fetch_team_team_id, t.name AS fetch_team_name \
             FROM member m INNER JOIN team t ON m.team_id = t.team_id"
        );
    }

    #[test]
    fn theta_join_lists_sources() {
        let m = QMember::new("m");
        let t = QTeam::new("t");
        let sql = select_from(&m)
            .from(&t)
            .filter(m.username.eq(&t.name))
            .to_sql();

        assert!(sql.ends_with("FROM member m, team t WHERE m.username = t.name"));
    }

    #[test]
    fn scalar_subquery_in_where() {
        let m = QMember::new("m");
        let sub = QMember::new("ms");
        let sql = select_from(&m)
            .filter(m.age.eq(select(sub.age.max()).from(&sub)))
            .to_sql();

        assert!(sql.ends_with("WHERE m.age = (SELECT MAX(ms.age) FROM member ms)"));
    }

    #[test]
    fn in_subquery() {
        let m = QMember::new("m");
        let sub = QMember::new("ms");
        let sql = select(m.age.clone())
            .from(&m)
            .filter(m.age.in_query(select(sub.age.clone()).from(&sub).filter(sub.age.gt(10))))
            .to_sql();

        assert_eq!(
            sql,
            "SELECT m.age FROM member m WHERE m.age IN (SELECT ms.age FROM member ms WHERE ms.age > ?)"
        );
    }

    #[test]
    fn group_by_having_order_and_paging() {
        let m = QMember::new("m");
        let t = QTeam::new("t");
        let sql = select((t.name.clone(), m.age.avg()))
            .from(&m)
            .join(m.team(), &t)
            .group_by(&t.name)
            .having(m.age.avg().gt(10.0))
            .order_by(t.name.asc())
            .offset(1)
            .limit(2)
            .to_sql();

        assert_eq!(
            sql,
            "SELECT t.name, AVG(m.age) FROM member m INNER JOIN team t ON m.team_id = t.team_id \
             GROUP BY t.name HAVING AVG(m.age) > ? ORDER BY t.name ASC LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn offset_without_limit_is_valid_sqlite() {
        let m = QMember::new("m");
        let sql = select(m.age.clone()).from(&m).offset(3).to_sql();
        assert_eq!(sql, "SELECT m.age FROM member m LIMIT -1 OFFSET ?");
    }

    #[test]
    fn nulls_last_ordering() {
        let m = QMember::new("m");
        let sql = select_from(&m)
            .order_by(m.age.desc())
            .order_by(m.username.asc().nulls_last())
            .to_sql();

        assert!(sql.ends_with("ORDER BY m.age DESC, m.username ASC NULLS LAST"));
    }

    #[test]
    fn case_expressions() {
        let m = QMember::new("m");
        let simple = m.age.when(10).then("ten").when(20).then("twenty").otherwise("other");
        let searched = case()
            .when(m.age.between(0, 20))
            .then("0-20")
            .otherwise("other");

        let sql = select((simple, searched)).from(&m).to_sql();
        assert_eq!(
            sql,
            "SELECT CASE m.age WHEN ? THEN ? WHEN ? THEN ? ELSE ? END, \
             CASE WHEN m.age BETWEEN ? AND ? THEN ? ELSE ? END FROM member m"
        );
    }

    #[test]
    fn concat_and_string_value() {
        let m = QMember::new("m");
        let sql = select(m.username.concat("_").concat(m.age.string_value()))
            .from(&m)
            .to_sql();

        assert_eq!(
            sql,
            "SELECT ((m.username || ?) || CAST(m.age AS TEXT)) FROM member m"
        );
    }

    #[test]
    fn constant_and_distinct() {
        let m = QMember::new("m");
        let sql = select((m.username.clone(), constant("A".to_string())))
            .from(&m)
            .distinct()
            .to_sql();

        assert_eq!(sql, "SELECT DISTINCT m.username, ? FROM member m");
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let m = QMember::new("m");
        let sql = select(m.age.clone())
            .from(&m)
            .filter(m.age.in_(Vec::<i32>::new()))
            .to_sql();

        assert_eq!(sql, "SELECT m.age FROM member m WHERE 1 = 0");
    }

    #[test]
    fn on_without_join_is_ignored() {
        let m = QMember::new("m");

        let sql = select_from(&m).on(m.age.eq(1)).to_sql();

        assert_eq!(sql, select_from(&m).to_sql());
        assert!(!sql.contains("WHERE"));
    }
}
