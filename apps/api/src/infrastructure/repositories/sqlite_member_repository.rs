use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::member::{Member, MemberSearchCondition, MemberTeamDto};
use crate::domain::page::{Page, Pageable, Sort};
use crate::domain::repositories::{MemberRepository, RepositoryError, RepositoryResult};
use crate::query::{
    self, Direction, Expr, OrderSpecifier, Predicate, PredicateBuilder, Projection, QMember,
    QTeam, Query, SqlType,
};

/// SQLite implementation of MemberRepository
///
/// Reads go through the query builder; writes are plain statements.
pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    /// Creates a new SqliteMemberRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for SQLite
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn username_eq(m: &QMember, username: Option<&str>) -> Option<Predicate> {
    username.map(|username| m.username.eq(username))
}

fn team_name_eq(t: &QTeam, team_name: Option<&str>) -> Option<Predicate> {
    team_name.map(|team_name| t.name.eq(team_name))
}

fn age_goe(m: &QMember, age: Option<i32>) -> Option<Predicate> {
    age.map(|age| m.age.goe(age))
}

fn age_loe(m: &QMember, age: Option<i32>) -> Option<Predicate> {
    age.map(|age| m.age.loe(age))
}

fn search_predicates(
    m: &QMember,
    t: &QTeam,
    condition: &MemberSearchCondition,
) -> [Option<Predicate>; 4] {
    [
        username_eq(m, condition.username_filter()),
        team_name_eq(t, condition.team_name_filter()),
        age_goe(m, condition.age_goe),
        age_loe(m, condition.age_loe),
    ]
}

/// Member left-joined to its team, filtered by the condition, unordered and unpaged
fn search_query(
    m: &QMember,
    t: &QTeam,
    condition: &MemberSearchCondition,
) -> Query<impl Projection<Output = MemberTeamDto>> {
    query::select(MemberTeamDto::projection(m, t))
        .from(m)
        .left_join(m.team(), t)
        .filters(search_predicates(m, t, condition))
}

fn ordered<T: SqlType>(expr: &Expr<T>, direction: Direction) -> OrderSpecifier {
    match direction {
        Direction::Asc => expr.asc(),
        Direction::Desc => expr.desc(),
    }
}

/// Maps the requested sort onto the search columns
///
/// Unsorted requests are ordered by username (nulls last) then age so that
/// pages do not overlap.
fn search_order(m: &QMember, t: &QTeam, sort: &Sort) -> RepositoryResult<Vec<OrderSpecifier>> {
    if !sort.is_sorted() {
        return Ok(vec![m.username.asc().nulls_last(), m.age.asc()]);
    }

    sort.orders()
        .iter()
        .map(|order| match order.property() {
            "username" => Ok(ordered(&m.username, order.direction()).nulls_last()),
            "age" => Ok(ordered(&m.age, order.direction())),
            "teamName" => Ok(ordered(&t.name, order.direction()).nulls_last()),
            other => Err(RepositoryError::InvalidSort(other.to_string())),
        })
        .collect()
}

fn paged<P>(query: Query<P>, m: &QMember, t: &QTeam, pageable: &Pageable) -> RepositoryResult<Query<P>> {
    Ok(query
        .order_by_all(search_order(m, t, pageable.sort())?)
        .offset(pageable.offset())
        .limit(u64::from(pageable.page_size())))
}

fn to_total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn save(&self, member: &Member) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO member (member_id, username, age, team_id)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (member_id) DO UPDATE SET
                username = excluded.username,
                age = excluded.age,
                team_id = excluded.team_id
            "#,
        )
        .bind(member.id())
        .bind(member.username())
        .bind(member.age())
        .bind(member.team_id())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Member>> {
        let m = QMember::default();
        let member = query::select_from(&m)
            .filter(m.id.eq(id))
            .fetch_one(&self.pool)
            .await?;

        Ok(member)
    }

    async fn find_by_id_with_team(&self, id: Uuid) -> RepositoryResult<Option<Member>> {
        let m = QMember::default();
        let t = QTeam::default();
        let member = query::select_from(&m)
            .left_join(m.team(), &t)
            .fetch_join()
            .filter(m.id.eq(id))
            .fetch_one(&self.pool)
            .await?;

        Ok(member)
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Member>> {
        let m = QMember::default();
        let members = query::select_from(&m)
            .order_by(m.username.asc().nulls_last())
            .order_by(m.age.asc())
            .fetch(&self.pool)
            .await?;

        Ok(members)
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Vec<Member>> {
        let m = QMember::default();
        let members = query::select_from(&m)
            .filter(m.username.eq(username))
            .order_by(m.age.asc())
            .fetch(&self.pool)
            .await?;

        Ok(members)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM member WHERE member_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::member_not_found(id));
        }

        Ok(())
    }

    async fn search(&self, condition: &MemberSearchCondition) -> RepositoryResult<Vec<MemberTeamDto>> {
        tracing::debug!(?condition, "searching members");
        let m = QMember::default();
        let t = QTeam::default();

        let rows = search_query(&m, &t, condition)
            .order_by_all(search_order(&m, &t, &Sort::unsorted())?)
            .fetch(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn search_by_builder(
        &self,
        condition: &MemberSearchCondition,
    ) -> RepositoryResult<Vec<MemberTeamDto>> {
        let m = QMember::default();
        let t = QTeam::default();

        let mut builder = PredicateBuilder::new();
        if let Some(username) = condition.username_filter() {
            builder.and(m.username.eq(username));
        }
        if let Some(team_name) = condition.team_name_filter() {
            builder.and(t.name.eq(team_name));
        }
        if let Some(age) = condition.age_goe {
            builder.and(m.age.goe(age));
        }
        if let Some(age) = condition.age_loe {
            builder.and(m.age.loe(age));
        }

        let rows = query::select(MemberTeamDto::projection(&m, &t))
            .from(&m)
            .left_join(m.team(), &t)
            .filter(builder.build())
            .order_by_all(search_order(&m, &t, &Sort::unsorted())?)
            .fetch(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn search_page_simple(
        &self,
        condition: &MemberSearchCondition,
        pageable: &Pageable,
    ) -> RepositoryResult<Page<MemberTeamDto>> {
        let m = QMember::default();
        let t = QTeam::default();

        let results = paged(search_query(&m, &t, condition), &m, &t, pageable)?
            .fetch_results(&self.pool)
            .await?;

        Ok(Page::new(results.results, pageable.clone(), to_total(results.total)))
    }

    async fn search_page_complex(
        &self,
        condition: &MemberSearchCondition,
        pageable: &Pageable,
    ) -> RepositoryResult<Page<MemberTeamDto>> {
        let m = QMember::default();
        let t = QTeam::default();

        let content = paged(search_query(&m, &t, condition), &m, &t, pageable)?
            .fetch(&self.pool)
            .await?;

        let total = query::select(m.count())
            .from(&m)
            .left_join(m.team(), &t)
            .filters(search_predicates(&m, &t, condition))
            .fetch_single(&self.pool)
            .await?;

        Ok(Page::new(content, pageable.clone(), to_total(total)))
    }

    async fn search_page_count_optimized(
        &self,
        condition: &MemberSearchCondition,
        pageable: &Pageable,
    ) -> RepositoryResult<Page<MemberTeamDto>> {
        let m = QMember::default();
        let t = QTeam::default();

        let content = paged(search_query(&m, &t, condition), &m, &t, pageable)?
            .fetch(&self.pool)
            .await?;

        let count_query = search_query(&m, &t, condition);
        let pool = &self.pool;
        Page::with_count_query(content, pageable.clone(), || async move {
            tracing::debug!("page total not known from content, counting");
            let total = count_query.fetch_count(pool).await?;
            Ok::<_, RepositoryError>(to_total(total))
        })
        .await
    }
}
