//! Type-safe query builder over the member/team model
//!
//! Queries are assembled from entity paths ([`QMember`], [`QTeam`]) and typed
//! expressions, rendered to SQLite SQL with bound parameters, and decoded
//! through a [`Projection`] that fixes the Rust result type at compile time.
//!
//! Filters accept `Option<Predicate>`: an absent predicate is skipped, so
//! dynamic search conditions compose without branching on the query itself.
//!
//! # Example
//! ```
//! use roster_api::query::{self, QMember};
//!
//! fn username_eq(m: &QMember, username: Option<&str>) -> Option<query::Predicate> {
//!     username.map(|u| m.username.eq(u))
//! }
//!
//! let m = QMember::new("m");
//! let sql = query::select_from(&m)
//!     .filters([username_eq(&m, None), Some(m.age.loe(30))])
//!     .to_sql();
//! assert!(sql.ends_with("WHERE m.age <= ?"));
//! ```

pub mod error;
pub mod expr;
pub mod order;
pub mod path;
pub mod projection;
mod render;
pub mod select;

pub use error::{QueryError, QueryResult};
pub use expr::{
    case, constant, count_all, exists, Case, CaseBuilder, CaseStart, CaseWhen, Expr, IntoExpr,
    Numeric, Predicate, PredicateBuilder, SqlType, Value,
};
pub use order::{Direction, NullHandling, OrderSpecifier};
pub use path::{Association, EntityPath, OptionalEntity, QMember, QTeam};
pub use projection::{fields, Aliased, Fields, Map, Nullable, Projection, SelectItem};
pub use select::{select, select_from, Query, QueryResults};
