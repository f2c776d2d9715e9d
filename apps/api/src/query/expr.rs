use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::error::UnexpectedNullError;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, ValueRef};
use uuid::Uuid;

use super::order::{Direction, OrderSpecifier};
use super::projection::{Aliased, Nullable};
use super::select::{Query, SelectClauses};

/// A value bound as a query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    Uuid(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Like,
    Concat,
    Add,
    Subtract,
    Multiply,
}

impl BinaryOp {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            BinaryOp::Eq => " = ",
            BinaryOp::Ne => " <> ",
            BinaryOp::Lt => " < ",
            BinaryOp::Le => " <= ",
            BinaryOp::Gt => " > ",
            BinaryOp::Ge => " >= ",
            BinaryOp::And => " AND ",
            BinaryOp::Or => " OR ",
            BinaryOp::Like => " LIKE ",
            BinaryOp::Concat => " || ",
            BinaryOp::Add => " + ",
            BinaryOp::Subtract => " - ",
            BinaryOp::Multiply => " * ",
        }
    }
}

/// Untyped expression tree, rendered by `render`
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Column {
        alias: Arc<str>,
        name: &'static str,
    },
    Param(Value),
    Wildcard,
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Not(Box<Node>),
    IsNull {
        expr: Box<Node>,
        negated: bool,
    },
    Between {
        expr: Box<Node>,
        low: Box<Node>,
        high: Box<Node>,
    },
    InList {
        expr: Box<Node>,
        items: Vec<Node>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Node>,
        query: Box<SelectClauses>,
        negated: bool,
    },
    Exists(Box<SelectClauses>),
    Subquery(Box<SelectClauses>),
    Function {
        name: &'static str,
        distinct: bool,
        args: Vec<Node>,
    },
    Cast {
        expr: Box<Node>,
        ty: &'static str,
    },
    Case {
        operand: Option<Box<Node>>,
        branches: Vec<(Node, Node)>,
        otherwise: Option<Box<Node>>,
    },
}

impl Node {
    pub(crate) fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Self {
        Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn function(name: &'static str, arg: Node) -> Self {
        Node::Function {
            name,
            distinct: false,
            args: vec![arg],
        }
    }

    /// Column name when this node is a plain column reference
    pub(crate) fn column_name(&self) -> Option<&'static str> {
        match self {
            Node::Column { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Rust types that can be bound as parameters and read back from rows
pub trait SqlType: Sized + Send + Sync + Unpin + 'static {
    fn into_value(self) -> Value;

    fn decode(row: &SqliteRow, index: usize) -> Result<Self, sqlx::Error>;

    fn decode_nullable(row: &SqliteRow, index: usize) -> Result<Option<Self>, sqlx::Error>;
}

/// SQLite hands back NULL as the type's zero value, so non-optional reads
/// check for it first
fn reject_null(row: &SqliteRow, index: usize) -> Result<(), sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Err(sqlx::Error::ColumnDecode {
            index: format!("{:?}", index),
            source: Box::new(UnexpectedNullError),
        });
    }
    Ok(())
}

macro_rules! sql_type {
    ($ty:ty, $variant:ident, $convert:expr) => {
        impl SqlType for $ty {
            fn into_value(self) -> Value {
                Value::$variant($convert(self))
            }

            fn decode(row: &SqliteRow, index: usize) -> Result<Self, sqlx::Error> {
                reject_null(row, index)?;
                row.try_get(index)
            }

            fn decode_nullable(row: &SqliteRow, index: usize) -> Result<Option<Self>, sqlx::Error> {
                row.try_get(index)
            }
        }
    };
}

sql_type!(bool, Bool, |v| v);
sql_type!(i32, Int, i64::from);
sql_type!(i64, Int, |v| v);
sql_type!(f64, Real, |v| v);
sql_type!(String, Text, |v| v);
sql_type!(Uuid, Uuid, |v| v);

/// Numeric column types, with the type their `SUM` produces
pub trait Numeric: SqlType + PartialOrd {
    type Sum: SqlType;
}

impl Numeric for i32 {
    type Sum = i64;
}

impl Numeric for i64 {
    type Sum = i64;
}

impl Numeric for f64 {
    type Sum = f64;
}

/// A typed SQL expression
///
/// `T` is the Rust type the expression evaluates to. Operations are only
/// available where they make sense for `T`, so `member.age.eq("x")` or
/// `member.username.sum()` do not compile.
///
/// # Example
/// ```
/// use roster_api::query::QMember;
///
/// let m = QMember::new("m");
/// let adults = m.age.goe(20).and(m.username.is_not_null());
/// # let _ = adults;
/// ```
pub struct Expr<T> {
    pub(crate) node: Node,
    _type: PhantomData<fn() -> T>,
}

/// A boolean expression used in `WHERE`, `ON` and `HAVING`
pub type Predicate = Expr<bool>;

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.node).finish()
    }
}

impl<T> Expr<T> {
    pub(crate) fn from_node(node: Node) -> Self {
        Self {
            node,
            _type: PhantomData,
        }
    }

    pub(crate) fn column(alias: &Arc<str>, name: &'static str) -> Self {
        Self::from_node(Node::Column {
            alias: Arc::clone(alias),
            name,
        })
    }

    fn compare(&self, op: BinaryOp, rhs: impl IntoExpr<T>) -> Predicate {
        Expr::from_node(Node::binary(op, self.node.clone(), rhs.into_expr().node))
    }

    fn derive<U>(&self, f: impl FnOnce(Node) -> Node) -> Expr<U> {
        Expr::from_node(f(self.node.clone()))
    }
}

/// Conversion into a typed expression: other expressions, literals and
/// single-column subqueries
pub trait IntoExpr<T> {
    fn into_expr(self) -> Expr<T>;
}

impl<T> IntoExpr<T> for Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self
    }
}

impl<T> IntoExpr<T> for &Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self.clone()
    }
}

macro_rules! literal {
    ($ty:ty => $target:ty) => {
        impl IntoExpr<$target> for $ty {
            fn into_expr(self) -> Expr<$target> {
                Expr::from_node(Node::Param(<$target as SqlType>::into_value(self.into())))
            }
        }
    };
}

literal!(bool => bool);
literal!(i32 => i32);
literal!(i64 => i64);
literal!(f64 => f64);
literal!(String => String);
literal!(&str => String);
literal!(&String => String);
literal!(Uuid => Uuid);

impl<T: SqlType> IntoExpr<T> for Query<Expr<T>> {
    fn into_expr(self) -> Expr<T> {
        Expr::from_node(Node::Subquery(Box::new(self.into_clauses())))
    }
}

/// A literal value bound as a parameter, e.g. a constant column in a projection
pub fn constant<T: SqlType>(value: T) -> Expr<T> {
    Expr::from_node(Node::Param(value.into_value()))
}

/// `COUNT(*)`
pub fn count_all() -> Expr<i64> {
    Expr::from_node(Node::function("COUNT", Node::Wildcard))
}

/// `EXISTS (subquery)`
pub fn exists<P>(query: Query<P>) -> Predicate {
    Expr::from_node(Node::Exists(Box::new(query.into_clauses())))
}

/// Starts a searched case expression: `CASE WHEN cond THEN ... END`
pub fn case() -> CaseBuilder {
    CaseBuilder
}

impl<T: SqlType> Expr<T> {
    pub fn eq(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(BinaryOp::Eq, rhs)
    }

    pub fn ne(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(BinaryOp::Ne, rhs)
    }

    pub fn is_null(&self) -> Predicate {
        self.derive(|node| Node::IsNull {
            expr: Box::new(node),
            negated: false,
        })
    }

    pub fn is_not_null(&self) -> Predicate {
        self.derive(|node| Node::IsNull {
            expr: Box::new(node),
            negated: true,
        })
    }

    pub fn in_<I, V>(&self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr<T>,
    {
        let items = values.into_iter().map(|v| v.into_expr().node).collect();
        self.derive(|node| Node::InList {
            expr: Box::new(node),
            items,
            negated: false,
        })
    }

    pub fn not_in<I, V>(&self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr<T>,
    {
        let items = values.into_iter().map(|v| v.into_expr().node).collect();
        self.derive(|node| Node::InList {
            expr: Box::new(node),
            items,
            negated: true,
        })
    }

    /// `expr IN (SELECT ...)`
    pub fn in_query(&self, query: Query<Expr<T>>) -> Predicate {
        let query = Box::new(query.into_clauses());
        self.derive(|node| Node::InSubquery {
            expr: Box::new(node),
            query,
            negated: false,
        })
    }

    pub fn not_in_query(&self, query: Query<Expr<T>>) -> Predicate {
        let query = Box::new(query.into_clauses());
        self.derive(|node| Node::InSubquery {
            expr: Box::new(node),
            query,
            negated: true,
        })
    }

    pub fn count(&self) -> Expr<i64> {
        self.derive(|node| Node::function("COUNT", node))
    }

    pub fn count_distinct(&self) -> Expr<i64> {
        self.derive(|node| Node::Function {
            name: "COUNT",
            distinct: true,
            args: vec![node],
        })
    }

    pub fn max(&self) -> Expr<T> {
        self.derive(|node| Node::function("MAX", node))
    }

    pub fn min(&self) -> Expr<T> {
        self.derive(|node| Node::function("MIN", node))
    }

    /// `CAST(expr AS TEXT)`
    pub fn string_value(&self) -> Expr<String> {
        self.derive(|node| Node::Cast {
            expr: Box::new(node),
            ty: "TEXT",
        })
    }

    pub fn asc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.node.clone(), Direction::Asc)
    }

    pub fn desc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.node.clone(), Direction::Desc)
    }

    /// Selects this expression under a column alias
    pub fn as_(&self, alias: impl Into<String>) -> Aliased<T> {
        Aliased::new(self.clone(), alias.into())
    }

    /// Selects this expression as `Option<T>`, for nullable columns and outer joins
    pub fn nullable(&self) -> Nullable<T> {
        Nullable::new(self.clone())
    }

    /// Starts a simple case expression: `CASE expr WHEN value THEN ... END`
    pub fn when(&self, value: impl IntoExpr<T>) -> CaseStart<T> {
        CaseStart {
            operand: Some(Box::new(self.node.clone())),
            condition: value.into_expr().node,
            _key: PhantomData,
        }
    }
}

impl<T: SqlType + PartialOrd> Expr<T> {
    pub fn lt(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(BinaryOp::Lt, rhs)
    }

    /// Less than or equal
    pub fn loe(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(BinaryOp::Le, rhs)
    }

    pub fn gt(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(BinaryOp::Gt, rhs)
    }

    /// Greater than or equal
    pub fn goe(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(BinaryOp::Ge, rhs)
    }

    /// Inclusive range, `expr BETWEEN low AND high`
    pub fn between(&self, low: impl IntoExpr<T>, high: impl IntoExpr<T>) -> Predicate {
        let low = Box::new(low.into_expr().node);
        let high = Box::new(high.into_expr().node);
        self.derive(|node| Node::Between {
            expr: Box::new(node),
            low,
            high,
        })
    }
}

impl<T: Numeric> Expr<T> {
    pub fn sum(&self) -> Expr<T::Sum> {
        self.derive(|node| Node::function("SUM", node))
    }

    pub fn avg(&self) -> Expr<f64> {
        self.derive(|node| Node::function("AVG", node))
    }

    pub fn add(&self, rhs: impl IntoExpr<T>) -> Expr<T> {
        self.derive(|node| Node::binary(BinaryOp::Add, node, rhs.into_expr().node))
    }

    pub fn subtract(&self, rhs: impl IntoExpr<T>) -> Expr<T> {
        self.derive(|node| Node::binary(BinaryOp::Subtract, node, rhs.into_expr().node))
    }

    pub fn multiply(&self, rhs: impl IntoExpr<T>) -> Expr<T> {
        self.derive(|node| Node::binary(BinaryOp::Multiply, node, rhs.into_expr().node))
    }

    /// Treats the expression as a floating point number, e.g. to compare an
    /// integer column with an `AVG` subquery. SQLite compares numerics by value
    /// so no cast is rendered.
    pub fn as_f64(&self) -> Expr<f64> {
        self.derive(|node| node)
    }
}

impl Expr<String> {
    /// `expr LIKE pattern`, the pattern is passed through unchanged
    pub fn like(&self, pattern: impl IntoExpr<String>) -> Predicate {
        self.compare(BinaryOp::Like, pattern)
    }

    pub fn contains(&self, needle: &str) -> Predicate {
        self.like(format!("%{}%", needle))
    }

    pub fn starts_with(&self, prefix: &str) -> Predicate {
        self.like(format!("{}%", prefix))
    }

    pub fn concat(&self, rhs: impl IntoExpr<String>) -> Expr<String> {
        self.derive(|node| Node::binary(BinaryOp::Concat, node, rhs.into_expr().node))
    }

    pub fn lower(&self) -> Expr<String> {
        self.derive(|node| Node::function("LOWER", node))
    }

    pub fn upper(&self) -> Expr<String> {
        self.derive(|node| Node::function("UPPER", node))
    }

    pub fn length(&self) -> Expr<i32> {
        self.derive(|node| Node::function("LENGTH", node))
    }
}

impl Predicate {
    pub fn and(self, rhs: Predicate) -> Predicate {
        Expr::from_node(Node::binary(BinaryOp::And, self.node, rhs.node))
    }

    pub fn or(self, rhs: Predicate) -> Predicate {
        Expr::from_node(Node::binary(BinaryOp::Or, self.node, rhs.node))
    }

    pub fn not(self) -> Predicate {
        Expr::from_node(Node::Not(Box::new(self.node)))
    }

    /// Conjunction of the present predicates; `None` when all are absent
    pub fn all_of<I, P>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = P>,
        P: Into<Option<Predicate>>,
    {
        predicates
            .into_iter()
            .filter_map(Into::into)
            .reduce(Predicate::and)
    }

    /// Disjunction of the present predicates; `None` when all are absent
    pub fn any_of<I, P>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = P>,
        P: Into<Option<Predicate>>,
    {
        predicates
            .into_iter()
            .filter_map(Into::into)
            .reduce(Predicate::or)
    }
}

/// Accumulates optional predicates imperatively
///
/// An empty builder yields no predicate, which a query treats as "no filter".
#[derive(Debug, Clone, Default)]
pub struct PredicateBuilder {
    predicate: Option<Predicate>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self {
        if let Some(rhs) = predicate.into() {
            self.predicate = Some(match self.predicate.take() {
                Some(lhs) => lhs.and(rhs),
                None => rhs,
            });
        }
        self
    }

    pub fn or(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self {
        if let Some(rhs) = predicate.into() {
            self.predicate = Some(match self.predicate.take() {
                Some(lhs) => lhs.or(rhs),
                None => rhs,
            });
        }
        self
    }

    pub fn has_value(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn build(self) -> Option<Predicate> {
        self.predicate
    }
}

/// Entry point of a searched case expression
#[derive(Debug, Clone, Copy)]
pub struct CaseBuilder;

impl CaseBuilder {
    pub fn when(self, condition: Predicate) -> CaseStart<bool> {
        CaseStart {
            operand: None,
            condition: condition.node,
            _key: PhantomData,
        }
    }
}

/// A case expression whose first `WHEN` has no result type yet
///
/// `K` is the type of the `WHEN` keys: `bool` for searched cases, the operand
/// type for simple cases.
pub struct CaseStart<K> {
    operand: Option<Box<Node>>,
    condition: Node,
    _key: PhantomData<fn() -> K>,
}

impl<K> CaseStart<K> {
    pub fn then<R: SqlType>(self, result: impl IntoExpr<R>) -> Case<K, R> {
        Case {
            operand: self.operand,
            branches: vec![(self.condition, result.into_expr().node)],
            _types: PhantomData,
        }
    }
}

/// A case expression with at least one branch, producing `R`
pub struct Case<K, R> {
    operand: Option<Box<Node>>,
    branches: Vec<(Node, Node)>,
    _types: PhantomData<fn() -> (K, R)>,
}

/// A pending `WHEN` of a case expression that already has a result type
pub struct CaseWhen<K, R> {
    case: Case<K, R>,
    condition: Node,
}

impl<K, R: SqlType> Case<K, R> {
    pub fn when(self, key: impl IntoExpr<K>) -> CaseWhen<K, R> {
        CaseWhen {
            case: self,
            condition: key.into_expr().node,
        }
    }

    pub fn otherwise(self, result: impl IntoExpr<R>) -> Expr<R> {
        self.finish(Some(result.into_expr().node))
    }

    /// Closes the case without `ELSE`; unmatched rows yield NULL
    pub fn end(self) -> Expr<R> {
        self.finish(None)
    }

    fn finish(self, otherwise: Option<Node>) -> Expr<R> {
        Expr::from_node(Node::Case {
            operand: self.operand,
            branches: self.branches,
            otherwise: otherwise.map(Box::new),
        })
    }
}

impl<K, R: SqlType> CaseWhen<K, R> {
    pub fn then(self, result: impl IntoExpr<R>) -> Case<K, R> {
        let mut case = self.case;
        case.branches.push((self.condition, result.into_expr().node));
        case
    }
}
