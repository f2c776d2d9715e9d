//! Projections: what a query selects and how each row is turned into Rust values.

use std::marker::PhantomData;

use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use super::expr::{Expr, Node, SqlType};
use super::path::{EntityPath, OptionalEntity, QMember, QTeam};

/// One entry of the select list
#[derive(Debug, Clone)]
pub struct SelectItem {
    pub(crate) node: Node,
    pub(crate) alias: Option<String>,
}

impl SelectItem {
    pub(crate) fn new(node: Node, alias: Option<String>) -> Self {
        Self { node, alias }
    }
}

/// Plain columns keep their column name as alias so they can feed a
/// [`Fields`] projection without an explicit `as_`.
impl<T> From<&Expr<T>> for SelectItem {
    fn from(expr: &Expr<T>) -> Self {
        let alias = expr.node.column_name().map(str::to_string);
        SelectItem::new(expr.node.clone(), alias)
    }
}

impl<T> From<Expr<T>> for SelectItem {
    fn from(expr: Expr<T>) -> Self {
        SelectItem::from(&expr)
    }
}

impl<T> From<Aliased<T>> for SelectItem {
    fn from(aliased: Aliased<T>) -> Self {
        SelectItem::new(aliased.expr.node, Some(aliased.alias))
    }
}

/// The shape of a query result
///
/// A projection contributes columns to the select list and reads them back, in
/// the same order, from each row.
pub trait Projection: Send + Sync {
    type Output: Send + Unpin;

    fn select_items(&self, items: &mut Vec<SelectItem>);

    fn decode(&self, row: &SqliteRow, index: &mut usize) -> Result<Self::Output, sqlx::Error>;

    /// Maps each decoded row through `f`, e.g. into a DTO constructor
    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> U + Send + Sync,
        U: Send + Unpin,
    {
        Map { inner: self, f }
    }
}

impl<T: SqlType> Projection for Expr<T> {
    type Output = T;

    fn select_items(&self, items: &mut Vec<SelectItem>) {
        items.push(SelectItem::new(self.node.clone(), None));
    }

    fn decode(&self, row: &SqliteRow, index: &mut usize) -> Result<T, sqlx::Error> {
        let value = T::decode(row, *index)?;
        *index += 1;
        Ok(value)
    }
}

/// An expression selected under a column alias
#[derive(Debug, Clone)]
pub struct Aliased<T> {
    expr: Expr<T>,
    alias: String,
}

impl<T> Aliased<T> {
    pub(crate) fn new(expr: Expr<T>, alias: String) -> Self {
        Self { expr, alias }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl<T: SqlType> Projection for Aliased<T> {
    type Output = T;

    fn select_items(&self, items: &mut Vec<SelectItem>) {
        items.push(SelectItem::new(self.expr.node.clone(), Some(self.alias.clone())));
    }

    fn decode(&self, row: &SqliteRow, index: &mut usize) -> Result<T, sqlx::Error> {
        self.expr.decode(row, index)
    }
}

/// An expression whose value may be NULL
#[derive(Debug, Clone)]
pub struct Nullable<T> {
    expr: Expr<T>,
}

impl<T> Nullable<T> {
    pub(crate) fn new(expr: Expr<T>) -> Self {
        Self { expr }
    }
}

impl<T: SqlType> Projection for Nullable<T> {
    type Output = Option<T>;

    fn select_items(&self, items: &mut Vec<SelectItem>) {
        self.expr.select_items(items);
    }

    fn decode(&self, row: &SqliteRow, index: &mut usize) -> Result<Option<T>, sqlx::Error> {
        let value = T::decode_nullable(row, *index)?;
        *index += 1;
        Ok(value)
    }
}

fn entity_items<E: EntityPath>(entity: &E, items: &mut Vec<SelectItem>) {
    items.extend(E::COLUMNS.iter().copied().map(|name| {
        SelectItem::new(
            Node::Column {
                alias: entity.alias().clone(),
                name,
            },
            None,
        )
    }));
}

macro_rules! entity_projection {
    ($path:ty) => {
        impl Projection for $path {
            type Output = <$path as EntityPath>::Entity;

            fn select_items(&self, items: &mut Vec<SelectItem>) {
                entity_items(self, items);
            }

            fn decode(
                &self,
                row: &SqliteRow,
                index: &mut usize,
            ) -> Result<Self::Output, sqlx::Error> {
                self.decode_entity(row, index)?.ok_or_else(|| {
                    sqlx::Error::Decode(
                        format!("{} row without identifier", <$path as EntityPath>::TABLE).into(),
                    )
                })
            }
        }
    };
}

entity_projection!(QMember);
entity_projection!(QTeam);

impl<E: EntityPath> Projection for OptionalEntity<E> {
    type Output = Option<E::Entity>;

    fn select_items(&self, items: &mut Vec<SelectItem>) {
        entity_items(&self.0, items);
    }

    fn decode(&self, row: &SqliteRow, index: &mut usize) -> Result<Self::Output, sqlx::Error> {
        self.0.decode_entity(row, index)
    }
}

macro_rules! tuple_projection {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($name: Projection),+> Projection for ($($name,)+) {
            type Output = ($($name::Output,)+);

            fn select_items(&self, items: &mut Vec<SelectItem>) {
                let ($($name,)+) = self;
                $($name.select_items(items);)+
            }

            fn decode(&self, row: &SqliteRow, index: &mut usize) -> Result<Self::Output, sqlx::Error> {
                let ($($name,)+) = self;
                Ok(($($name.decode(row, index)?,)+))
            }
        }
    };
}

tuple_projection!(A, B);
tuple_projection!(A, B, C);
tuple_projection!(A, B, C, D);
tuple_projection!(A, B, C, D, E);
tuple_projection!(A, B, C, D, E, F);

/// A projection whose rows are passed through a function
pub struct Map<P, F> {
    inner: P,
    f: F,
}

impl<P, F, U> Projection for Map<P, F>
where
    P: Projection,
    F: Fn(P::Output) -> U + Send + Sync,
    U: Send + Unpin,
{
    type Output = U;

    fn select_items(&self, items: &mut Vec<SelectItem>) {
        self.inner.select_items(items);
    }

    fn decode(&self, row: &SqliteRow, index: &mut usize) -> Result<U, sqlx::Error> {
        self.inner.decode(row, index).map(&self.f)
    }
}

/// Populates `D` by column name through its [`FromRow`] implementation
///
/// Select items must be aliased to `D`'s field names; plain columns keep their
/// own name.
pub struct Fields<D> {
    items: Vec<SelectItem>,
    _target: PhantomData<fn() -> D>,
}

/// Field-by-name projection into `D`
///
/// # Example
/// ```
/// use roster_api::domain::member::UserDto;
/// use roster_api::query::{self, QMember, SelectItem};
///
/// let m = QMember::new("m");
/// let projection = query::fields::<UserDto>([
///     SelectItem::from(m.username.as_("name")),
///     SelectItem::from(&m.age),
/// ]);
/// let sql = query::select(projection).from(&m).to_sql();
/// assert_eq!(sql, "SELECT m.username AS name, m.age AS age FROM member m");
/// ```
pub fn fields<D>(items: impl IntoIterator<Item = SelectItem>) -> Fields<D> {
    Fields {
        items: items.into_iter().collect(),
        _target: PhantomData,
    }
}

impl<D> Projection for Fields<D>
where
    D: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    type Output = D;

    fn select_items(&self, items: &mut Vec<SelectItem>) {
        items.extend(self.items.iter().cloned());
    }

    fn decode(&self, row: &SqliteRow, index: &mut usize) -> Result<D, sqlx::Error> {
        *index += self.items.len();
        D::from_row(row)
    }
}
