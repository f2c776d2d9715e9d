//! Renders select statements and expression trees into a `sqlx::QueryBuilder`.
//!
//! Every literal is bound as a parameter; only identifiers coming from entity
//! paths and aliases are written into the SQL text.

use sqlx::{QueryBuilder, Sqlite};

use super::expr::{BinaryOp, Node, Value};
use super::order::NullHandling;
use super::select::{JoinKind, SelectClauses};

pub(crate) fn push_select(builder: &mut QueryBuilder<'_, Sqlite>, select: &SelectClauses) {
    builder.push("SELECT ");
    if select.distinct {
        builder.push("DISTINCT ");
    }

    for (i, item) in select.rendered_items().iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_node(builder, &item.node);
        if let Some(alias) = &item.alias {
            builder.push(" AS ").push(alias);
        }
    }

    if !select.sources.is_empty() {
        builder.push(" FROM ");
        for (i, source) in select.sources.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(source.table).push(" ").push(&*source.alias);
        }
    }

    for join in &select.joins {
        builder.push(match join.kind {
            JoinKind::Inner => " INNER JOIN ",
            JoinKind::Left => " LEFT JOIN ",
        });
        builder
            .push(join.target.table)
            .push(" ")
            .push(&*join.target.alias);
        if join.conditions.is_empty() {
            builder.push(" ON 1 = 1");
        } else {
            builder.push(" ON ");
            push_conjunction(builder, &join.conditions);
        }
    }

    if !select.filters.is_empty() {
        builder.push(" WHERE ");
        push_conjunction(builder, &select.filters);
    }

    if !select.group_by.is_empty() {
        builder.push(" GROUP BY ");
        push_list(builder, &select.group_by);
    }

    if !select.having.is_empty() {
        builder.push(" HAVING ");
        push_conjunction(builder, &select.having);
    }

    if !select.order_by.is_empty() {
        builder.push(" ORDER BY ");
        for (i, order) in select.order_by.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_node(builder, &order.node);
            builder.push(" ").push(order.direction.as_sql());
            match order.nulls {
                Some(NullHandling::NullsFirst) => {
                    builder.push(" NULLS FIRST");
                }
                Some(NullHandling::NullsLast) => {
                    builder.push(" NULLS LAST");
                }
                None => {}
            }
        }
    }

    match (select.limit, select.offset) {
        (Some(limit), offset) => {
            builder.push(" LIMIT ").push_bind(to_i64(limit));
            if let Some(offset) = offset {
                builder.push(" OFFSET ").push_bind(to_i64(offset));
            }
        }
        (None, Some(offset)) => {
            builder.push(" LIMIT -1 OFFSET ").push_bind(to_i64(offset));
        }
        (None, None) => {}
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn push_list(builder: &mut QueryBuilder<'_, Sqlite>, nodes: &[Node]) {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_node(builder, node);
    }
}

fn push_conjunction(builder: &mut QueryBuilder<'_, Sqlite>, nodes: &[Node]) {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        push_node(builder, node);
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => {
            builder.push("NULL");
        }
        Value::Bool(v) => {
            builder.push_bind(*v);
        }
        Value::Int(v) => {
            builder.push_bind(*v);
        }
        Value::Real(v) => {
            builder.push_bind(*v);
        }
        Value::Text(v) => {
            builder.push_bind(v.clone());
        }
        Value::Uuid(v) => {
            builder.push_bind(*v);
        }
    }
}

fn push_subquery(builder: &mut QueryBuilder<'_, Sqlite>, select: &SelectClauses) {
    builder.push("(");
    push_select(builder, select);
    builder.push(")");
}

fn push_node(builder: &mut QueryBuilder<'_, Sqlite>, node: &Node) {
    match node {
        Node::Column { alias, name } => {
            builder.push(&**alias).push(".").push(name);
        }
        Node::Param(value) => push_value(builder, value),
        Node::Wildcard => {
            builder.push("*");
        }
        Node::Binary { op, lhs, rhs } => {
            let grouped = matches!(
                op,
                BinaryOp::And
                    | BinaryOp::Or
                    | BinaryOp::Concat
                    | BinaryOp::Add
                    | BinaryOp::Subtract
                    | BinaryOp::Multiply
            );
            if grouped {
                builder.push("(");
            }
            push_node(builder, lhs);
            builder.push(op.as_sql());
            push_node(builder, rhs);
            if grouped {
                builder.push(")");
            }
        }
        Node::Not(inner) => {
            builder.push("NOT (");
            push_node(builder, inner);
            builder.push(")");
        }
        Node::IsNull { expr, negated } => {
            push_node(builder, expr);
            builder.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        Node::Between { expr, low, high } => {
            push_node(builder, expr);
            builder.push(" BETWEEN ");
            push_node(builder, low);
            builder.push(" AND ");
            push_node(builder, high);
        }
        Node::InList {
            expr,
            items,
            negated,
        } => {
            if items.is_empty() {
                builder.push(if *negated { "1 = 1" } else { "1 = 0" });
                return;
            }
            push_node(builder, expr);
            builder.push(if *negated { " NOT IN (" } else { " IN (" });
            push_list(builder, items);
            builder.push(")");
        }
        Node::InSubquery {
            expr,
            query,
            negated,
        } => {
            push_node(builder, expr);
            builder.push(if *negated { " NOT IN " } else { " IN " });
            push_subquery(builder, query);
        }
        Node::Exists(query) => {
            builder.push("EXISTS ");
            push_subquery(builder, query);
        }
        Node::Subquery(query) => push_subquery(builder, query),
        Node::Function {
            name,
            distinct,
            args,
        } => {
            builder.push(name).push("(");
            if *distinct {
                builder.push("DISTINCT ");
            }
            push_list(builder, args);
            builder.push(")");
        }
        Node::Cast { expr, ty } => {
            builder.push("CAST(");
            push_node(builder, expr);
            builder.push(" AS ").push(ty).push(")");
        }
        Node::Case {
            operand,
            branches,
            otherwise,
        } => {
            builder.push("CASE");
            if let Some(operand) = operand {
                builder.push(" ");
                push_node(builder, operand);
            }
            for (condition, result) in branches {
                builder.push(" WHEN ");
                push_node(builder, condition);
                builder.push(" THEN ");
                push_node(builder, result);
            }
            if let Some(otherwise) = otherwise {
                builder.push(" ELSE ");
                push_node(builder, otherwise);
            }
            builder.push(" END");
        }
    }
}
