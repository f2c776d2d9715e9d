//! Roster API Library
//!
//! Member/team service built around a type-safe query builder: domain model,
//! the `query` DSL, SQLite repositories, and the HTTP layer.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod query;
