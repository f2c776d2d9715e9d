// Domain layer module exports
// Entities, value objects and repository ports; no infrastructure here

pub mod member;
pub mod page;
pub mod repositories;
pub mod team;
