// Team domain module
// Contains the team entity and its value objects

#![allow(clippy::module_inception)]

pub mod team;
pub mod value_objects;

pub use team::Team;
pub use value_objects::TeamName;
