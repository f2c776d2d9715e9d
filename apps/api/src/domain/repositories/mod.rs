// Repository ports (interfaces the infrastructure layer implements)

pub mod errors;
pub mod member_repository;
pub mod team_repository;

pub use errors::{RepositoryError, RepositoryResult};
pub use member_repository::MemberRepository;
pub use team_repository::TeamRepository;
