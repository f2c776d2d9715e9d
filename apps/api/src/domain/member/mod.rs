pub mod dto;
pub mod member;
pub mod search;

pub use dto::{MemberDto, MemberTeamDto, UserDto};
pub use member::Member;
pub use search::MemberSearchCondition;
