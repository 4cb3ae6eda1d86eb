pub mod opinion;
pub mod user_agent;

pub use opinion::*;
pub use user_agent::{parse_user_agent, UserAgentInfo};
