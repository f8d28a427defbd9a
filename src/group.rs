//! Group membership and receive-loop lifecycle.
//!
//! `membership` turns one candidate into one joined socket, `receiver` owns
//! a joined socket for its lifetime, and `joiner` orchestrates the whole
//! pass over an interface and hands back the lifecycle handle.

pub mod joiner;
pub mod membership;
pub mod receiver;

pub use joiner::{join_all, GroupSet};
pub use membership::{join_group, Candidate, JoinedGroup, MembershipError};
pub use receiver::ReceiveLoop;
