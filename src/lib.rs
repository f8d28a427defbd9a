//! Multicast group membership with one receive loop per joined group.
//!
//! [`join_all`] resolves a named network interface, joins every configured
//! [`Candidate`] group on it, and spawns one reader thread per successful
//! join. Received datagrams are copied out of each loop's scratch buffer
//! and handed to a caller-supplied [`DatagramHandler`], which may be
//! invoked concurrently from different loops. Join failures are isolated
//! per candidate; only interface resolution itself can fail the call.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! let candidates: [groupcast::Candidate; 2] =
//!     ["224.0.0.1:8025".parse()?, "224.0.0.2:8012".parse()?];
//!
//! let listeners = groupcast::join_all(
//!     "eth0",
//!     &candidates,
//!     Arc::new(|source: &str, len: usize, _payload: Vec<u8>| {
//!         println!("{len} bytes from {source}");
//!     }),
//! )?;
//!
//! listeners.wait();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod group;
pub mod handler;
pub mod net;
pub mod send;
pub mod trace;

pub use group::joiner::{join_all, GroupSet};
pub use group::membership::{join_group, Candidate, JoinedGroup, MembershipError};
pub use handler::DatagramHandler;
pub use net::{Endpoint, Interface, InterfaceError};
