//! Network primitives.
//!
//! Endpoint formatting and interface resolution for the join path.

pub mod endpoint;
pub mod interface;

pub use endpoint::Endpoint;
pub use interface::{Interface, InterfaceError};
