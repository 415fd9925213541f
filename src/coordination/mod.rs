//! Coordination-service boundary.
//!
//! - [`CoordinationClient`]: store and watch primitives the rest of the crate consumes
//! - [`event`]: connection-state and tree-change notifications
//! - [`InMemoryCoordinator`]: in-process implementation with session fault injection

pub mod client;
pub mod event;
pub mod memory;

pub use client::CoordinationClient;
pub use event::{ConnectionState, TreeEvent, TreeEventKind};
pub use memory::InMemoryCoordinator;
