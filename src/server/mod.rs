pub mod node;
pub mod service;

pub use node::ServerNode;
pub use service::{ServerRegistry, ServerService};
