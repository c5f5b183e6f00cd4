pub mod dispatcher;
pub mod types;

// Re-export key types for convenience
pub use dispatcher::{DispatchError, EventDispatcher};
pub use types::EntityEvent;
