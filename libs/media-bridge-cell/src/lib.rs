pub mod bridge;
pub mod message;

pub use bridge::{InProcessMediaBridge, MediaBridge};
pub use message::{AgentEvent, Speaker, ToolResult};
