pub mod context;
pub mod dispatch;
pub mod handlers;
pub mod util;

pub use context::ToolContext;
pub use dispatch::dispatch_tool;
pub use util::extract_offers;
